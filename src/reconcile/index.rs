use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::model::Table;
use crate::reconcile::normalize::{build_key, normalize};

/// How a target row found its customer row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Same UID and same secondary identifier.
    Identifier,
    /// Same UID, secondary identifier unknown; first row for that UID used.
    IdentifierFallback,
    /// No usable UID; matched on the composite key.
    CompositeKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMatch {
    /// Row position in the deduplicated source table.
    pub row: usize,
    pub tier: MatchTier,
}

/// Column positions needed to look up a row of one table.
#[derive(Debug, Clone)]
pub struct LookupColumns {
    pub uid: usize,
    pub secondary: usize,
    pub key: Vec<usize>,
}

/// Lookup structures over the deduplicated customer rows.
#[derive(Debug, Default)]
pub struct SourceIndex {
    /// UID → secondary id → row, in first-insertion order.
    by_uid: HashMap<String, Vec<(String, usize)>>,
    by_key: HashMap<String, usize>,
}

impl SourceIndex {
    pub fn build(source: &Table, columns: &LookupColumns) -> Self {
        let mut index = SourceIndex::default();

        for row in 0..source.len() {
            let uid = normalize(source.cell(row, columns.uid));
            let secondary = normalize(source.cell(row, columns.secondary));
            let entries = index.by_uid.entry(uid).or_default();
            if !entries.iter().any(|(existing, _)| *existing == secondary) {
                entries.push((secondary, row));
            }

            if let Entry::Vacant(slot) = index.by_key.entry(build_key(source, row, &columns.key)) {
                slot.insert(row);
            }
        }

        index
    }

    pub fn uid_count(&self) -> usize {
        self.by_uid.len()
    }

    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }

    /// Resolves the customer row for target `row`.
    ///
    /// A non-blank UID known to the index always wins over the composite key,
    /// even when the key would point at a different row.
    pub fn find(&self, target: &Table, row: usize, columns: &LookupColumns) -> Option<SourceMatch> {
        let uid = normalize(target.cell(row, columns.uid));
        if !uid.is_empty() {
            if let Some(entries) = self.by_uid.get(&uid) {
                let secondary = normalize(target.cell(row, columns.secondary));
                let exact = entries
                    .iter()
                    .find(|(candidate, _)| *candidate == secondary)
                    .map(|&(_, source_row)| (source_row, MatchTier::Identifier));
                let fallback = entries
                    .first()
                    .map(|&(_, source_row)| (source_row, MatchTier::IdentifierFallback));
                if let Some((source_row, tier)) = exact.or(fallback) {
                    return Some(SourceMatch {
                        row: source_row,
                        tier,
                    });
                }
            }
        }

        self.by_key
            .get(&build_key(target, row, &columns.key))
            .map(|&source_row| SourceMatch {
                row: source_row,
                tier: MatchTier::CompositeKey,
            })
    }
}
