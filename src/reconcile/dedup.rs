use std::collections::HashSet;

use tracing::warn;

use crate::model::Table;
use crate::reconcile::normalize::{build_key, normalize};

/// Rows dropped by each deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub duplicate_uids: usize,
    pub duplicate_keys: usize,
}

/// Drops repeated customer rows, keeping the first occurrence.
///
/// The identifier pass runs first; composite keys are only computed for the
/// rows that survive it. A blank identifier is a value like any other, so only
/// the first row without an identifier survives the first pass.
pub fn deduplicate(source: &mut Table, uid_col: usize, key_cols: &[usize]) -> DedupReport {
    let mut seen = HashSet::new();
    let keep: Vec<bool> = (0..source.len())
        .map(|row| seen.insert(normalize(source.cell(row, uid_col))))
        .collect();
    let duplicate_uids = drop_flagged(source, &keep);
    if duplicate_uids > 0 {
        warn!(removed = duplicate_uids, "skipped duplicate UID rows");
    }

    let mut seen = HashSet::new();
    let keep: Vec<bool> = (0..source.len())
        .map(|row| seen.insert(build_key(source, row, key_cols)))
        .collect();
    let duplicate_keys = drop_flagged(source, &keep);
    if duplicate_keys > 0 {
        warn!(removed = duplicate_keys, "skipped duplicate composite-key rows");
    }

    DedupReport {
        duplicate_uids,
        duplicate_keys,
    }
}

fn drop_flagged(table: &mut Table, keep: &[bool]) -> usize {
    let removed = keep.iter().filter(|kept| !**kept).count();
    if removed > 0 {
        table.retain_rows(keep);
    }
    removed
}
