//! Reconciliation of the internal tracker against the customer tracker.
//!
//! The pass is a pure in-memory transformation: the customer rows are
//! normalised and deduplicated, indexed by UID and composite key, and every
//! internal row is matched and updated according to the field mapping.

pub mod apply;
pub mod dedup;
pub mod index;
pub mod normalize;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument};

use crate::config::ReconcileConfig;
use crate::error::{Result, ToolError};
use crate::model::Table;

use self::apply::{HelperColumns, ResolvedRule, apply_updates, flag_unmatched};
use self::dedup::{DedupReport, deduplicate};
use self::index::{LookupColumns, MatchTier, SourceIndex};

/// Result of a reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    /// Internal tracker with mapped values applied and helper columns present.
    pub table: Table,
    pub rows_updated: usize,
    pub warnings_added: usize,
    pub dedup: DedupReport,
}

impl ReconcileOutcome {
    /// Whether the result differs from the input and is worth persisting.
    pub fn has_changes(&self) -> bool {
        self.rows_updated > 0 || self.warnings_added > 0
    }
}

/// Applies a [`ReconcileConfig`] to pairs of tables.
#[derive(Debug, Clone)]
pub struct Reconciler {
    config: ReconcileConfig,
    today: Option<NaiveDate>,
}

impl Reconciler {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            today: None,
        }
    }

    /// Pins the date stamped into updated rows instead of the local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Synchronises `target` with `source`.
    ///
    /// Configuration problems are reported before any row is touched; on error
    /// no table is returned.
    #[instrument(
        level = "info",
        skip_all,
        fields(source_rows = source.len(), target_rows = target.len())
    )]
    pub fn reconcile(&self, source: &Table, target: Table) -> Result<ReconcileOutcome> {
        self.config.validate_against(source, &target)?;

        let fields = &self.config.fields;
        let names = &self.config.columns;

        let source_cols = LookupColumns {
            uid: position(source, "source", &names.source_uid)?,
            secondary: position(source, "source", &names.secondary_id)?,
            key: positions(source, "source", &fields.source_key_columns())?,
        };
        let target_cols = LookupColumns {
            uid: position(&target, "target", &names.target_uid)?,
            secondary: position(&target, "target", &names.secondary_id)?,
            key: positions(&target, "target", &fields.target_key_columns())?,
        };

        let mut source = source.clone();
        let dedup = deduplicate(&mut source, source_cols.uid, &source_cols.key);
        let index = SourceIndex::build(&source, &source_cols);
        debug!(
            uids = index.uid_count(),
            keys = index.key_count(),
            "indexed customer rows"
        );

        let rules = fields
            .data_rules()
            .map(|rule| {
                Ok(ResolvedRule {
                    target: position(&target, "target", &rule.target)?,
                    source: position(&source, "source", &rule.source)?,
                    mode: rule.mode,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut target = target;
        let helpers = HelperColumns {
            warning: target.ensure_column(&names.warning),
            updated_date: target.ensure_column(&names.updated_date),
            do_not_update: target.column_index(&names.do_not_update),
        };

        let today = self
            .today
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string();

        let mut rows_updated = 0;
        let mut warnings_added = 0;
        let mut by_tier = [0usize; 3];

        for row in 0..target.len() {
            match index.find(&target, row, &target_cols) {
                Some(found) => {
                    by_tier[tier_slot(found.tier)] += 1;
                    if apply_updates(&mut target, row, &source, found.row, &rules, helpers, &today)
                    {
                        rows_updated += 1;
                    }
                }
                None => {
                    if flag_unmatched(&mut target, row, helpers, &self.config.warning_text) {
                        warnings_added += 1;
                    }
                }
            }
        }

        debug!(
            by_identifier = by_tier[0],
            by_identifier_fallback = by_tier[1],
            by_composite_key = by_tier[2],
            "matched internal rows"
        );
        info!(rows_updated, warnings_added, "reconciliation finished");

        Ok(ReconcileOutcome {
            table: target,
            rows_updated,
            warnings_added,
            dedup,
        })
    }
}

/// Reconciles `target` against `source` with the given configuration.
pub fn reconcile(source: &Table, target: Table, config: &ReconcileConfig) -> Result<ReconcileOutcome> {
    Reconciler::new(config.clone()).reconcile(source, target)
}

fn tier_slot(tier: MatchTier) -> usize {
    match tier {
        MatchTier::Identifier => 0,
        MatchTier::IdentifierFallback => 1,
        MatchTier::CompositeKey => 2,
    }
}

fn position(table: &Table, side: &str, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| ToolError::missing_column(side, column))
}

fn positions(table: &Table, side: &str, columns: &[&str]) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|column| position(table, side, column))
        .collect()
}
