use crate::config::UpdateMode;
use crate::model::Table;

/// A data-copying rule resolved to column positions.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedRule {
    pub target: usize,
    pub source: usize,
    pub mode: UpdateMode,
}

/// Positions of the bookkeeping columns on the target table.
#[derive(Debug, Clone, Copy)]
pub struct HelperColumns {
    pub warning: usize,
    pub updated_date: usize,
    pub do_not_update: Option<usize>,
}

/// Copies mapped values from `source_row` into target `row`.
///
/// Returns `true` when at least one cell changed, in which case the row is
/// stamped with `today` and its warning cleared.
pub fn apply_updates(
    target: &mut Table,
    row: usize,
    source: &Table,
    source_row: usize,
    rules: &[ResolvedRule],
    helpers: HelperColumns,
    today: &str,
) -> bool {
    let mut changed = false;

    for rule in rules {
        let incoming = source.cell(source_row, rule.source);
        let current = target.cell(row, rule.target);
        let replace = match rule.mode {
            UpdateMode::Overwrite => current != incoming,
            UpdateMode::CopyIfBlank => current.is_empty() && !incoming.is_empty(),
            UpdateMode::Key => false,
        };
        if replace {
            target.set_cell(row, rule.target, incoming);
            changed = true;
        }
    }

    if changed {
        target.set_cell(row, helpers.updated_date, today);
        target.set_cell(row, helpers.warning, "");
    }
    changed
}

/// Flags an unmatched row when its protection column is set.
///
/// Returns `true` only when the warning was newly written; a row that already
/// carries the same warning is left as is.
pub fn flag_unmatched(target: &mut Table, row: usize, helpers: HelperColumns, warning: &str) -> bool {
    let Some(protect) = helpers.do_not_update else {
        return false;
    };
    if target.cell(row, protect).trim().is_empty() {
        return false;
    }
    if target.cell(row, helpers.warning) == warning {
        return false;
    }
    target.set_cell(row, helpers.warning, warning);
    true
}
