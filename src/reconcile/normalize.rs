use crate::model::Table;

/// Separator between the parts of a composite key.
///
/// Values are not escaped, so two rows whose key parts contain `|` can collide
/// (`"A|B" + "C"` and `"A" + "B|C"`). Historical keys were built this way and
/// matching has to stay compatible with them.
pub const KEY_DELIMITER: &str = "|";

/// Comparison form of a cell: trimmed and upper-cased.
///
/// Only used for matching; the original value is what gets written back.
pub fn normalize(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Joins the normalized values of `columns` (given as positions) for `row`.
pub fn build_key(table: &Table, row: usize, columns: &[usize]) -> String {
    columns
        .iter()
        .map(|&col| normalize(table.cell(row, col)))
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}
