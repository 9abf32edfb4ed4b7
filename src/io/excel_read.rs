use std::collections::HashMap;
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate, Timelike};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::Table;

/// What to do with data rows whose cells are all blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankRows {
    /// Keep them as rows of empty strings, so a rewrite preserves the layout.
    #[default]
    Keep,
    /// Drop them, e.g. for customer workbooks padded with spacer rows.
    Skip,
}

/// Reads `sheet` from the workbook at `path` into a [`Table`].
///
/// `header_row` is the zero-based sheet row holding the column names; rows
/// above it are ignored.
pub fn read_table(
    path: &Path,
    sheet: &str,
    header_row: usize,
    blank_rows: BlankRows,
) -> Result<Table> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = read_required_sheet(&mut workbook, sheet)?;
    let table = range_to_table(&range, header_row, sheet, blank_rows)?;
    debug!(
        sheet,
        rows = table.len(),
        columns = table.columns().len(),
        "read worksheet"
    );
    Ok(table)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn range_to_table(
    range: &Range<DataType>,
    header_row: usize,
    sheet: &str,
    blank_rows: BlankRows,
) -> Result<Table> {
    // Ranges start at the first used cell, not at A1.
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let missing_header = || {
        ToolError::InvalidWorkbook(format!(
            "sheet '{sheet}' has no header on row {}",
            header_row + 1
        ))
    };
    let skip = header_row.checked_sub(first_row).ok_or_else(missing_header)?;

    let mut rows = range.rows().skip(skip);
    let header = rows.next().ok_or_else(missing_header)?;
    let columns = header_names(header);
    if columns.iter().all(|name| name.starts_with(BLANK_HEADER_PREFIX)) {
        return Err(missing_header());
    }

    let body = rows
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|cells| {
            blank_rows == BlankRows::Keep || cells.iter().any(|cell| !cell.trim().is_empty())
        })
        .collect();

    Table::new(columns, body)
}

const BLANK_HEADER_PREFIX: &str = "column_";

/// Turns header cells into unique column names. Blank cells become
/// `column_<n>` and repeated names get a `.1`, `.2`, … suffix.
fn header_names(cells: &[DataType]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let mut name = cell_to_string(cell);
            if name.trim().is_empty() {
                name = format!("{BLANK_HEADER_PREFIX}{}", idx + 1);
            }
            let count = seen.entry(name.clone()).or_insert(0);
            let unique = if *count == 0 {
                name.clone()
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            unique
        })
        .collect()
}

pub(crate) fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => value.to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Bool(value) => value.to_string(),
        DataType::DateTime(serial) => {
            excel_serial_to_string(*serial).unwrap_or_else(|| serial.to_string())
        }
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Renders an Excel date serial (1900 date system) as an ISO date, adding the
/// time of day only when it is not midnight.
fn excel_serial_to_string(serial: f64) -> Option<String> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let stamp = epoch.checked_add_signed(Duration::milliseconds(millis))?;
    if stamp.num_seconds_from_midnight() == 0 {
        Some(stamp.format("%Y-%m-%d").to_string())
    } else {
        Some(stamp.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
