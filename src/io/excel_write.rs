use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::error::Result;
use crate::model::Table;

/// Writes `table` as the only worksheet of a new workbook at `path`,
/// replacing whatever was there.
pub fn write_table(path: &Path, sheet: &str, table: &Table) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (col_idx, header) in table.columns().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    // Plain autofilter over the header and data rows.
    if !table.columns().is_empty() {
        let col_end = (table.columns().len() as u16).saturating_sub(1);
        worksheet.autofilter(0, 0, table.len() as u32, col_end)?;
    }

    workbook.save(path)?;
    debug!(sheet, rows = table.len(), path = %path.display(), "wrote worksheet");
    Ok(())
}
