use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::config::SyncSettings;
use crate::error::{Result, ToolError};
use crate::io::excel_read::{self, BlankRows};
use crate::io::excel_write;
use crate::model::Table;
use crate::reconcile::{ReconcileOutcome, Reconciler};

/// Sheet of the internal tracker export.
pub const TARGET_SHEET: &str = "Site Problem";
/// Sheet of the customer tracker.
pub const SOURCE_SHEET: &str = "Site Problem (BMA)";
/// Zero-based header row of the customer tracker.
pub const SOURCE_HEADER_OFFSET: usize = 2;

/// Finds the newest customer attachment and makes it available locally.
pub trait AttachmentFetcher {
    /// Returns the local path of the newest attachment matching `query`, or
    /// `None` when there is nothing new. A fetched attachment is marked as
    /// processed so it is not returned again.
    fn fetch_latest(&mut self, query: &str, work_dir: &Path) -> Result<Option<PathBuf>>;
}

pub trait TableReader {
    fn read_table(&self) -> Result<Table>;
}

/// Persists a table, fully replacing the previous contents.
pub trait TableWriter {
    fn write_table(&self, table: &Table) -> Result<()>;
}

/// A single sheet of a local workbook used as a readable/writable table.
#[derive(Debug, Clone)]
pub struct WorkbookTable {
    pub path: PathBuf,
    pub sheet: String,
    /// Zero-based header row.
    pub header_row: usize,
    pub blank_rows: BlankRows,
}

impl WorkbookTable {
    pub fn new(path: impl Into<PathBuf>, sheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet: sheet.into(),
            header_row: 0,
            blank_rows: BlankRows::Keep,
        }
    }

    pub fn with_header_row(mut self, header_row: usize) -> Self {
        self.header_row = header_row;
        self
    }

    /// Drops fully blank data rows on read. Only for sheets that are never
    /// written back.
    pub fn skipping_blank_rows(mut self) -> Self {
        self.blank_rows = BlankRows::Skip;
        self
    }
}

impl TableReader for WorkbookTable {
    fn read_table(&self) -> Result<Table> {
        excel_read::read_table(&self.path, &self.sheet, self.header_row, self.blank_rows)
    }
}

impl TableWriter for WorkbookTable {
    fn write_table(&self, table: &Table) -> Result<()> {
        excel_write::write_table(&self.path, &self.sheet, table)
    }
}

/// Counters reported after a local comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareSummary {
    pub rows_updated: usize,
    pub warnings_added: usize,
    pub output: PathBuf,
}

/// Default output path: `<stem>_updated.xlsx` next to the target export.
pub fn updated_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "target".to_string());
    target.with_file_name(format!("{stem}_updated.xlsx"))
}

/// Reconciles a local export of the internal tracker with a customer
/// workbook and writes the updated tracker to `output`.
#[instrument(
    level = "info",
    skip_all,
    fields(target = %target.path.display(), source = %source.path.display())
)]
pub fn compare_workbooks(
    target: &WorkbookTable,
    source: &WorkbookTable,
    output: &Path,
    reconciler: &Reconciler,
) -> Result<CompareSummary> {
    let source_table = source.read_table()?;
    let target_table = target.read_table()?;
    info!(
        source_rows = source_table.len(),
        target_rows = target_table.len(),
        "loaded workbooks"
    );

    let outcome = reconciler.reconcile(&source_table, target_table)?;
    excel_write::write_table(output, &target.sheet, &outcome.table)?;

    Ok(CompareSummary {
        rows_updated: outcome.rows_updated,
        warnings_added: outcome.warnings_added,
        output: output.to_path_buf(),
    })
}

/// What a scheduled sync run did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReport {
    /// No new customer attachment was available.
    NoAttachment,
    /// The reconciliation produced no changes; nothing was written.
    Unchanged,
    /// The target was rewritten.
    Written {
        rows_updated: usize,
        warnings_added: usize,
    },
}

/// Runs one sync: fetch the newest customer attachment, reconcile the target
/// with it and write the target back when anything changed.
///
/// The fetched attachment is removed afterwards whether or not the run
/// succeeded.
#[instrument(level = "info", skip_all, fields(query = %settings.query))]
pub fn run_sync<F, T>(
    fetcher: &mut F,
    target: &T,
    settings: &SyncSettings,
    reconciler: &Reconciler,
) -> Result<SyncReport>
where
    F: AttachmentFetcher,
    T: TableReader + TableWriter,
{
    let header_row = settings.header_offset()?;
    let Some(attachment) = fetcher.fetch_latest(&settings.query, &settings.work_dir)? else {
        info!("no new attachments");
        return Ok(SyncReport::NoAttachment);
    };

    let result = sync_attachment(&attachment, header_row, target, settings, reconciler);

    if let Err(error) = fs::remove_file(&attachment) {
        warn!(attachment = %attachment.display(), %error, "could not remove attachment");
    }
    result
}

fn sync_attachment<T>(
    attachment: &Path,
    header_row: usize,
    target: &T,
    settings: &SyncSettings,
    reconciler: &Reconciler,
) -> Result<SyncReport>
where
    T: TableReader + TableWriter,
{
    let source = excel_read::read_table(
        attachment,
        &settings.source_sheet,
        header_row,
        BlankRows::Skip,
    )?;
    let current = target.read_table()?;
    let outcome: ReconcileOutcome = reconciler.reconcile(&source, current)?;

    if !outcome.has_changes() {
        info!("no changes needed");
        return Ok(SyncReport::Unchanged);
    }

    target.write_table(&outcome.table)?;
    info!(
        rows_updated = outcome.rows_updated,
        warnings_added = outcome.warnings_added,
        "wrote target sheet"
    );
    Ok(SyncReport::Written {
        rows_updated: outcome.rows_updated,
        warnings_added: outcome.warnings_added,
    })
}

/// Fails early with a readable error when an input file is missing.
pub fn require_file(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ToolError::MissingInput(path.to_path_buf()))
    }
}
