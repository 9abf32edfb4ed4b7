use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};

use crate::error::{Result, ToolError};
use crate::sync::AttachmentFetcher;

/// Name of the sub-directory fetched attachments are moved into.
pub const PROCESSED_DIR: &str = "processed";

/// Attachment fetcher backed by a drop directory.
///
/// The newest `.xlsx` or `.xlsm` workbook whose name contains the query
/// (case-insensitively) is copied into the work directory under a sanitized
/// name and the original moved to `processed/`, so a second fetch does not see
/// it again. A blank query is a configuration error.
#[derive(Debug, Clone)]
pub struct InboxFetcher {
    dir: PathBuf,
}

impl InboxFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn newest_match(&self, query: &str) -> Result<Option<PathBuf>> {
        let needle = query.to_lowercase();
        let mut newest: Option<(SystemTime, PathBuf)> = None;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() || !is_workbook(&path) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if !name.contains(&needle) {
                continue;
            }
            let modified = entry.metadata()?.modified()?;
            let is_newer = newest
                .as_ref()
                .is_none_or(|(current, current_path)| (modified, &path) > (*current, current_path));
            if is_newer {
                newest = Some((modified, path));
            }
        }

        Ok(newest.map(|(_, path)| path))
    }
}

impl AttachmentFetcher for InboxFetcher {
    fn fetch_latest(&mut self, query: &str, work_dir: &Path) -> Result<Option<PathBuf>> {
        if query.trim().is_empty() {
            return Err(ToolError::Configuration(
                "attachment query must not be empty".into(),
            ));
        }
        let Some(original) = self.newest_match(query)? else {
            debug!(dir = %self.dir.display(), query, "no matching attachment");
            return Ok(None);
        };
        let Some(file_name) = original.file_name() else {
            return Ok(None);
        };

        fs::create_dir_all(work_dir)?;
        let local = work_dir.join(sanitize_file_name(&file_name.to_string_lossy()));
        fs::copy(&original, &local)?;

        let processed = self.dir.join(PROCESSED_DIR);
        fs::create_dir_all(&processed)?;
        fs::rename(&original, processed.join(file_name))?;

        info!(attachment = %original.display(), "fetched attachment");
        Ok(Some(local))
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

const WORKBOOK_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// Replaces every character other than letters, digits, `_`, `.` and `-`
/// with `_`.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_alphanumeric() || matches!(ch, '_' | '.' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
