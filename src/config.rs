use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolError};
use crate::model::Table;

/// Warning written into rows that are protected but missing from the customer tracker.
pub const NOT_REGISTERED_WARNING: &str = "⚠ Not Registered";

/// How a mapped column is reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Replace the target value whenever it differs from the source value.
    Overwrite,
    /// Fill the target value only when it is blank.
    CopyIfBlank,
    /// Part of the composite natural key; never copied.
    Key,
}

/// Maps one target column onto its customer counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub target: String,
    pub source: String,
    pub mode: UpdateMode,
}

impl FieldRule {
    pub fn new(target: impl Into<String>, source: impl Into<String>, mode: UpdateMode) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
            mode,
        }
    }
}

/// Ordered list of field rules. Order is significant: `key` rules define the
/// composite key in the order they appear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    rules: Vec<FieldRule>,
}

impl FieldMapping {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rules that copy data, i.e. everything except `key` rules.
    pub fn data_rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().filter(|rule| rule.mode != UpdateMode::Key)
    }

    /// Target-side composite key columns.
    pub fn target_key_columns(&self) -> Vec<&str> {
        self.key_rules().map(|rule| rule.target.as_str()).collect()
    }

    /// Source-side composite key columns, aligned with [`Self::target_key_columns`].
    pub fn source_key_columns(&self) -> Vec<&str> {
        self.key_rules().map(|rule| rule.source.as_str()).collect()
    }

    fn key_rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().filter(|rule| rule.mode == UpdateMode::Key)
    }
}

/// Names of the identifier and helper columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub target_uid: String,
    pub source_uid: String,
    /// Secondary identifier, present under the same name in both tables.
    pub secondary_id: String,
    pub warning: String,
    pub updated_date: String,
    pub do_not_update: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            target_uid: "Duplicate in HW DB".to_string(),
            source_uid: "Unique ID".to_string(),
            secondary_id: "DU ID".to_string(),
            warning: "Warning".to_string(),
            updated_date: "Updated Date".to_string(),
            do_not_update: "DO NOT UPDATE".to_string(),
        }
    }
}

/// Everything the reconciler needs besides the two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub fields: FieldMapping,
    #[serde(default)]
    pub columns: ColumnNames,
    #[serde(default = "default_warning")]
    pub warning_text: String,
}

fn default_warning() -> String {
    NOT_REGISTERED_WARNING.to_string()
}

impl ReconcileConfig {
    pub fn new(fields: FieldMapping) -> Self {
        Self {
            fields,
            columns: ColumnNames::default(),
            warning_text: default_warning(),
        }
    }

    /// Loads a configuration document such as:
    ///
    /// ```json
    /// { "fields": [ { "target": "Site ID", "source": "Site Code", "mode": "key" } ] }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ToolError::MissingInput(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Checks the configuration against the actual tables before any row is
    /// touched.
    pub fn validate_against(&self, source: &Table, target: &Table) -> Result<()> {
        if self.fields.target_key_columns().is_empty() {
            return Err(ToolError::Configuration(
                "field mapping declares no `key` columns for the composite key".into(),
            ));
        }

        let mut seen = HashSet::new();
        for rule in self.fields.rules() {
            if !seen.insert(rule.target.as_str()) {
                return Err(ToolError::Configuration(format!(
                    "target column '{}' is mapped more than once",
                    rule.target
                )));
            }
            require(source, "source", &rule.source)?;
            require(target, "target", &rule.target)?;
        }

        let columns = &self.columns;
        require(source, "source", &columns.source_uid)?;
        require(source, "source", &columns.secondary_id)?;
        require(target, "target", &columns.target_uid)?;
        require(target, "target", &columns.secondary_id)?;

        Ok(())
    }
}

fn require(table: &Table, side: &str, column: &str) -> Result<()> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(ToolError::missing_column(side, column))
    }
}

/// Where the scheduled sync finds its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Substring the attachment file name must contain.
    pub query: String,
    /// Sheet of the customer attachment holding the tracker.
    pub source_sheet: String,
    /// 1-based row number of the customer header.
    pub source_header_row: usize,
    pub target_sheet: String,
    /// Scratch directory the attachment is copied into.
    pub work_dir: PathBuf,
}

impl SyncSettings {
    /// Converts the 1-based header row into a zero-based offset.
    pub fn header_offset(&self) -> Result<usize> {
        header_offset(self.source_header_row)
    }
}

/// Converts a 1-based header row number into a zero-based offset.
pub fn header_offset(row: usize) -> Result<usize> {
    row.checked_sub(1).ok_or_else(|| {
        ToolError::Configuration("header row is 1-based and must be at least 1".into())
    })
}
