use std::path::Path;

use serde::{Deserialize, Serialize};

use schemasift_core::ReductionConfig;

use crate::CliError;

pub const DEFAULT_COMMAND: &str = "schema";

/// Settings file layout:
///
/// ```toml
/// command = "details"
///
/// [reduction]
/// table-inclusion = "sales\\..*"
/// child-table-filter-depth = 1
/// grep-only-matching = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiftSettings {
    pub command: Option<String>,
    pub reduction: ReductionConfig,
}

impl SiftSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or(DEFAULT_COMMAND)
    }
}

/// Values given on the command line; each one set overrides the settings file.
#[derive(Debug, Clone, Default)]
pub struct ReductionOverrides {
    pub command: Option<String>,
    pub table_inclusion: Option<String>,
    pub table_exclusion: Option<String>,
    pub grep_tables: Option<String>,
    pub grep_columns: Option<String>,
    pub grep_definitions: Option<String>,
    pub grep_invert_match: Option<bool>,
    pub grep_only_matching: Option<bool>,
    pub child_table_filter_depth: Option<i64>,
    pub parent_table_filter_depth: Option<i64>,
}

impl ReductionOverrides {
    pub fn apply(self, mut settings: SiftSettings) -> SiftSettings {
        let reduction = &mut settings.reduction;
        if self.table_inclusion.is_some() {
            reduction.table_inclusion = self.table_inclusion;
        }
        if self.table_exclusion.is_some() {
            reduction.table_exclusion = self.table_exclusion;
        }
        if self.grep_tables.is_some() {
            reduction.grep_tables = self.grep_tables;
        }
        if self.grep_columns.is_some() {
            reduction.grep_columns = self.grep_columns;
        }
        if self.grep_definitions.is_some() {
            reduction.grep_definitions = self.grep_definitions;
        }
        if let Some(invert) = self.grep_invert_match {
            reduction.grep_invert_match = invert;
        }
        if let Some(only_matching) = self.grep_only_matching {
            reduction.grep_only_matching = only_matching;
        }
        if let Some(depth) = self.child_table_filter_depth {
            reduction.child_table_filter_depth = depth;
        }
        if let Some(depth) = self.parent_table_filter_depth {
            reduction.parent_table_filter_depth = depth;
        }
        if self.command.is_some() {
            settings.command = self.command;
        }
        settings
    }
}
