use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::{ChainedTableFilter, InclusionRule, TableGrepFilter, TableNameFilter};

/// Raw reduction settings as read from configuration files or flags.
///
/// Call [`ReductionConfig::validate`] to obtain [`ReductionOptions`]; a config
/// that fails validation never reaches the reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReductionConfig {
    /// Pattern a table full name must match.
    pub table_inclusion: Option<String>,
    /// Pattern that removes otherwise included tables.
    pub table_exclusion: Option<String>,
    pub grep_tables: Option<String>,
    pub grep_columns: Option<String>,
    /// Pattern matched against table and column remarks.
    pub grep_definitions: Option<String>,
    pub grep_invert_match: bool,
    /// Drop dangling foreign keys instead of keeping placeholder endpoints.
    pub grep_only_matching: bool,
    pub child_table_filter_depth: i64,
    pub parent_table_filter_depth: i64,
}

impl ReductionConfig {
    /// Check depths and compile every pattern.
    pub fn validate(&self) -> Result<ReductionOptions> {
        let child_table_filter_depth =
            checked_depth("child-table-filter-depth", self.child_table_filter_depth)?;
        let parent_table_filter_depth =
            checked_depth("parent-table-filter-depth", self.parent_table_filter_depth)?;

        let table_inclusion = InclusionRule::new(
            self.table_inclusion.as_deref(),
            self.table_exclusion.as_deref(),
        )?;

        let grep = TableGrepFilter {
            tables: optional_rule(self.grep_tables.as_deref(), InclusionRule::new)?,
            columns: optional_rule(self.grep_columns.as_deref(), InclusionRule::new)?,
            definitions: optional_rule(self.grep_definitions.as_deref(), InclusionRule::multiline)?,
            invert_match: self.grep_invert_match,
        };

        Ok(ReductionOptions {
            table_inclusion,
            grep,
            child_table_filter_depth,
            parent_table_filter_depth,
            grep_only_matching: self.grep_only_matching,
        })
    }
}

fn checked_depth(name: &str, depth: i64) -> Result<usize> {
    usize::try_from(depth).map_err(|_| {
        Error::InvalidConfig(format!("{name} must be a non-negative integer, got {depth}"))
    })
}

fn optional_rule(
    pattern: Option<&str>,
    compile: fn(Option<&str>, Option<&str>) -> Result<InclusionRule>,
) -> Result<Option<InclusionRule>> {
    match pattern {
        Some(pattern) if !pattern.is_empty() => Ok(Some(compile(Some(pattern), None)?)),
        _ => Ok(None),
    }
}

/// Validated options consumed by [`crate::TablesReducer`].
#[derive(Debug, Clone)]
pub struct ReductionOptions {
    pub table_inclusion: InclusionRule,
    pub grep: TableGrepFilter,
    pub child_table_filter_depth: usize,
    pub parent_table_filter_depth: usize,
    pub grep_only_matching: bool,
}

impl Default for ReductionOptions {
    fn default() -> Self {
        Self {
            table_inclusion: InclusionRule::include_all(),
            grep: TableGrepFilter::default(),
            child_table_filter_depth: 0,
            parent_table_filter_depth: 0,
            grep_only_matching: false,
        }
    }
}

impl ReductionOptions {
    /// Name filter AND grep filter.
    pub fn table_filter(&self) -> ChainedTableFilter {
        let mut chain = ChainedTableFilter::new();
        chain.add(TableNameFilter::new(self.table_inclusion.clone()));
        chain.add(self.grep.clone());
        chain
    }
}
