use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::table::Table;

/// Predicate over already-loaded table metadata.
pub trait TableFilter {
    fn include(&self, table: &Table) -> bool;
}

/// Include/exclude pair of regular expressions matched against whole names.
#[derive(Debug, Clone)]
pub struct InclusionRule {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl InclusionRule {
    /// Compile a rule. An absent or empty include pattern means "everything";
    /// an absent or empty exclude pattern excludes nothing.
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Self::build(include, exclude, false)
    }

    /// Like [`InclusionRule::new`], but `.` also matches line breaks, for
    /// free text such as remarks.
    pub fn multiline(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        Self::build(include, exclude, true)
    }

    fn build(
        include: Option<&str>,
        exclude: Option<&str>,
        dot_matches_new_line: bool,
    ) -> Result<Self> {
        Ok(Self {
            include: compile_non_empty(include, dot_matches_new_line)?,
            exclude: compile_non_empty(exclude, dot_matches_new_line)?,
        })
    }

    /// Rule that accepts every name.
    pub fn include_all() -> Self {
        Self {
            include: None,
            exclude: None,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if let Some(include) = &self.include {
            if !include.is_match(name) {
                return false;
            }
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(name),
            None => true,
        }
    }
}

fn compile_non_empty(pattern: Option<&str>, dot_matches_new_line: bool) -> Result<Option<Regex>> {
    match pattern {
        Some(pattern) if !pattern.is_empty() => {
            compile_anchored(pattern, dot_matches_new_line).map(Some)
        }
        _ => Ok(None),
    }
}

fn compile_anchored(pattern: &str, dot_matches_new_line: bool) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .dot_matches_new_line(dot_matches_new_line)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Includes tables whose full name satisfies an [`InclusionRule`].
#[derive(Debug, Clone)]
pub struct TableNameFilter {
    rule: InclusionRule,
}

impl TableNameFilter {
    pub fn new(rule: InclusionRule) -> Self {
        Self { rule }
    }
}

impl TableFilter for TableNameFilter {
    fn include(&self, table: &Table) -> bool {
        self.rule.matches(table.full_name())
    }
}

/// Content filter over table names, column names and remarks.
///
/// With no rule configured every table passes. Otherwise a table passes when
/// any configured rule matches, and `invert_match` flips the outcome.
#[derive(Debug, Clone, Default)]
pub struct TableGrepFilter {
    pub tables: Option<InclusionRule>,
    pub columns: Option<InclusionRule>,
    pub definitions: Option<InclusionRule>,
    pub invert_match: bool,
}

impl TableGrepFilter {
    fn is_configured(&self) -> bool {
        self.tables.is_some() || self.columns.is_some() || self.definitions.is_some()
    }

    fn matches(&self, table: &Table) -> bool {
        if let Some(rule) = &self.tables {
            if rule.matches(table.full_name()) {
                return true;
            }
        }

        if let Some(rule) = &self.columns {
            if table
                .columns()
                .iter()
                .any(|column| rule.matches(&column.full_name()))
            {
                return true;
            }
        }

        if let Some(rule) = &self.definitions {
            if table.remarks.as_deref().is_some_and(|remarks| rule.matches(remarks)) {
                return true;
            }
            if table
                .columns()
                .iter()
                .filter_map(|column| column.remarks.as_deref())
                .any(|remarks| rule.matches(remarks))
            {
                return true;
            }
        }

        false
    }
}

impl TableFilter for TableGrepFilter {
    fn include(&self, table: &Table) -> bool {
        if !self.is_configured() {
            return true;
        }
        self.matches(table) != self.invert_match
    }
}

/// Logical AND over an ordered list of filters; empty includes everything.
#[derive(Default)]
pub struct ChainedTableFilter {
    filters: Vec<Box<dyn TableFilter>>,
}

impl ChainedTableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, filter: impl TableFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl TableFilter for ChainedTableFilter {
    fn include(&self, table: &Table) -> bool {
        self.filters.iter().all(|filter| filter.include(table))
    }
}
