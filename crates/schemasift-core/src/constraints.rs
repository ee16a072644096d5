use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Foreign key action semantics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FkAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    Unknown,
}

impl FkAction {
    /// SQL spelling used by renderers.
    pub fn as_sql(&self) -> &'static str {
        match self {
            FkAction::NoAction => "no action",
            FkAction::Restrict => "restrict",
            FkAction::Cascade => "cascade",
            FkAction::SetNull => "set null",
            FkAction::SetDefault => "set default",
            FkAction::Unknown => "unknown",
        }
    }
}

/// Foreign key definition as captured in a schema snapshot, preserving column ordering.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyDef {
    pub name: String,
    pub columns: Vec<String>,
    /// Schema of the referenced table; `None` means the owning table's schema.
    #[serde(default)]
    pub referenced_schema: Option<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_update: FkAction,
    #[serde(default)]
    pub on_delete: FkAction,
    #[serde(default)]
    pub is_deferrable: bool,
    #[serde(default)]
    pub initially_deferred: bool,
}
