use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Formatted and raw type metadata for a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnType {
    /// User-friendly formatted type (e.g. `character varying(255)`).
    pub data_type: String,
    /// Name of the underlying type, when the engine reports one.
    #[serde(default)]
    pub udt_name: Option<String>,
    #[serde(default)]
    pub character_max_length: Option<i32>,
    #[serde(default)]
    pub numeric_precision: Option<i32>,
    #[serde(default)]
    pub numeric_scale: Option<i32>,
}

impl ColumnType {
    /// Build a type with only the formatted name populated.
    pub fn named(data_type: impl Into<String>) -> Self {
        Self {
            data_type: data_type.into(),
            udt_name: None,
            character_max_length: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }
}
