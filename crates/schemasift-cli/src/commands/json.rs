use std::io::Write;

use schemasift_core::Catalog;

use super::{CommandResult, Renderer};

/// Serializes the reduced catalog, placeholder tables included.
#[derive(Debug, Clone, Copy)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, catalog: &Catalog, out: &mut dyn Write) -> CommandResult<()> {
        serde_json::to_writer_pretty(&mut *out, catalog)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemasift_core::{Table, TableRef};

    #[test]
    fn renders_tables_and_placeholders() {
        let mut catalog = Catalog::new("postgres");
        catalog
            .add_table(Table::new(TableRef::new(Some("public"), "users")))
            .expect("add table");

        let mut out = Vec::new();
        JsonRenderer.render(&catalog, &mut out).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&out).expect("parse json");

        assert_eq!(value["engine"], "postgres");
        assert_eq!(value["tables"][0]["full_name"], "public.users");
        assert_eq!(value["tables"][0]["table"]["schema"], "public");
        assert!(value["placeholder_tables"].as_array().expect("array").is_empty());
    }
}
