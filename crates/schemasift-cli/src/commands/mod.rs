mod json;
mod text;

pub use json::JsonRenderer;
pub use text::{DetailLevel, SchemaTextRenderer};

use std::collections::BTreeMap;
use std::io::{self, Write};

use schemasift_core::Catalog;
use thiserror::Error;

/// Errors raised while looking up or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command '{command}', available: {}", available.join(", "))]
    UnknownCommand {
        command: String,
        available: Vec<String>,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// Renders a reduced catalog.
pub trait Renderer {
    /// File extension for the rendered artifact.
    fn extension(&self) -> &'static str;

    fn render(&self, catalog: &Catalog, out: &mut dyn Write) -> CommandResult<()>;
}

/// Builds a fresh renderer for each run.
pub type RendererFactory = Box<dyn Fn() -> Box<dyn Renderer> + Send + Sync>;

struct CommandProvider {
    description: String,
    factory: RendererFactory,
}

/// Maps command names to renderer factories.
///
/// Built-in commands are declared in [`CommandRegistry::new`]; callers can add
/// more through [`CommandRegistry::register`].
pub struct CommandRegistry {
    providers: BTreeMap<String, CommandProvider>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            providers: BTreeMap::new(),
        };
        registry.register("list", "table names only", || {
            Box::new(SchemaTextRenderer::new(DetailLevel::List))
        });
        registry.register("schema", "tables, columns and foreign keys", || {
            Box::new(SchemaTextRenderer::new(DetailLevel::Schema))
        });
        registry.register("details", "schema plus types, nullability and remarks", || {
            Box::new(SchemaTextRenderer::new(DetailLevel::Details))
        });
        registry.register("json", "reduced catalog as JSON", || Box::new(JsonRenderer));
        registry
    }

    /// Register a command; a later registration replaces an earlier one.
    pub fn register<F>(&mut self, command: &str, description: &str, factory: F)
    where
        F: Fn() -> Box<dyn Renderer> + Send + Sync + 'static,
    {
        tracing::debug!(event = "command_registered", command = %command);
        let provider = CommandProvider {
            description: description.to_string(),
            factory: Box::new(factory),
        };
        if self.providers.insert(command.to_string(), provider).is_some() {
            tracing::debug!(event = "command_replaced", command = %command);
        }
    }

    /// Command names in sorted order.
    pub fn available_commands(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    pub fn description(&self, command: &str) -> Option<&str> {
        self.providers
            .get(command)
            .map(|provider| provider.description.as_str())
    }

    pub fn new_renderer(&self, command: &str) -> CommandResult<Box<dyn Renderer>> {
        match self.providers.get(command) {
            Some(provider) => Ok((provider.factory)()),
            None => Err(CommandError::UnknownCommand {
                command: command.to_string(),
                available: self.available_commands(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountRenderer;

    impl Renderer for CountRenderer {
        fn extension(&self) -> &'static str {
            "txt"
        }

        fn render(&self, catalog: &Catalog, out: &mut dyn Write) -> CommandResult<()> {
            writeln!(out, "{}", catalog.tables().len())?;
            Ok(())
        }
    }

    #[test]
    fn builtin_commands_are_sorted() {
        let registry = CommandRegistry::new();
        assert_eq!(
            registry.available_commands(),
            vec!["details", "json", "list", "schema"]
        );
        assert_eq!(registry.description("json"), Some("reduced catalog as JSON"));
    }

    #[test]
    fn unknown_command_lists_alternatives() {
        let registry = CommandRegistry::new();
        let err = registry.new_renderer("graph").err().expect("unknown command");
        let message = err.to_string();
        assert!(message.contains("graph"));
        assert!(message.contains("details, json, list, schema"));
    }

    #[test]
    fn extensions_can_be_registered() {
        let mut registry = CommandRegistry::new();
        registry.register("count", "number of tables", || Box::new(CountRenderer));

        let renderer = registry.new_renderer("count").expect("count renderer");
        let mut out = Vec::new();
        renderer
            .render(&Catalog::new("postgres"), &mut out)
            .expect("render");
        assert_eq!(String::from_utf8(out).expect("utf8"), "0\n");
    }
}
