//! # Treedit Core
//!
//! Structural editing of JavaScript syntax trees, including:
//! - An open, insertion-ordered node model and path addressing
//! - A small JavaScript parser producing Babel-shaped trees
//! - Field introspection and a widget registry keyed by `Kind.field`
//! - Toolkit-agnostic editing widgets that report edits over a channel
//! - The editor controller that applies edits and recompiles source
//! - A collapsible tree view and a terminal browser built on it
//!
//! Front ends (the terminal browser, the REPL) drive an [`Editor`] and a [`TreeView`];
//! neither ever mutates the tree directly.

#![warn(clippy::all)]

pub mod browser;
pub mod compile;
pub mod editor;
pub mod introspect;
pub mod node;
pub mod parser;
pub mod path;
pub mod registry;
pub mod view;
pub mod widget;

use std::path::{Path, PathBuf};

// Re-export commonly used types
pub use compile::{CompileError, CompileOptions, CompileOutput, Compiler, JsPrinter};
pub use editor::{EditError, Editor};
pub use introspect::{classify, has_children, FieldDescriptor, PRIMITIVE_FIELDS};
pub use node::{Fields, Value};
pub use parser::{JsParser, ParseError, Parser};
pub use path::{FieldTarget, NodePath, PathError};
pub use registry::{Registry, RegistryError, WidgetFactory, WidgetKey};
pub use view::{Row, RowKind, Toggle, TreeView, ViewError};
pub use widget::{Edit, EditReceiver, EditSender, Widget, WidgetError};

/// Treedit version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Program loaded when no source is supplied.
pub const DEFAULT_SOURCE: &str = "var a = 10;

function sum(a, b) {
  var result = a + b;
  return result;
}";

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("treedit_core=info"))
}

/// Initialize tracing to stderr for Treedit components
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize tracing into `path`, for front ends that own the terminal
pub fn init_tracing_to_file(path: &Path) -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;
    Ok(())
}

/// Core Treedit configuration
#[derive(Debug, Clone, Default)]
pub struct TreeditConfig {
    /// Options passed to the compiler on every recompile
    pub compile: CompileOptions,
    /// Enable debug mode
    pub debug: bool,
    /// Where front ends that own the terminal write their logs
    pub log_file: Option<PathBuf>,
}

impl TreeditConfig {
    /// Editor over `source` using the default parser and printer
    pub fn editor_for(&self, source: &str) -> Result<Editor<JsPrinter>> {
        let root = JsParser::new().parse_program(source)?;
        Ok(Editor::new(root, JsPrinter::new(), self.compile.clone())?)
    }
}

/// Error types for Treedit core operations
#[derive(thiserror::Error, Debug)]
pub enum TreeditError {
    /// Source could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Tree could not be compiled
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// Edit could not be applied
    #[error("Edit error: {0}")]
    Edit(#[from] EditError),

    /// Widget registration failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Tree view operation failed
    #[error("View error: {0}")]
    View(#[from] ViewError),

    /// Widget refused the entered value
    #[error("Widget error: {0}")]
    Widget(#[from] WidgetError),

    /// Path text could not be parsed
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Treedit core operations
pub type Result<T> = std::result::Result<T, TreeditError>;
