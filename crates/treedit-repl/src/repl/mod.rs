//! REPL (Read-Eval-Print Loop) functionality for Treedit
//!
//! This module wraps the core editor and tree view with a line-oriented
//! interface:
//! - Dot commands (.tree, .toggle, .set, ...)
//! - Script execution from a file
//! - Output formatting and notifications

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::debug;
use treedit_core::{
    classify, node::node_kind, Editor, FieldDescriptor, FieldTarget, JsPrinter, NodePath,
    Registry, Toggle, TreeView, TreeditConfig,
};

pub mod commands;
pub mod notifier;

pub use commands::ReplCommand;
pub use notifier::{DefaultNotifier, ReplNotifier};

/// Interactive REPL over one program's syntax tree
pub struct Repl {
    /// Owner of the tree and the compiled code
    editor: Editor<JsPrinter>,
    /// Expansion state and mounted widgets
    view: TreeView,
    /// Current notifier for output
    notifier: Box<dyn ReplNotifier>,
    /// Whether the REPL is running
    running: bool,
    /// Debug mode
    debug: bool,
}

impl Repl {
    /// Create a new REPL editing `source`
    pub fn new(config: &TreeditConfig, source: &str) -> Result<Self> {
        let editor = config.editor_for(source)?;
        let view = TreeView::new(Registry::builtin(), editor.edit_sender());
        Ok(Self {
            editor,
            view,
            notifier: Box::new(DefaultNotifier::new()),
            running: true,
            debug: config.debug,
        })
    }

    /// Set the notifier for this REPL
    pub fn set_notifier(&mut self, notifier: Box<dyn ReplNotifier>) {
        self.notifier = notifier;
    }

    /// Get a reference to the current notifier
    pub fn notifier(&self) -> &dyn ReplNotifier {
        self.notifier.as_ref()
    }

    /// Check if the REPL is still running
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn editor(&self) -> &Editor<JsPrinter> {
        &self.editor
    }

    /// Parse REPL input into a command
    pub fn parse_input(&self, input: &str) -> Result<ReplCommand> {
        commands::parse_command(input)
    }

    /// Parse and run one line, returning its output
    pub fn execute_line(&mut self, line: &str) -> Result<String> {
        let command = self.parse_input(line)?;
        self.handle_command(command)
    }

    /// Run every command in a script file, reporting through the notifier.
    /// Blank lines and lines starting with `#` are skipped. Returns the number of
    /// commands that succeeded.
    pub fn run_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read {}: {e}", path.display()))?;
        let mut succeeded = 0;
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if !self.running {
                break;
            }
            self.notifier.on_output(&format!(">> {trimmed}"));
            match self.execute_line(trimmed) {
                Ok(output) => {
                    self.notifier.on_output(&output);
                    succeeded += 1;
                }
                Err(e) => self.notifier.on_error(&format!("Error: {e}")),
            }
        }
        Ok(succeeded)
    }

    /// Handle a REPL command
    pub fn handle_command(&mut self, command: ReplCommand) -> Result<String> {
        match command {
            ReplCommand::Help => Ok(self.get_help_text()),
            ReplCommand::Quit => {
                self.running = false;
                Ok("Goodbye!".to_string())
            }
            ReplCommand::Debug => {
                self.debug = !self.debug;
                Ok(format!(
                    "Debug mode: {}",
                    if self.debug { "on" } else { "off" }
                ))
            }
            ReplCommand::Tree => Ok(self.render_tree()),
            ReplCommand::Toggle(path) => self.toggle(&path),
            ReplCommand::Fields(path) => self.list_fields(&path),
            ReplCommand::Set { path, field, value } => self.set_field(path, field, &value),
            ReplCommand::Code => Ok(self.render_code()),
            ReplCommand::Json(path) => {
                let node = path
                    .resolve(self.editor.root())
                    .ok_or_else(|| anyhow!("No node at path '{path}'"))?;
                Ok(serde_json::to_string_pretty(node)?)
            }
        }
    }

    /// The visible rows, with node paths so they can be passed back to commands
    pub fn render_tree(&mut self) -> String {
        self.view
            .rows(self.editor.root())
            .iter()
            .map(|row| {
                let indent = "  ".repeat(row.depth);
                match row.node_path() {
                    Some(path) => format!("{indent}{}  @{path}", row.label()),
                    None => format!("{indent}{}", row.label()),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn render_code(&self) -> String {
        match self.editor.last_error() {
            Some(e) => format!("{}\n\n(stale: {e})", self.editor.code()),
            None => self.editor.code().to_string(),
        }
    }

    fn toggle(&mut self, path: &NodePath) -> Result<String> {
        let outcome = self.view.toggle(self.editor.root(), path)?;
        let message = match outcome {
            Toggle::Expanded => format!("Expanded {path}"),
            Toggle::Collapsed => format!("Collapsed {path}"),
            Toggle::Disallowed => return Ok(format!("Nothing to expand at {path}")),
        };
        Ok(format!("{message}\n{}", self.render_tree()))
    }

    fn list_fields(&self, path: &NodePath) -> Result<String> {
        let node = path
            .resolve(self.editor.root())
            .ok_or_else(|| anyhow!("No node at path '{path}'"))?;
        let kind = node_kind(node);
        let mut lines = vec![format!("{kind} @{path}")];
        for descriptor in classify(node) {
            match descriptor {
                FieldDescriptor::Primitive { name, value } => {
                    let access = if self.view.registry().resolve(kind, name).is_some() {
                        "editable"
                    } else {
                        "read-only"
                    };
                    lines.push(format!("  {name} = {value} ({access})"));
                }
                FieldDescriptor::Child { name, child } => {
                    lines.push(format!("  {name} -> {} @{}", node_kind(child), path.child(name)));
                }
                FieldDescriptor::ChildSequence { name, children } => {
                    lines.push(format!("  {name} ({} items)", children.len()));
                    for (index, element) in children.iter().enumerate() {
                        match element.as_node() {
                            Some(child) => lines.push(format!(
                                "    {} @{}",
                                node_kind(child),
                                path.element(name, index)
                            )),
                            None => lines.push(format!("    {element}")),
                        }
                    }
                }
            }
        }
        Ok(lines.join("\n"))
    }

    /// Feeds `text` through the field's widget, then applies the resulting edits.
    fn set_field(&mut self, path: NodePath, field: String, text: &str) -> Result<String> {
        let start = Instant::now();
        let node = path
            .resolve(self.editor.root())
            .ok_or_else(|| anyhow!("No node at path '{path}'"))?;
        let kind = node_kind(node).to_string();
        let value = node
            .get(&field)
            .cloned()
            .ok_or_else(|| anyhow!("{kind} at '{path}' has no field '{field}'"))?;

        let target = FieldTarget::new(path, field);
        let message = format!("Set {target} to {text}");
        let sender = self.editor.edit_sender();
        match self.view.widget_mut(&target) {
            Some(widget) => widget.enter(text)?,
            None => {
                let mut widget = self
                    .view
                    .registry()
                    .mount(&kind, target.clone(), &value, &sender)
                    .ok_or_else(|| anyhow!("{kind}.{} is read-only", target.field))?;
                widget.enter(text)?;
            }
        }

        let applied = self.editor.pump()?;
        let elapsed = start.elapsed();
        debug!("Applied {} edit(s) in {:?}", applied, elapsed);
        let stale = self.editor.last_error().map(ToString::to_string);
        self.notifier.on_code(
            self.editor.code(),
            stale.as_deref(),
            applied,
            elapsed.as_millis() as u64,
            self.debug,
        );
        Ok(message)
    }

    /// Get help text
    fn get_help_text(&self) -> String {
        r#"Treedit REPL Commands:
  .help                     - Show this help message
  .quit                     - Exit the REPL
  .debug                    - Toggle debug mode

Tree Commands:
  .tree                     - Show the visible tree with node paths
  .toggle <path>            - Expand or collapse the node at <path>
  .fields [path]            - List a node's fields and children
  .set <path> <field> <v>   - Edit a field through its widget and show the new code
  .code                     - Show the compiled code
  .json [path]              - Dump a node as JSON

Paths look like body[1].body.body[0]; '.' is the root."#
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treedit_core::DEFAULT_SOURCE;

    fn repl() -> Repl {
        Repl::new(&TreeditConfig::default(), DEFAULT_SOURCE).unwrap()
    }

    #[test]
    fn test_tree_starts_collapsed() {
        let mut repl = repl();
        assert_eq!(repl.execute_line(".tree").unwrap(), "Program +  @.");
    }

    #[test]
    fn test_toggle_shows_children() {
        let mut repl = repl();
        let output = repl.execute_line(".toggle .").unwrap();
        assert_eq!(
            output,
            "Expanded .\nProgram -  @.\n  body:\n    VariableDeclaration +  @body[0]\n    FunctionDeclaration +  @body[1]"
        );
    }

    #[test]
    fn test_toggle_hidden_node_fails() {
        let mut repl = repl();
        let err = repl.execute_line(".toggle body[1]").unwrap_err();
        assert_eq!(err.to_string(), "Node at 'body[1]' is inside a collapsed node");
    }

    #[test]
    fn test_set_registered_field() {
        let mut repl = repl();
        let output = repl.execute_line(".set body[0] kind let").unwrap();
        assert_eq!(output, "Set body[0].kind to let");
        assert!(repl.editor().code().starts_with("let a = 10;"));
    }

    #[test]
    fn test_set_rejects_unregistered_and_invalid() {
        let mut repl = repl();
        let err = repl.execute_line(".set . sourceType module").unwrap_err();
        assert_eq!(err.to_string(), "Program.sourceType is read-only");

        let err = repl.execute_line(".set body[0] kind static").unwrap_err();
        assert!(err.to_string().contains("is not one of"));

        let err = repl
            .execute_line(".set body[0].declarations[0].init value ten")
            .unwrap_err();
        assert!(err.to_string().contains("is not a number"));
        assert_eq!(repl.editor().recompile_count(), 1);
    }

    #[test]
    fn test_fields_lists_paths() {
        let repl = repl();
        let output = repl.list_fields(&"body[1]".parse().unwrap()).unwrap();
        assert!(output.contains("generator = false (editable)"));
        assert!(output.contains("id -> Identifier @body[1].id"));
        assert!(output.contains("    Identifier @body[1].params[1]"));
    }
}
