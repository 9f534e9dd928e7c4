//! REPL command parsing and handling

use anyhow::{anyhow, Result};
use treedit_core::NodePath;

/// REPL commands that can be executed
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Show help information
    Help,
    /// Exit the REPL
    Quit,
    /// Toggle debug mode
    Debug,
    /// Print the visible tree
    Tree,
    /// Expand or collapse a node
    Toggle(NodePath),
    /// List the classified fields of a node
    Fields(NodePath),
    /// Write a field through its registered widget
    Set {
        path: NodePath,
        field: String,
        value: String,
    },
    /// Print the compiled code
    Code,
    /// Dump a node as JSON
    Json(NodePath),
}

/// Splits off the first whitespace-separated word.
fn next_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim_start();
    if input.is_empty() {
        return None;
    }
    match input.find(char::is_whitespace) {
        Some(end) => Some((&input[..end], &input[end..])),
        None => Some((input, "")),
    }
}

fn parse_path(text: &str) -> Result<NodePath> {
    text.parse::<NodePath>().map_err(|e| anyhow!("{e}"))
}

/// Parse a command string into a ReplCommand
pub fn parse_command(input: &str) -> Result<ReplCommand> {
    let trimmed = input.trim();

    if !trimmed.starts_with('.') {
        return Err(anyhow!("Commands must start with '.'"));
    }

    let Some((name, rest)) = next_word(&trimmed[1..]) else {
        return Err(anyhow!("Empty command"));
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match name {
        "help" | "h" => Ok(ReplCommand::Help),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        "debug" => Ok(ReplCommand::Debug),
        "tree" | "t" => Ok(ReplCommand::Tree),
        "code" | "c" => Ok(ReplCommand::Code),
        "toggle" | "o" => {
            if args.len() != 1 {
                return Err(anyhow!("Usage: .toggle <path>"));
            }
            Ok(ReplCommand::Toggle(parse_path(args[0])?))
        }
        "fields" | "f" => match args.as_slice() {
            [] => Ok(ReplCommand::Fields(NodePath::root())),
            [path] => Ok(ReplCommand::Fields(parse_path(path)?)),
            _ => Err(anyhow!("Usage: .fields [path]")),
        },
        "json" => match args.as_slice() {
            [] => Ok(ReplCommand::Json(NodePath::root())),
            [path] => Ok(ReplCommand::Json(parse_path(path)?)),
            _ => Err(anyhow!("Usage: .json [path]")),
        },
        "set" => {
            let usage = || anyhow!("Usage: .set <path> <field> <value>");
            let (path, rest) = next_word(rest).ok_or_else(usage)?;
            let (field, rest) = next_word(rest).ok_or_else(usage)?;
            let value = rest.trim();
            if value.is_empty() {
                return Err(usage());
            }
            Ok(ReplCommand::Set {
                path: parse_path(path)?,
                field: field.to_string(),
                value: value.to_string(),
            })
        }
        _ => Err(anyhow!("Unknown command: .{}", name)),
    }
}
