//! Treedit REPL - Command-line interface for browsing and editing JavaScript
//! syntax trees
//!
//! This crate provides the REPL (Read-Eval-Print Loop) front end for Treedit,
//! including dot-command parsing, script execution and output notification.

pub mod repl;

// Re-export commonly used types for convenience
pub use repl::{DefaultNotifier, Repl, ReplCommand, ReplNotifier};
