//! Output notification system for the REPL
//!
//! Plain command output and errors go through `on_output`/`on_error`; the code
//! produced by each round of edits goes through `on_code`, so a backend can show it
//! apart from command chatter (or diff it, or write it to a file).

/// Trait for handling REPL output notifications
pub trait ReplNotifier: Send + Sync {
    /// Handle regular output
    fn on_output(&self, content: &str);

    /// Handle error output
    fn on_error(&self, content: &str);

    /// Handle the compiled code after `applied` edits were written and recompiled.
    /// `stale` carries the compile error when the code shown is the last good output.
    fn on_code(
        &self,
        code: &str,
        stale: Option<&str>,
        applied: usize,
        duration_ms: u64,
        verbose: bool,
    );
}

/// Default console-based notifier
pub struct DefaultNotifier;

impl DefaultNotifier {
    /// Create a new default notifier
    pub fn new() -> Self {
        Self
    }
}

impl ReplNotifier for DefaultNotifier {
    fn on_output(&self, content: &str) {
        if !content.is_empty() {
            println!("{}", content);
        }
    }

    fn on_error(&self, content: &str) {
        eprintln!("{}", content);
    }

    fn on_code(
        &self,
        code: &str,
        stale: Option<&str>,
        applied: usize,
        duration_ms: u64,
        verbose: bool,
    ) {
        println!("{}", code);
        if let Some(error) = stale {
            eprintln!("(stale: {})", error);
        }
        if verbose {
            println!("=> {} edit(s) applied ({}ms)", applied, duration_ms);
        }
    }
}

impl Default for DefaultNotifier {
    fn default() -> Self {
        Self::new()
    }
}
