use std::fs;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use treedit_core::{TreeditConfig, DEFAULT_SOURCE};
use treedit_repl::repl::{Repl, ReplCommand, ReplNotifier};

#[derive(Clone, Default)]
struct Collector {
    output: Arc<Mutex<Vec<String>>>,
    errors: Arc<Mutex<Vec<String>>>,
    code: Arc<Mutex<Vec<(String, usize)>>>,
}

impl ReplNotifier for Collector {
    fn on_output(&self, content: &str) {
        self.output.lock().unwrap().push(content.to_string());
    }

    fn on_error(&self, content: &str) {
        self.errors.lock().unwrap().push(content.to_string());
    }

    fn on_code(&self, code: &str, stale: Option<&str>, applied: usize, _ms: u64, _verbose: bool) {
        assert_eq!(stale, None);
        self.code.lock().unwrap().push((code.to_string(), applied));
    }
}

fn repl() -> Repl {
    Repl::new(&TreeditConfig::default(), DEFAULT_SOURCE).unwrap()
}

#[test]
fn test_initial_code() {
    let mut repl = repl();
    let result = repl.handle_command(ReplCommand::Code).unwrap();
    assert_eq!(
        result,
        "var a = 10;\n\nfunction sum(a, b) {\n  var result = a + b;\n  return result;\n}"
    );
}

#[test]
fn test_edit_operator_through_commands() {
    let collector = Collector::default();
    let mut repl = repl();
    repl.set_notifier(Box::new(collector.clone()));
    let result = repl
        .execute_line(".set body[1].body.body[0].declarations[0].init operator *")
        .unwrap();
    assert_eq!(
        result,
        "Set body[1].body.body[0].declarations[0].init.operator to *"
    );

    let code = collector.code.lock().unwrap();
    assert_eq!(code.len(), 1);
    assert_eq!(code[0].1, 1);
    assert!(code[0].0.contains("var result = a * b;"));
}

#[test]
fn test_mounted_widget_is_reused() {
    let mut repl = repl();
    for path in [".", "body[0]", "body[0].declarations[0]", "body[0].declarations[0].id"] {
        repl.execute_line(&format!(".toggle {path}")).unwrap();
    }
    assert!(repl.render_tree().contains("name: [a]"));

    repl.execute_line(".set body[0].declarations[0].id name total")
        .unwrap();
    assert!(repl.editor().code().starts_with("var total = 10;"));
    // Widgets are not resynced from the tree.
    assert!(repl.render_tree().contains("name: [total]"));
}

#[test]
fn test_unknown_field_is_rejected() {
    let mut repl = repl();
    let err = repl.execute_line(".set body[0] flavour sweet").unwrap_err();
    assert_eq!(
        err.to_string(),
        "VariableDeclaration at 'body[0]' has no field 'flavour'"
    );
    let err = repl.execute_line(".json body[9]").unwrap_err();
    assert_eq!(err.to_string(), "No node at path 'body[9]'");
}

#[test]
fn test_json_dump() {
    let mut repl = repl();
    let json = repl.execute_line(".json body[0].declarations[0].init").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "NumericLiteral");
    assert_eq!(value["value"], 10.0);
}

#[test]
fn test_run_script_file() {
    let temp_dir = TempDir::new().unwrap();
    let script = temp_dir.path().join("edits.treedit");
    fs::write(
        &script,
        "# make it const\n\
         .set body[0] kind const\n\
         \n\
         .set body[1] async maybe\n\
         .set body[1] async true\n\
         .code\n\
         .quit\n\
         .code\n",
    )
    .unwrap();

    let collector = Collector::default();
    let mut repl = repl();
    repl.set_notifier(Box::new(collector.clone()));

    let succeeded = repl.run_file(&script).unwrap();
    assert_eq!(succeeded, 4);
    assert!(!repl.is_running());

    let errors = collector.errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("is not a boolean"));

    let output = collector.output.lock().unwrap();
    assert_eq!(output.first().map(String::as_str), Some(">> .set body[0] kind const"));
    assert_eq!(output.last().map(String::as_str), Some("Goodbye!"));
    assert!(output
        .iter()
        .any(|o| o.starts_with("const a = 10;\n\nasync function sum(a, b) {")));
    assert!(output.iter().any(|o| o == "Set body[1].async to true"));

    let code = collector.code.lock().unwrap();
    assert_eq!(code.len(), 2);
    assert!(code[0].0.starts_with("const a = 10;\n\nfunction sum"));
    assert!(code[1].0.starts_with("const a = 10;\n\nasync function sum"));
}

#[test]
fn test_missing_script_file() {
    let temp_dir = TempDir::new().unwrap();
    let mut repl = repl();
    assert!(repl.run_file(&temp_dir.path().join("absent")).is_err());
}
