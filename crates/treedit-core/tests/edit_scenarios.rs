use pretty_assertions::assert_eq;

use treedit_core::{
    CompileOptions, Editor, FieldTarget, JsParser, JsPrinter, NodePath, Parser, Registry, Toggle,
    TreeView, TreeditConfig, Value, Widget, DEFAULT_SOURCE,
};

fn setup() -> (Editor<JsPrinter>, TreeView) {
    let editor = TreeditConfig::default().editor_for(DEFAULT_SOURCE).unwrap();
    let view = TreeView::new(Registry::builtin(), editor.edit_sender());
    (editor, view)
}

fn path(text: &str) -> NodePath {
    text.parse().unwrap()
}

fn expand(editor: &Editor<JsPrinter>, view: &mut TreeView, paths: &[&str]) {
    for p in paths {
        assert_eq!(view.toggle(editor.root(), &path(p)), Ok(Toggle::Expanded));
    }
    view.rows(editor.root());
}

#[test]
fn test_declaration_kind_to_const() {
    let (mut editor, mut view) = setup();
    expand(&editor, &mut view, &[".", "body[0]"]);

    let target = FieldTarget::new(path("body[0]"), "kind");
    match view.widget_mut(&target) {
        Some(Widget::Choice(choice)) => choice.select("const").unwrap(),
        other => panic!("expected kind selector, got {other:?}"),
    }
    editor.pump().unwrap();

    assert_eq!(
        editor.code(),
        "const a = 10;\n\nfunction sum(a, b) {\n  var result = a + b;\n  return result;\n}"
    );
}

#[test]
fn test_operator_plus_to_minus() {
    let (mut editor, mut view) = setup();
    expand(
        &editor,
        &mut view,
        &[
            ".",
            "body[1]",
            "body[1].body",
            "body[1].body.body[0]",
            "body[1].body.body[0].declarations[0]",
            "body[1].body.body[0].declarations[0].init",
        ],
    );

    let target = FieldTarget::new(path("body[1].body.body[0].declarations[0].init"), "operator");
    match view.widget_mut(&target) {
        Some(Widget::Choice(choice)) => choice.select("-").unwrap(),
        other => panic!("expected operator selector, got {other:?}"),
    }
    assert_eq!(editor.pump().unwrap(), 1);
    assert!(editor.code().contains("var result = a - b;"));
    assert!(editor.code().starts_with("var a = 10;"));
}

#[test]
fn test_async_flag_on_sum() {
    let (mut editor, mut view) = setup();
    expand(&editor, &mut view, &[".", "body[1]"]);

    let target = FieldTarget::new(path("body[1]"), "async");
    match view.widget_mut(&target) {
        Some(Widget::Toggle(toggle)) => toggle.set(true),
        other => panic!("expected async toggle, got {other:?}"),
    }
    editor.pump().unwrap();

    let line = editor.code().lines().nth(2).unwrap();
    assert_eq!(line, "async function sum(a, b) {");
}

#[test]
fn test_rename_and_renumber() {
    let (mut editor, mut view) = setup();
    expand(
        &editor,
        &mut view,
        &[
            ".",
            "body[0]",
            "body[0].declarations[0]",
            "body[0].declarations[0].id",
            "body[0].declarations[0].init",
        ],
    );

    let name = FieldTarget::new(path("body[0].declarations[0].id"), "name");
    if let Some(Widget::Text(text)) = view.widget_mut(&name) {
        text.backspace();
        for c in "count".chars() {
            text.insert_char(c);
        }
    }
    let value = FieldTarget::new(path("body[0].declarations[0].init"), "value");
    if let Some(Widget::Number(number)) = view.widget_mut(&value) {
        number.increment();
        number.insert_char('0');
    }

    // One recompile per keystroke.
    assert_eq!(editor.pump().unwrap(), 8);
    assert!(editor.code().starts_with("var count = 110;"));
    assert_eq!(editor.recompile_count(), 9);
}

#[test]
fn test_json_loaded_tree_is_editable() {
    let source = "let x = 1;";
    let program = JsParser::new().parse_program(source).unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let loaded: treedit_core::Fields = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, program);

    let mut editor = Editor::new(loaded, JsPrinter::new(), CompileOptions::default()).unwrap();
    editor
        .write_field(&FieldTarget::new(path("body[0]"), "kind"), Value::from("var"))
        .unwrap();
    editor.recompile().unwrap();
    assert_eq!(editor.code(), "var x = 1;");
}
