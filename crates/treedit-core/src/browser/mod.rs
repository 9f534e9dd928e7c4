//! Full-screen terminal browser.
//!
//! Left pane: the tree rows from [`TreeView`]. Right pane: the compiled code. Key
//! handling lives here, drawing lives in [`render`]. After every key the editor is
//! pumped, so the code pane always reflects the edits made so far.

pub mod render;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::ListState;
use tracing::{debug, warn};

use crate::compile::JsPrinter;
use crate::editor::Editor;
use crate::path::FieldTarget;
use crate::registry::Registry;
use crate::view::{Row, RowKind, Toggle, TreeView};
use crate::widget::Widget;
use crate::TreeditConfig;

pub use render::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Edit,
    Help,
}

pub struct App {
    pub editor: Editor<JsPrinter>,
    pub view: TreeView,
    pub rows: Vec<Row>,
    pub list_state: ListState,
    pub mode: Mode,
    /// Field currently receiving keystrokes
    pub editing: Option<FieldTarget>,
    pub status: String,
    pub quit: bool,
}

impl App {
    pub fn new(config: &TreeditConfig, source: &str) -> crate::Result<Self> {
        let editor = config.editor_for(source)?;
        let view = TreeView::new(Registry::builtin(), editor.edit_sender());
        let mut app = Self {
            editor,
            view,
            rows: Vec::new(),
            list_state: ListState::default(),
            mode: Mode::Browse,
            editing: None,
            status: "Press h for help".to_string(),
            quit: false,
        };
        app.refresh();
        app.list_state.select(Some(0));
        Ok(app)
    }

    pub fn selected(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.rows.get(self.selected())
    }

    /// Rebuilds the visible rows, keeping the selection in range.
    pub fn refresh(&mut self) {
        self.rows = self.view.rows(self.editor.root());
        if self.selected() >= self.rows.len() {
            self.list_state.select(Some(self.rows.len().saturating_sub(1)));
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match self.mode {
            Mode::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::F(1)
                ) {
                    self.mode = Mode::Browse;
                }
            }
            Mode::Browse => self.handle_browse_key(key.code),
            Mode::Edit => self.handle_edit_key(key.code),
        }
        self.pump();
        self.refresh();
    }

    fn handle_browse_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Char('h') | KeyCode::F(1) => self.mode = Mode::Help,
            KeyCode::Up => self.previous(),
            KeyCode::Down => self.next(),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(),
            _ => {}
        }
    }

    fn handle_edit_key(&mut self, code: KeyCode) {
        let Some(target) = self.editing.clone() else {
            self.mode = Mode::Browse;
            return;
        };
        if matches!(code, KeyCode::Esc | KeyCode::Enter) {
            self.stop_editing();
            return;
        }
        let Some(widget) = self.view.widget_mut(&target) else {
            self.stop_editing();
            return;
        };
        match (widget, code) {
            (Widget::Choice(choice), KeyCode::Right) => choice.select_next(),
            (Widget::Choice(choice), KeyCode::Left) => choice.select_previous(),
            (Widget::Text(text), KeyCode::Char(c)) => text.insert_char(c),
            (Widget::Text(text), KeyCode::Backspace) => text.backspace(),
            (Widget::Number(number), KeyCode::Up) => number.increment(),
            (Widget::Number(number), KeyCode::Down) => number.decrement(),
            (Widget::Number(number), KeyCode::Char(c)) => {
                if !number.insert_char(c) {
                    self.status = format!("'{c}' is not allowed in a number");
                }
            }
            (Widget::Number(number), KeyCode::Backspace) => number.backspace(),
            (Widget::Toggle(toggle), KeyCode::Char(' ')) => toggle.toggle(),
            _ => {}
        }
    }

    fn previous(&mut self) {
        let i = self.selected().saturating_sub(1);
        self.list_state.select(Some(i));
    }

    fn next(&mut self) {
        let last = self.rows.len().saturating_sub(1);
        let i = (self.selected() + 1).min(last);
        self.list_state.select(Some(i));
    }

    /// Enter/Space on the selected row: toggle a node or start editing a field.
    fn activate(&mut self) {
        let Some(row) = self.selected_row().cloned() else {
            return;
        };
        match row.kind {
            RowKind::Node { path, kind, .. } => {
                match self.view.toggle(self.editor.root(), &path) {
                    Ok(Toggle::Disallowed) => self.status = format!("{kind} has no fields"),
                    Ok(_) => {}
                    Err(e) => self.status = e.to_string(),
                }
            }
            RowKind::Field {
                target,
                editable: true,
                ..
            } => {
                self.status = format!("Editing {target} (Esc to finish)");
                self.editing = Some(target);
                self.mode = Mode::Edit;
            }
            RowKind::Field { target, .. } => {
                self.status = format!("{target} is read-only");
            }
            RowKind::Label { .. } | RowKind::Opaque { .. } => {}
        }
    }

    fn stop_editing(&mut self) {
        self.editing = None;
        self.mode = Mode::Browse;
        self.status = String::new();
    }

    fn pump(&mut self) {
        match self.editor.pump() {
            Ok(0) => {}
            Ok(applied) => debug!("Browser applied {} edit(s)", applied),
            Err(e) => {
                warn!("Edit failed: {}", e);
                self.status = format!("Error: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::DEFAULT_SOURCE;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn select_label(app: &mut App, label: &str) {
        let index = app
            .rows
            .iter()
            .position(|row| row.label() == label)
            .unwrap_or_else(|| panic!("no row labelled {label:?}"));
        app.list_state.select(Some(index));
    }

    fn app() -> App {
        App::new(&TreeditConfig::default(), DEFAULT_SOURCE).unwrap()
    }

    #[test]
    fn test_starts_collapsed_with_code() {
        let app = app();
        assert_eq!(app.rows.len(), 1);
        assert_eq!(app.editor.code(), DEFAULT_SOURCE);
    }

    #[test]
    fn test_navigation_and_toggle() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.rows.len(), 4);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected(), 2);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected(), 3);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected(), 2);
    }

    #[test]
    fn test_choice_editing_recompiles() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "VariableDeclaration +");
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "kind: [var]");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Edit);

        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, Mode::Browse);
        assert!(app.editor.code().starts_with("const a = 10;"));
        assert!(app.rows.iter().any(|row| row.label() == "kind: [const]"));
    }

    #[test]
    fn test_toggle_editing() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "FunctionDeclaration +");
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "async: [false]");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Esc);
        assert!(app.editor.code().contains("async function sum(a, b) {"));
    }

    #[test]
    fn test_read_only_field_reports_status() {
        let mut app = App::new(&TreeditConfig::default(), "x = true;").unwrap();
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "ExpressionStatement +");
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "AssignmentExpression +");
        press(&mut app, KeyCode::Enter);
        select_label(&mut app, "operator: =");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.status, "body[0].expression.operator is read-only");
    }

    #[test]
    fn test_number_editing_steps_and_types_signs() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        for label in ["VariableDeclaration +", "VariableDeclarator +", "NumericLiteral +"] {
            select_label(&mut app, label);
            press(&mut app, KeyCode::Enter);
        }
        select_label(&mut app, "value: [10]");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.mode, Mode::Edit);

        press(&mut app, KeyCode::Up);
        assert!(app.editor.code().starts_with("var a = 11;"));
        for c in ['e', '-', '1'] {
            press(&mut app, KeyCode::Char(c));
        }
        assert!(app.editor.code().starts_with("var a = 1.1;"));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.status, "'x' is not allowed in a number");
        assert!(app.rows.iter().any(|row| row.label() == "value: [11e-1]"));
    }

    #[test]
    fn test_help_and_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.mode, Mode::Help);
        press(&mut app, KeyCode::Char('q'));
        assert_eq!(app.mode, Mode::Browse);
        assert!(!app.quit);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.quit);
    }
}
