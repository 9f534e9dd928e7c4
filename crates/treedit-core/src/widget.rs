//! Editing widgets for primitive fields.
//!
//! These are toolkit-agnostic models: front ends draw them and forward user input to
//! their change methods. A widget is seeded from the node once, when it is mounted, and
//! keeps its own copy of the value from then on. Every accepted change sends exactly
//! one [`Edit`] to the editor; the widget never touches the tree itself.

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::warn;

use crate::node::{format_number, Value};
use crate::path::FieldTarget;

/// Request to overwrite one field, sent by a widget to the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub target: FieldTarget,
    pub value: Value,
}

/// Handle every widget uses to request a write followed by a recompile.
pub type EditSender = Sender<Edit>;
pub type EditReceiver = Receiver<Edit>;

/// Declaration keywords offered for `VariableDeclaration.kind`.
pub const DECLARATION_KINDS: &[&str] = &["var", "let", "const"];

/// Operators offered for `BinaryExpression.operator`.
pub const OPERATORS: &[&str] = &[
    "+", "-", "/", "%", "*", "**", "&", ",", ">>", ">>>", "<<", "^", "==", "===", "!=",
    "!==", "in", "instanceof", ">", "<", ">=", "<=",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    #[error("'{value}' is not one of: {}", options.join(" "))]
    UnknownOption {
        value: String,
        options: Vec<&'static str>,
    },

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("'{0}' is not a boolean (expected true or false)")]
    NotABoolean(String),
}

fn emit(sender: &EditSender, target: &FieldTarget, value: Value) {
    let edit = Edit {
        target: target.clone(),
        value,
    };
    if sender.send(edit).is_err() {
        warn!("Editor is gone, dropping edit for {}", target);
    }
}

/// Selector over a fixed list of string options.
#[derive(Debug, Clone)]
pub struct ChoiceInput {
    target: FieldTarget,
    options: &'static [&'static str],
    current: String,
    sender: EditSender,
}

impl ChoiceInput {
    pub fn new(
        target: FieldTarget,
        options: &'static [&'static str],
        initial: &Value,
        sender: EditSender,
    ) -> Self {
        Self {
            target,
            options,
            current: initial.to_string(),
            sender,
        }
    }

    pub fn options(&self) -> &'static [&'static str] {
        self.options
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Index of the current value, `None` when the node held something off the list.
    pub fn selected(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.current)
    }

    pub fn select(&mut self, option: &str) -> Result<(), WidgetError> {
        let option = self
            .options
            .iter()
            .find(|o| **o == option)
            .ok_or_else(|| WidgetError::UnknownOption {
                value: option.to_string(),
                options: self.options.to_vec(),
            })?;
        self.current = option.to_string();
        emit(&self.sender, &self.target, Value::from(*option));
        Ok(())
    }

    pub fn select_next(&mut self) {
        if self.options.is_empty() {
            return;
        }
        let next = match self.selected() {
            Some(i) => (i + 1) % self.options.len(),
            None => 0,
        };
        self.select_index(next);
    }

    pub fn select_previous(&mut self) {
        let len = self.options.len();
        if len == 0 {
            return;
        }
        let previous = match self.selected() {
            Some(i) => (i + len - 1) % len,
            None => len - 1,
        };
        self.select_index(previous);
    }

    fn select_index(&mut self, index: usize) {
        if let Some(option) = self.options.get(index) {
            self.current = option.to_string();
            emit(&self.sender, &self.target, Value::from(*option));
        }
    }
}

/// Free text input.
#[derive(Debug, Clone)]
pub struct TextInput {
    target: FieldTarget,
    text: String,
    sender: EditSender,
}

impl TextInput {
    pub fn new(target: FieldTarget, initial: &Value, sender: EditSender) -> Self {
        Self {
            target,
            text: initial.to_string(),
            sender,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.push(c);
        self.changed();
    }

    pub fn backspace(&mut self) {
        if self.text.pop().is_some() {
            self.changed();
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.changed();
    }

    fn changed(&self) {
        emit(&self.sender, &self.target, Value::from(self.text.as_str()));
    }
}

/// Numeric stepper with an editable text buffer.
///
/// Characters that cannot appear in a number are refused. Edits are sent only while
/// the buffer parses, so an empty or half-typed buffer leaves the node alone.
#[derive(Debug, Clone)]
pub struct NumberInput {
    target: FieldTarget,
    buffer: String,
    step: f64,
    sender: EditSender,
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl NumberInput {
    pub fn new(target: FieldTarget, initial: &Value, sender: EditSender) -> Self {
        Self {
            target,
            buffer: initial.to_string(),
            step: 1.0,
            sender,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn value(&self) -> Option<f64> {
        parse_number(&self.buffer)
    }

    /// Appends `c` if it can be part of a number; returns whether it was accepted.
    pub fn insert_char(&mut self, c: char) -> bool {
        if !is_number_char(c) {
            return false;
        }
        self.buffer.push(c);
        self.changed();
        true
    }

    pub fn backspace(&mut self) {
        if self.buffer.pop().is_some() {
            self.changed();
        }
    }

    /// Replaces the buffer with `text`, refusing it if it holds non-numeric characters.
    pub fn set_text(&mut self, text: &str) -> Result<(), WidgetError> {
        if !text.trim().chars().all(is_number_char) {
            return Err(WidgetError::NotANumber(text.to_string()));
        }
        self.buffer = text.trim().to_string();
        self.changed();
        Ok(())
    }

    pub fn increment(&mut self) {
        self.step_by(self.step);
    }

    pub fn decrement(&mut self) {
        self.step_by(-self.step);
    }

    fn step_by(&mut self, delta: f64) {
        let next = self.value().unwrap_or(0.0) + delta;
        self.buffer = format_number(next);
        self.changed();
    }

    fn changed(&self) {
        if let Some(n) = self.value() {
            emit(&self.sender, &self.target, Value::Number(n));
        }
    }
}

/// Checkbox for boolean flags.
#[derive(Debug, Clone)]
pub struct ToggleInput {
    target: FieldTarget,
    checked: bool,
    sender: EditSender,
}

impl ToggleInput {
    pub fn new(target: FieldTarget, initial: &Value, sender: EditSender) -> Self {
        Self {
            target,
            checked: initial.as_bool().unwrap_or(false),
            sender,
        }
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn toggle(&mut self) {
        self.set(!self.checked);
    }

    pub fn set(&mut self, checked: bool) {
        self.checked = checked;
        emit(&self.sender, &self.target, Value::Bool(checked));
    }
}

/// A mounted editing widget.
#[derive(Debug, Clone)]
pub enum Widget {
    Choice(ChoiceInput),
    Text(TextInput),
    Number(NumberInput),
    Toggle(ToggleInput),
}

impl Widget {
    pub fn target(&self) -> &FieldTarget {
        match self {
            Widget::Choice(w) => &w.target,
            Widget::Text(w) => &w.target,
            Widget::Number(w) => &w.target,
            Widget::Toggle(w) => &w.target,
        }
    }

    /// The widget's own copy of the value, as it would be drawn.
    pub fn display(&self) -> String {
        match self {
            Widget::Choice(w) => w.current.clone(),
            Widget::Text(w) => w.text.clone(),
            Widget::Number(w) => w.buffer.clone(),
            Widget::Toggle(w) => w.checked.to_string(),
        }
    }

    /// Feeds typed text through the widget's own coercion, as if the user entered it.
    pub fn enter(&mut self, text: &str) -> Result<(), WidgetError> {
        match self {
            Widget::Choice(w) => w.select(text),
            Widget::Text(w) => {
                w.set_text(text);
                Ok(())
            }
            Widget::Number(w) => {
                w.set_text(text)?;
                if w.value().is_none() {
                    return Err(WidgetError::NotANumber(text.to_string()));
                }
                Ok(())
            }
            Widget::Toggle(w) => {
                let checked = text
                    .trim()
                    .parse::<bool>()
                    .map_err(|_| WidgetError::NotABoolean(text.to_string()))?;
                w.set(checked);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::NodePath;

    fn target(field: &str) -> FieldTarget {
        FieldTarget::new(NodePath::root().element("body", 0), field)
    }

    fn drain(receiver: &EditReceiver) -> Vec<Value> {
        receiver.try_iter().map(|edit| edit.value).collect()
    }

    #[test]
    fn test_operator_list_is_complete() {
        assert_eq!(OPERATORS.len(), 22);
        assert_eq!(DECLARATION_KINDS, &["var", "let", "const"]);
    }

    #[test]
    fn test_choice_sends_one_edit_per_change() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut choice = ChoiceInput::new(target("kind"), DECLARATION_KINDS, &Value::from("var"), tx);
        assert_eq!(choice.selected(), Some(0));

        choice.select("const").unwrap();
        choice.select_next();
        choice.select_previous();
        assert_eq!(
            drain(&rx),
            vec![Value::from("const"), Value::from("var"), Value::from("const")]
        );

        let err = choice.select("static").unwrap_err();
        assert!(matches!(err, WidgetError::UnknownOption { .. }));
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_choice_seeded_off_list() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut choice = ChoiceInput::new(target("operator"), OPERATORS, &Value::from("|"), tx);
        assert_eq!(choice.selected(), None);
        assert_eq!(choice.current(), "|");
        choice.select_next();
        assert_eq!(drain(&rx), vec![Value::from("+")]);
    }

    #[test]
    fn test_choice_without_options_ignores_cycling() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut choice = ChoiceInput::new(target("kind"), &[], &Value::from("var"), tx);
        choice.select_next();
        choice.select_previous();
        assert_eq!(choice.current(), "var");
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_text_input_emits_every_keystroke() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut text = TextInput::new(target("name"), &Value::from("a"), tx);
        text.insert_char('b');
        text.backspace();
        text.backspace();
        text.backspace();
        assert_eq!(
            drain(&rx),
            vec![Value::from("ab"), Value::from("a"), Value::from("")]
        );
    }

    #[test]
    fn test_number_input_refuses_non_numeric() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut number = NumberInput::new(target("value"), &Value::Number(10.0), tx);
        assert_eq!(number.buffer(), "10");

        assert!(!number.insert_char('x'));
        assert!(number.insert_char('5'));
        number.backspace();
        number.backspace();
        number.backspace();
        assert_eq!(number.buffer(), "");
        assert_eq!(drain(&rx), vec![Value::Number(105.0), Value::Number(10.0), Value::Number(1.0)]);

        assert!(number.set_text("abc").is_err());
        number.set_text("-").unwrap();
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_number_stepper() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut number = NumberInput::new(target("value"), &Value::Number(1.5), tx);
        number.increment();
        number.decrement();
        number.decrement();
        assert_eq!(number.buffer(), "0.5");
        assert_eq!(
            drain(&rx),
            vec![Value::Number(2.5), Value::Number(1.5), Value::Number(0.5)]
        );
    }

    #[test]
    fn test_toggle_and_enter() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut widget = Widget::Toggle(ToggleInput::new(target("async"), &Value::Bool(false), tx));
        assert_eq!(widget.display(), "false");
        widget.enter("true").unwrap();
        assert_eq!(widget.display(), "true");
        assert!(widget.enter("yes").is_err());
        if let Widget::Toggle(toggle) = &mut widget {
            toggle.toggle();
        }
        assert_eq!(drain(&rx), vec![Value::Bool(true), Value::Bool(false)]);
    }

    #[test]
    fn test_widget_never_resyncs() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let seed = Value::from("a");
        let widget = Widget::Text(TextInput::new(target("name"), &seed, tx));
        drop(seed);
        assert_eq!(widget.display(), "a");
        assert_eq!(widget.target().field, "name");
    }

    #[test]
    fn test_send_after_editor_dropped_is_harmless() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let mut toggle = ToggleInput::new(target("generator"), &Value::Bool(true), tx);
        toggle.toggle();
        assert!(!toggle.checked());
    }
}
