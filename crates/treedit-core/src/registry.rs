//! Widget registry keyed by `Kind.field`.
//!
//! Lookup is an exact match on the node kind and field name. A missing key means the
//! field is shown as read-only text.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::node::Value;
use crate::path::FieldTarget;
use crate::widget::{
    ChoiceInput, EditSender, NumberInput, TextInput, ToggleInput, Widget, DECLARATION_KINDS,
    OPERATORS,
};

/// Builds a widget bound to `target`, seeded with the field's current value.
pub type WidgetFactory = fn(FieldTarget, &Value, EditSender) -> Widget;

/// Registration key: `<NodeKind>.<fieldName>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetKey(String);

impl WidgetKey {
    pub fn new(kind: &str, field: &str) -> Self {
        Self(format!("{kind}.{field}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("A widget is already registered for '{0}'")]
    DuplicateKey(WidgetKey),
}

#[derive(Clone, Default)]
pub struct Registry {
    factories: IndexMap<WidgetKey, WidgetFactory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

fn declaration_kind(target: FieldTarget, value: &Value, sender: EditSender) -> Widget {
    Widget::Choice(ChoiceInput::new(target, DECLARATION_KINDS, value, sender))
}

fn binary_operator(target: FieldTarget, value: &Value, sender: EditSender) -> Widget {
    Widget::Choice(ChoiceInput::new(target, OPERATORS, value, sender))
}

fn text(target: FieldTarget, value: &Value, sender: EditSender) -> Widget {
    Widget::Text(TextInput::new(target, value, sender))
}

fn number(target: FieldTarget, value: &Value, sender: EditSender) -> Widget {
    Widget::Number(NumberInput::new(target, value, sender))
}

fn toggle(target: FieldTarget, value: &Value, sender: EditSender) -> Widget {
    Widget::Toggle(ToggleInput::new(target, value, sender))
}

impl Registry {
    /// An empty registry; every field renders read-only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the default editors for declarations, operators, identifiers,
    /// numbers and function flags.
    pub fn builtin() -> Self {
        let builtins: [(&str, &str, WidgetFactory); 6] = [
            ("VariableDeclaration", "kind", declaration_kind),
            ("BinaryExpression", "operator", binary_operator),
            ("Identifier", "name", text),
            ("NumericLiteral", "value", number),
            ("FunctionDeclaration", "generator", toggle),
            ("FunctionDeclaration", "async", toggle),
        ];
        let factories = builtins
            .into_iter()
            .map(|(kind, field, factory)| (WidgetKey::new(kind, field), factory))
            .collect();
        Self { factories }
    }

    pub fn register(
        &mut self,
        kind: &str,
        field: &str,
        factory: WidgetFactory,
    ) -> Result<(), RegistryError> {
        let key = WidgetKey::new(kind, field);
        if self.factories.contains_key(&key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        debug!("Registered widget for {}", key);
        self.factories.insert(key, factory);
        Ok(())
    }

    pub fn resolve(&self, kind: &str, field: &str) -> Option<WidgetFactory> {
        self.factories.get(&WidgetKey::new(kind, field)).copied()
    }

    /// Resolves and builds the widget for one field, if any is registered.
    pub fn mount(
        &self,
        kind: &str,
        target: FieldTarget,
        value: &Value,
        sender: &EditSender,
    ) -> Option<Widget> {
        let factory = self.resolve(kind, &target.field)?;
        Some(factory(target, value, sender.clone()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &WidgetKey> {
        self.factories.keys()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
