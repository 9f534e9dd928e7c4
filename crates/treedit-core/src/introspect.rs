//! Field classification for tree nodes.
//!
//! Nothing here knows about node kinds. A fixed allow-list names the scalar fields that
//! can be edited, and everything else is sorted by looking at the value's shape.

use crate::node::{Fields, Value};

/// Field names treated as editable scalars, whatever their value looks like.
pub const PRIMITIVE_FIELDS: &[&str] = &["kind", "name", "generator", "async", "value", "operator"];

/// One renderable field of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDescriptor<'a> {
    /// Allow-listed scalar field
    Primitive { name: &'a str, value: &'a Value },
    /// Field holding a single node
    Child { name: &'a str, child: &'a Fields },
    /// Field holding a list whose first element is a node
    ChildSequence { name: &'a str, children: &'a [Value] },
}

impl<'a> FieldDescriptor<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            FieldDescriptor::Primitive { name, .. }
            | FieldDescriptor::Child { name, .. }
            | FieldDescriptor::ChildSequence { name, .. } => name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, FieldDescriptor::Primitive { .. })
    }
}

pub fn is_primitive_field(name: &str) -> bool {
    PRIMITIVE_FIELDS.contains(&name)
}

/// Classifies the fields of `node` in insertion order, dropping opaque ones.
///
/// Only the first element of a list is inspected; a list that starts with a node is
/// taken to be a sequence of nodes.
pub fn classify(node: &Fields) -> Vec<FieldDescriptor<'_>> {
    node.iter()
        .filter_map(|(name, value)| {
            let name = name.as_str();
            if is_primitive_field(name) {
                return Some(FieldDescriptor::Primitive { name, value });
            }
            if let Some(child) = value.as_node() {
                return Some(FieldDescriptor::Child { name, child });
            }
            match value {
                Value::List(children) if children.first().is_some_and(Value::is_node) => {
                    Some(FieldDescriptor::ChildSequence { name, children })
                }
                _ => None,
            }
        })
        .collect()
}

/// True when the node has anything to show when expanded, primitive fields included.
pub fn has_children(node: &Fields) -> bool {
    !classify(node).is_empty()
}
