//! Collapsible tree view.
//!
//! The view keeps per-node expansion state and the widgets mounted for visible
//! primitive fields. It only ever reads the tree: toggling a node never writes to it and
//! never triggers a recompile. Edits flow from the mounted widgets to the editor.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::debug;

use crate::introspect::{classify, has_children, FieldDescriptor};
use crate::node::{node_kind, Fields, Value};
use crate::path::{FieldTarget, NodePath};
use crate::registry::Registry;
use crate::widget::{EditSender, Widget};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    #[error("No node at path '{0}'")]
    NodeNotFound(NodePath),

    #[error("Node at '{0}' is inside a collapsed node")]
    Hidden(NodePath),
}

/// Outcome of a toggle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Expanded,
    Collapsed,
    /// The node has nothing to show, so it cannot be opened
    Disallowed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    /// A node button showing its kind
    Node {
        path: NodePath,
        kind: String,
        expandable: bool,
        expanded: bool,
    },
    /// Heading for a child or child sequence field
    Label { field: String },
    /// A primitive field, drawn through its widget when one is mounted
    Field {
        target: FieldTarget,
        text: String,
        editable: bool,
    },
    /// A sequence element that is not a node
    Opaque { text: String },
}

/// One line of the flattened, visible tree
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub depth: usize,
    pub kind: RowKind,
}

impl Row {
    /// Plain-text rendering without indentation.
    pub fn label(&self) -> String {
        match &self.kind {
            RowKind::Node {
                kind,
                expandable,
                expanded,
                ..
            } => match (expandable, expanded) {
                (false, _) => kind.clone(),
                (true, true) => format!("{kind} -"),
                (true, false) => format!("{kind} +"),
            },
            RowKind::Label { field } => format!("{field}:"),
            RowKind::Field {
                target,
                text,
                editable,
            } => {
                if *editable {
                    format!("{}: [{}]", target.field, text)
                } else {
                    format!("{}: {}", target.field, text)
                }
            }
            RowKind::Opaque { text } => text.clone(),
        }
    }

    pub fn node_path(&self) -> Option<&NodePath> {
        match &self.kind {
            RowKind::Node { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn field_target(&self) -> Option<&FieldTarget> {
        match &self.kind {
            RowKind::Field { target, .. } => Some(target),
            _ => None,
        }
    }
}

pub struct TreeView {
    registry: Registry,
    sender: EditSender,
    expanded: HashSet<NodePath>,
    widgets: HashMap<FieldTarget, Widget>,
}

impl TreeView {
    pub fn new(registry: Registry, sender: EditSender) -> Self {
        Self {
            registry,
            sender,
            expanded: HashSet::new(),
            widgets: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn is_expanded(&self, path: &NodePath) -> bool {
        self.expanded.contains(path)
    }

    /// True when every node enclosing `path` is expanded.
    pub fn is_visible(&self, path: &NodePath) -> bool {
        let mut current = path.parent();
        while let Some(ancestor) = current {
            if !self.expanded.contains(&ancestor) {
                return false;
            }
            current = ancestor.parent();
        }
        true
    }

    /// Opens or closes the node at `path`.
    ///
    /// Closing discards everything mounted underneath: nested expansion state and the
    /// widgets for its fields.
    pub fn toggle(&mut self, root: &Fields, path: &NodePath) -> Result<Toggle, ViewError> {
        let node = path
            .resolve(root)
            .ok_or_else(|| ViewError::NodeNotFound(path.clone()))?;
        if !self.is_visible(path) {
            return Err(ViewError::Hidden(path.clone()));
        }
        if !has_children(node) {
            return Ok(Toggle::Disallowed);
        }

        if self.expanded.contains(path) {
            self.expanded.retain(|p| !p.starts_with(path));
            let before = self.widgets.len();
            self.widgets.retain(|target, _| !target.path.starts_with(path));
            debug!(
                "Collapsed {} ({} widget(s) unmounted)",
                path,
                before - self.widgets.len()
            );
            Ok(Toggle::Collapsed)
        } else {
            self.expanded.insert(path.clone());
            debug!("Expanded {}", path);
            Ok(Toggle::Expanded)
        }
    }

    pub fn widget(&self, target: &FieldTarget) -> Option<&Widget> {
        self.widgets.get(target)
    }

    pub fn widget_mut(&mut self, target: &FieldTarget) -> Option<&mut Widget> {
        self.widgets.get_mut(target)
    }

    pub fn mounted_widgets(&self) -> usize {
        self.widgets.len()
    }

    /// Flattens the visible part of the tree, mounting widgets for newly shown fields.
    pub fn rows(&mut self, root: &Fields) -> Vec<Row> {
        let mut rows = Vec::new();
        self.push_node(&mut rows, root, NodePath::root(), 0);
        rows
    }

    fn push_node(&mut self, rows: &mut Vec<Row>, node: &Fields, path: NodePath, depth: usize) {
        let expanded = self.expanded.contains(&path);
        let kind = node_kind(node);
        rows.push(Row {
            depth,
            kind: RowKind::Node {
                path: path.clone(),
                kind: kind.to_string(),
                expandable: has_children(node),
                expanded,
            },
        });
        if !expanded {
            return;
        }

        for descriptor in classify(node) {
            match descriptor {
                FieldDescriptor::Primitive { name, value } => {
                    let target = FieldTarget::new(path.clone(), name);
                    rows.push(Row {
                        depth: depth + 1,
                        kind: self.field_row(kind, target, value),
                    });
                }
                FieldDescriptor::Child { name, child } => {
                    rows.push(Row {
                        depth: depth + 1,
                        kind: RowKind::Label {
                            field: name.to_string(),
                        },
                    });
                    self.push_node(rows, child, path.child(name), depth + 2);
                }
                FieldDescriptor::ChildSequence { name, children } => {
                    rows.push(Row {
                        depth: depth + 1,
                        kind: RowKind::Label {
                            field: name.to_string(),
                        },
                    });
                    for (index, element) in children.iter().enumerate() {
                        match element.as_node() {
                            Some(child) => {
                                self.push_node(rows, child, path.element(name, index), depth + 2)
                            }
                            None => rows.push(Row {
                                depth: depth + 2,
                                kind: RowKind::Opaque {
                                    text: element.to_string(),
                                },
                            }),
                        }
                    }
                }
            }
        }
    }

    fn field_row(&mut self, kind: &str, target: FieldTarget, value: &Value) -> RowKind {
        if let Some(widget) = self.widgets.get(&target) {
            return RowKind::Field {
                text: widget.display(),
                target,
                editable: true,
            };
        }
        match self
            .registry
            .mount(kind, target.clone(), value, &self.sender)
        {
            Some(widget) => {
                let text = widget.display();
                self.widgets.insert(target.clone(), widget);
                RowKind::Field {
                    target,
                    text,
                    editable: true,
                }
            }
            None => RowKind::Field {
                target,
                text: value.to_string(),
                editable: false,
            },
        }
    }
}
