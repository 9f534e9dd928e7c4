//! Addresses of nodes and fields inside a tree.
//!
//! Widgets never hold references into the tree. They carry a [`FieldTarget`] and the
//! editor resolves it against the root it owns when an edit arrives.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::node::{Fields, Value};

/// One step from a node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathSegment {
    pub field: String,
    /// Position inside a child sequence, `None` for a single child field.
    pub index: Option<usize>,
}

/// Location of a node relative to the root. The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<PathSegment>);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),
}

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of the single child stored in `field`.
    pub fn child(&self, field: &str) -> Self {
        self.push(PathSegment {
            field: field.to_string(),
            index: None,
        })
    }

    /// Path of element `index` of the child sequence stored in `field`.
    pub fn element(&self, field: &str, index: usize) -> Self {
        self.push(PathSegment {
            field: field.to_string(),
            index: Some(index),
        })
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    /// Path of the enclosing node, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }

    /// True when `self` is `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &NodePath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn resolve<'a>(&self, root: &'a Fields) -> Option<&'a Fields> {
        let mut node = root;
        for segment in &self.0 {
            let value = node.get(&segment.field)?;
            let value = match segment.index {
                Some(index) => value.as_list()?.get(index)?,
                None => value,
            };
            node = value.as_node()?;
        }
        Some(node)
    }

    pub fn resolve_mut<'a>(&self, root: &'a mut Fields) -> Option<&'a mut Fields> {
        let mut node = root;
        for segment in &self.0 {
            let value = node.get_mut(&segment.field)?;
            let value = match (segment.index, value) {
                (Some(index), Value::List(items)) => items.get_mut(index)?,
                (Some(_), _) => return None,
                (None, value) => value,
            };
            node = value.as_node_mut()?;
        }
        Some(node)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(".");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.field)?;
            if let Some(index) = segment.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

/// Parses the [`Display`](fmt::Display) form: `.` for the root, otherwise
/// dot-separated fields with optional `[index]` suffixes, e.g. `body[1].body.body[0]`.
impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for raw in s.split('.') {
            let invalid = || PathError::InvalidSegment(raw.to_string());
            let (field, index) = match raw.find('[') {
                Some(open) => {
                    let digits = raw[open + 1..].strip_suffix(']').ok_or_else(invalid)?;
                    let index = digits.parse::<usize>().map_err(|_| invalid())?;
                    (&raw[..open], Some(index))
                }
                None => (raw, None),
            };
            if field.is_empty() || !field.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(invalid());
            }
            segments.push(PathSegment {
                field: field.to_string(),
                index,
            });
        }
        Ok(Self(segments))
    }
}

/// A single editable slot: one field on the node at `path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldTarget {
    pub path: NodePath,
    pub field: String,
}

impl FieldTarget {
    pub fn new(path: NodePath, field: impl Into<String>) -> Self {
        Self {
            path,
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            f.write_str(&self.field)
        } else {
            write!(f, "{}.{}", self.path, self.field)
        }
    }
}
