//! The editor controller.
//!
//! [`Editor`] is the only owner of the tree. Widgets send [`Edit`]s through the sender it
//! hands out; the editor writes each one in place and then recompiles the whole tree.

use std::time::Instant;

use crossbeam_channel::unbounded;
use thiserror::Error;
use tracing::{debug, warn};

use crate::compile::{CompileError, CompileOptions, CompileOutput, Compiler};
use crate::node::{Fields, Value};
use crate::path::{FieldTarget, NodePath};
use crate::widget::{Edit, EditReceiver, EditSender};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("No node at path '{0}'")]
    NodeNotFound(NodePath),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

pub struct Editor<C: Compiler> {
    root: Fields,
    compiler: C,
    options: CompileOptions,
    output: CompileOutput,
    last_error: Option<CompileError>,
    sender: EditSender,
    receiver: EditReceiver,
    recompiles: usize,
}

impl<C: Compiler> Editor<C> {
    /// Takes ownership of `root` and compiles it once.
    pub fn new(root: Fields, compiler: C, options: CompileOptions) -> Result<Self, CompileError> {
        let (sender, receiver) = unbounded();
        let mut editor = Self {
            root,
            compiler,
            options,
            output: CompileOutput::default(),
            last_error: None,
            sender,
            receiver,
            recompiles: 0,
        };
        editor.recompile()?;
        Ok(editor)
    }

    pub fn root(&self) -> &Fields {
        &self.root
    }

    pub fn output(&self) -> &CompileOutput {
        &self.output
    }

    pub fn code(&self) -> &str {
        &self.output.code
    }

    /// Error from the most recent recompile, cleared by the next successful one.
    pub fn last_error(&self) -> Option<&CompileError> {
        self.last_error.as_ref()
    }

    /// Number of recompiles run so far, including the initial one.
    pub fn recompile_count(&self) -> usize {
        self.recompiles
    }

    /// Sender to inject into every widget, however deep.
    pub fn edit_sender(&self) -> EditSender {
        self.sender.clone()
    }

    /// Writes `value` into the target field in place. Does not recompile.
    pub fn write_field(&mut self, target: &FieldTarget, value: Value) -> Result<(), EditError> {
        let node = target
            .path
            .resolve_mut(&mut self.root)
            .ok_or_else(|| EditError::NodeNotFound(target.path.clone()))?;
        debug!("Writing {} = {}", target, value);
        node.insert(target.field.clone(), value);
        Ok(())
    }

    /// Writes the edit, then recompiles. The write is kept even if compilation fails.
    pub fn apply(&mut self, edit: Edit) -> Result<(), EditError> {
        self.write_field(&edit.target, edit.value)?;
        self.recompile()?;
        Ok(())
    }

    /// Applies every queued edit in arrival order, one recompile each.
    pub fn pump(&mut self) -> Result<usize, EditError> {
        let mut applied = 0;
        while let Ok(edit) = self.receiver.try_recv() {
            self.apply(edit)?;
            applied += 1;
        }
        if applied > 0 {
            debug!("Applied {} queued edit(s)", applied);
        }
        Ok(applied)
    }

    /// Recompiles the whole tree. On failure the previous output is kept.
    pub fn recompile(&mut self) -> Result<&CompileOutput, CompileError> {
        let start = Instant::now();
        self.recompiles += 1;
        match self.compiler.compile(&self.root, &self.options) {
            Ok(output) => {
                debug!(
                    "Recompile #{} finished in {:?} ({} bytes)",
                    self.recompiles,
                    start.elapsed(),
                    output.code.len()
                );
                self.output = output;
                self.last_error = None;
                Ok(&self.output)
            }
            Err(e) => {
                warn!("Recompile #{} failed: {}", self.recompiles, e);
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}
