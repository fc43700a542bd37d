//! Priority-ordered text rewriting applied to every line before dispatch
//!
//! Each pass rewrites the command name and every argument independently.
//! Passes run in ascending priority; a later pass sees the output of an
//! earlier one, but no pass re-scans its own output.
//!
//! | Pass | Priority | Rewrites |
//! |------|----------|----------|
//! | [`BuiltinPass`] | `i32::MIN` | masks reserved names, resolves `#!` |
//! | [`MacroPass`] | `0` | user macro names |
//! | [`VariablePass`] | `100` | `$name$` references |
//! | [`MemoryPass`] | `200` | `^` and `^^` memory escapes |

mod builtin;
pub mod markers;
mod memory;
mod user;
mod variable;

pub use builtin::{is_reserved, BuiltinPass, RESERVED_NAMES};
pub use memory::{MemoryPass, PEEK_ESCAPE, POP_ESCAPE};
pub use user::{validate_macro_name, Macro, MacroPass, NativeMacro};
pub use variable::VariablePass;

use crate::error::{Cmd9Error, Cmd9Result};
use crate::launcher::Launcher;
use std::sync::Arc;

pub const BUILTIN_PRIORITY: i32 = i32::MIN;
pub const MACRO_PRIORITY: i32 = 0;
pub const VARIABLE_PRIORITY: i32 = 100;
pub const MEMORY_PRIORITY: i32 = 200;

/// One text-rewrite stage.
pub trait PreprocessPass: Send + Sync {
    fn name(&self) -> &str;

    /// Lower runs earlier.
    fn priority(&self) -> i32;

    fn apply(&self, text: &str, launcher: &mut Launcher) -> Cmd9Result<String>;
}

/// Ordered list of passes.
#[derive(Clone)]
pub struct Pipeline {
    passes: Vec<Arc<dyn PreprocessPass>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// The four standard passes.
    pub fn new() -> Self {
        let mut pipeline = Self::empty();
        pipeline.add(Arc::new(BuiltinPass));
        pipeline.add(Arc::new(MacroPass));
        pipeline.add(Arc::new(VariablePass));
        pipeline.add(Arc::new(MemoryPass));
        pipeline
    }

    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    /// Insert a pass and re-sort; equal priorities keep insertion order.
    pub fn add(&mut self, pass: Arc<dyn PreprocessPass>) {
        tracing::debug!(pass = pass.name(), priority = pass.priority(), "Registering preprocess pass");
        self.passes.push(pass);
        self.passes.sort_by_key(|p| p.priority());
    }

    pub fn remove(&mut self, name: &str) -> Cmd9Result<Arc<dyn PreprocessPass>> {
        if name == BuiltinPass::NAME {
            return Err(Cmd9Error::InvalidDefinition(
                "the builtin pass cannot be removed".to_string(),
            ));
        }
        let index = self
            .passes
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| Cmd9Error::raised(format!("no preprocess pass named '{name}'")))?;
        Ok(self.passes.remove(index))
    }

    pub fn passes(&self) -> &[Arc<dyn PreprocessPass>] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}
