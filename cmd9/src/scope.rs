//! Nested local scopes, the Global scope, and `$name$` interpolation

use crate::error::{Cmd9Error, Cmd9Result};
use std::collections::BTreeMap;

/// Delimiter around variable references in text.
pub const VAR_DELIMITER: char = '$';

/// A name → text namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    vars: BTreeMap<String, String>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Boundary recorded by [`ScopeManager::begin_temp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempMark {
    restore_depth: usize,
    was_global: bool,
}

/// Full state needed to roll the manager back after an aborted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeCheckpoint {
    depth: usize,
    global_active: bool,
    temp_marks: usize,
    global_guards: usize,
}

/// Stack of local scopes plus the single Global scope.
///
/// Writes go to Global while Global mode is active, otherwise to the top
/// local scope. Reads fall back from the top local scope to Global, never
/// the other way round.
#[derive(Debug, Clone)]
pub struct ScopeManager {
    locals: Vec<Scope>,
    global: Scope,
    global_active: bool,
    temp_marks: Vec<usize>,
    global_guards: usize,
}

impl Default for ScopeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeManager {
    pub fn new() -> Self {
        Self {
            locals: vec![Scope::default()],
            global: Scope::default(),
            global_active: false,
            temp_marks: Vec::new(),
            global_guards: 0,
        }
    }

    /// Number of local scopes, including the outermost one.
    pub fn depth(&self) -> usize {
        self.locals.len()
    }

    pub fn is_global(&self) -> bool {
        self.global_active
    }

    pub fn global(&self) -> &Scope {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut Scope {
        &mut self.global
    }

    fn top(&self) -> &Scope {
        // locals always holds the outermost scope
        &self.locals[self.locals.len() - 1]
    }

    fn target_mut(&mut self) -> &mut Scope {
        if self.global_active {
            return &mut self.global;
        }
        let last = self.locals.len() - 1;
        &mut self.locals[last]
    }

    /// The scope that `store` currently writes to.
    pub fn active(&self) -> &Scope {
        if self.global_active {
            &self.global
        } else {
            self.top()
        }
    }

    pub fn enter_scope(&mut self) -> Cmd9Result<()> {
        if self.global_active {
            return Err(Cmd9Error::scope("cannot enter a local scope while Global is active"));
        }
        self.locals.push(Scope::default());
        tracing::trace!(depth = self.locals.len(), "Entered scope");
        Ok(())
    }

    pub fn exit_scope(&mut self) -> Cmd9Result<()> {
        if self.global_active {
            return Err(Cmd9Error::scope("cannot exit a local scope while Global is active"));
        }
        if self.locals.len() <= 1 {
            return Err(Cmd9Error::scope("cannot exit the outermost scope"));
        }
        if self.temp_marks.last().is_some_and(|mark| self.locals.len() <= *mark) {
            return Err(Cmd9Error::scope(
                "cannot exit past a temporary scope boundary",
            ));
        }
        self.locals.pop();
        tracing::trace!(depth = self.locals.len(), "Exited scope");
        Ok(())
    }

    pub fn enter_global(&mut self) -> Cmd9Result<()> {
        if self.global_active {
            return Err(Cmd9Error::scope("Global is already active"));
        }
        self.global_active = true;
        Ok(())
    }

    pub fn exit_global(&mut self) -> Cmd9Result<()> {
        if !self.global_active {
            return Err(Cmd9Error::scope("Global is not active"));
        }
        if self.global_guards > 0 {
            return Err(Cmd9Error::scope(
                "cannot leave Global inside a temporary Global run",
            ));
        }
        self.global_active = false;
        Ok(())
    }

    pub fn store(&mut self, name: &str, value: &str) {
        self.target_mut().set(name, value);
    }

    pub fn load(&self, name: &str) -> Cmd9Result<&str> {
        let found = if self.global_active {
            self.global.get(name)
        } else {
            self.top().get(name).or_else(|| self.global.get(name))
        };
        found.ok_or_else(|| Cmd9Error::UndefinedVariable(name.to_string()))
    }

    /// Remove `name` from the active target scope.
    pub fn remove(&mut self, name: &str) -> bool {
        self.target_mut().remove(name)
    }

    /// Enter a temporary scope whose boundary no explicit exit may cross.
    pub fn begin_temp(&mut self) -> Cmd9Result<TempMark> {
        let mark = TempMark {
            restore_depth: self.locals.len(),
            was_global: self.global_active,
        };
        self.enter_scope()?;
        self.temp_marks.push(self.locals.len());
        Ok(mark)
    }

    /// Unwind every scope opened since `mark`, including the temporary one.
    pub fn end_temp(&mut self, mark: TempMark) {
        while self
            .temp_marks
            .last()
            .is_some_and(|m| *m > mark.restore_depth)
        {
            self.temp_marks.pop();
        }
        self.locals.truncate(mark.restore_depth.max(1));
        self.global_active = mark.was_global;
    }

    /// Switch Global on for the duration of one run. Returns whether it was
    /// already on, for [`ScopeManager::end_temp_global`].
    pub fn begin_temp_global(&mut self) -> bool {
        let was_global = std::mem::replace(&mut self.global_active, true);
        self.global_guards += 1;
        was_global
    }

    pub fn end_temp_global(&mut self, was_global: bool) {
        self.global_guards = self.global_guards.saturating_sub(1);
        self.global_active = was_global;
    }

    pub fn checkpoint(&self) -> ScopeCheckpoint {
        ScopeCheckpoint {
            depth: self.locals.len(),
            global_active: self.global_active,
            temp_marks: self.temp_marks.len(),
            global_guards: self.global_guards,
        }
    }

    pub fn restore(&mut self, checkpoint: ScopeCheckpoint) {
        self.locals.truncate(checkpoint.depth.max(1));
        self.temp_marks.truncate(checkpoint.temp_marks);
        self.global_active = checkpoint.global_active;
        self.global_guards = checkpoint.global_guards;
    }

    /// Replace `$name$` references with their current values.
    ///
    /// A reference without a closing delimiter is copied literally. With a
    /// `limit`, substitution stops after that many matches and the rest of
    /// the text is copied verbatim.
    pub fn interpolate(&self, text: &str, limit: Option<usize>) -> Cmd9Result<String> {
        self.interpolate_counted(text, limit).map(|(out, _)| out)
    }

    /// [`ScopeManager::interpolate`], also returning the number of substitutions.
    pub fn interpolate_counted(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> Cmd9Result<(String, usize)> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut substituted = 0;

        loop {
            if limit.is_some_and(|max| substituted >= max) {
                out.push_str(rest);
                break;
            }
            let Some(start) = rest.find(VAR_DELIMITER) else {
                out.push_str(rest);
                break;
            };
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let Some(end) = after.find(VAR_DELIMITER) else {
                out.push_str(&rest[start..]);
                break;
            };
            let name = &after[..end];
            if is_variable_name(name) {
                out.push_str(self.load(name)?);
                substituted += 1;
                rest = &after[end + 1..];
            } else {
                out.push(VAR_DELIMITER);
                rest = after;
            }
        }

        Ok((out, substituted))
    }
}

pub fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
