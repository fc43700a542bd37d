use super::markers::{self, IGNORE_END, IGNORE_START, SUPPRESS};
use super::{PreprocessPass, MACRO_PRIORITY};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::launcher::Launcher;
use crate::scope::VAR_DELIMITER;
use std::fmt;
use std::sync::Arc;

pub type NativeMacro = Arc<dyn Fn(&mut Launcher) -> Cmd9Result<String> + Send + Sync>;

/// Zero-argument text producer bound to a macro name.
#[derive(Clone)]
pub enum Macro {
    /// Fixed substitution text.
    Text(String),
    /// Run a command on an isolated stack and substitute its pushed result.
    Call { command: String, args: Vec<String> },
    /// Run a command for effect; substitutes nothing.
    Action { command: String, args: Vec<String> },
    Native(NativeMacro),
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Call { command, args } => f
                .debug_struct("Call")
                .field("command", command)
                .field("args", args)
                .finish(),
            Self::Action { command, args } => f
                .debug_struct("Action")
                .field("command", command)
                .field("args", args)
                .finish(),
            Self::Native(_) => f.write_str("Native(..)"),
        }
    }
}

impl Macro {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn native<F>(producer: F) -> Self
    where
        F: Fn(&mut Launcher) -> Cmd9Result<String> + Send + Sync + 'static,
    {
        Self::Native(Arc::new(producer))
    }

    /// Produce the substitution text.
    ///
    /// Commands run through [`Launcher::execute`] directly, so the produced
    /// text is never fed back through the pipeline.
    pub fn produce(&self, name: &str, launcher: &mut Launcher) -> Cmd9Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Call { command, args } => launcher
                .isolated(|l| {
                    l.execute(command, args)?;
                    l.memory_mut().active_mut().pop()
                })
                .map(|item| item.to_string())
                .map_err(|e| match e {
                    Cmd9Error::MemoryEmpty => {
                        Cmd9Error::raised(format!("macro '{name}' produced no value"))
                    }
                    other => other,
                }),
            Self::Action { command, args } => {
                launcher.execute(command, args)?;
                Ok(String::new())
            }
            Self::Native(producer) => producer(launcher),
        }
    }

    /// One-line rendering for listings.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => format!("text {text:?}"),
            Self::Call { command, args } => format!("call {}", join(command, args)),
            Self::Action { command, args } => format!("action {}", join(command, args)),
            Self::Native(_) => "native".to_string(),
        }
    }
}

fn join(command: &str, args: &[String]) -> String {
    std::iter::once(command.to_string())
        .chain(args.iter().map(|a| crate::lexer::quote(a)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject names that could never match or that collide with markers.
pub fn validate_macro_name(name: &str) -> Cmd9Result<()> {
    let invalid = |why: &str| Err(Cmd9Error::InvalidDefinition(format!("macro name '{name}' {why}")));
    if name.is_empty() || name.contains(char::is_whitespace) {
        return invalid("must be a single non-empty word");
    }
    if name.starts_with('#') {
        return invalid("uses the reserved '#' prefix");
    }
    if [IGNORE_START, IGNORE_END, SUPPRESS]
        .iter()
        .any(|marker| name.contains(marker))
    {
        return invalid("contains a preprocessor marker");
    }
    if name.contains(VAR_DELIMITER) {
        return invalid("contains the variable delimiter");
    }
    Ok(())
}

/// User macro expansion.
///
/// Scans left to right; at each position the longest defined name that
/// matches is replaced by its producer's output and scanning resumes after it.
pub struct MacroPass;

impl PreprocessPass for MacroPass {
    fn name(&self) -> &str {
        "macros"
    }

    fn priority(&self) -> i32 {
        MACRO_PRIORITY
    }

    fn apply(&self, text: &str, launcher: &mut Launcher) -> Cmd9Result<String> {
        if launcher.macros().is_empty() {
            return Ok(text.to_string());
        }
        let table: Vec<(String, Arc<Macro>)> = launcher
            .macro_names_longest_first()
            .into_iter()
            .filter_map(|name| {
                let m = launcher.macros().get(&name).cloned()?;
                Some((name, m))
            })
            .collect();

        markers::map_open(text, |open| expand(open, &table, launcher))
    }
}

fn expand(text: &str, table: &[(String, Arc<Macro>)], launcher: &mut Launcher) -> Cmd9Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        if let Some((name, m)) = table.iter().find(|(name, _)| rest.starts_with(name.as_str())) {
            tracing::trace!(name = %name, "Expanding macro");
            out.push_str(&m.produce(name, launcher)?);
            rest = &rest[name.len()..];
        } else {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    Ok(out)
}
