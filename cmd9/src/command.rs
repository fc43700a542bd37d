//! Command and Package: the extension contract
//!
//! A [`Package`] is a named bundle of [`Command`]s. Third-party packages
//! build one with [`Package::new`] and [`Package::register`] and hand it to
//! [`Launcher::add_package`](crate::Launcher::add_package), directly or through
//! a [`PackageRegistry`](crate::registry::PackageRegistry) factory.

use crate::error::{Cmd9Error, Cmd9Result};
use crate::launcher::Launcher;
use crate::value::{Arg, ArgType, Args, MemoryItem};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a command body returns: an optional value for the active memory stack.
pub type CommandResult = Cmd9Result<Option<MemoryItem>>;

pub type CommandBody = Arc<dyn Fn(&Args, &mut Context<'_>) -> CommandResult + Send + Sync>;

/// Execution context handed to a command body.
pub struct Context<'a> {
    /// Name of the package the command was resolved from.
    pub package: String,
    pub launcher: &'a mut Launcher,
}

#[derive(Clone)]
pub struct Command {
    min_args: usize,
    max_args: Option<usize>,
    description: String,
    usage: String,
    arg_types: Vec<ArgType>,
    body: CommandBody,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("arg_types", &self.arg_types)
            .finish_non_exhaustive()
    }
}

impl Command {
    /// A command accepting any number of untyped arguments.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Args, &mut Context<'_>) -> CommandResult + Send + Sync + 'static,
    {
        Self {
            min_args: 0,
            max_args: None,
            description: String::new(),
            usage: String::new(),
            arg_types: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Accepted argument count; `None` for no upper bound.
    #[must_use]
    pub fn arity(mut self, min: usize, max: Option<usize>) -> Self {
        self.min_args = min;
        self.max_args = max;
        self
    }

    #[must_use]
    pub fn describe(mut self, description: impl Into<String>, usage: impl Into<String>) -> Self {
        self.description = description.into();
        self.usage = usage.into();
        self
    }

    /// Declared types for leading positions; later positions stay text.
    #[must_use]
    pub fn typed(mut self, types: &[ArgType]) -> Self {
        self.arg_types = types.to_vec();
        self
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    pub fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn arg_types(&self) -> &[ArgType] {
        &self.arg_types
    }

    /// Arity range rendered as `min..max` or `min..`.
    pub fn arity_label(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => max.to_string(),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("{}..", self.min_args),
        }
    }

    pub(crate) fn validate(&self, name: &str) -> Cmd9Result<()> {
        if let Some(max) = self.max_args {
            if max < self.min_args {
                return Err(Cmd9Error::InvalidDefinition(format!(
                    "{name}: max_args {max} is below min_args {}",
                    self.min_args
                )));
            }
        }
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(Cmd9Error::InvalidDefinition(format!(
                "'{name}' is not a valid command name"
            )));
        }
        Ok(())
    }

    pub fn check_arity(&self, name: &str, got: usize) -> Cmd9Result<()> {
        if got < self.min_args {
            return Err(Cmd9Error::TooFewArguments {
                command: name.to_string(),
                min: self.min_args,
                got,
            });
        }
        if let Some(max) = self.max_args {
            if got > max {
                return Err(Cmd9Error::TooManyArguments {
                    command: name.to_string(),
                    max,
                    got,
                });
            }
        }
        Ok(())
    }

    /// Coerce raw argument text by declared position type.
    pub fn translate(&self, name: &str, raw: &[String]) -> Cmd9Result<Args> {
        let items = raw
            .iter()
            .enumerate()
            .map(|(position, value)| {
                let kind = self.arg_types.get(position).copied().unwrap_or(ArgType::Text);
                kind.coerce(value).ok_or_else(|| Cmd9Error::ArgumentTranslation {
                    command: name.to_string(),
                    position,
                    value: value.clone(),
                    expected: kind,
                })
            })
            .collect::<Cmd9Result<Vec<Arg>>>()?;
        Ok(Args::new(name, items))
    }

    pub fn invoke(&self, args: &Args, ctx: &mut Context<'_>) -> CommandResult {
        (self.body)(args, ctx)
    }
}

/// Named, mutable map of command name to [`Command`].
#[derive(Debug, Clone, Default)]
pub struct Package {
    name: String,
    commands: BTreeMap<String, Arc<Command>>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a command, rejecting definitions with `max < min`.
    pub fn register(&mut self, name: impl Into<String>, command: Command) -> Cmd9Result<()> {
        let name = name.into();
        command.validate(&name)?;
        self.commands.insert(name, Arc::new(command));
        Ok(())
    }

    /// Builder form of [`Package::register`].
    pub fn with(mut self, name: impl Into<String>, command: Command) -> Cmd9Result<Self> {
        self.register(name, command)?;
        Ok(self)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<Command>> {
        self.commands.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Command>> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in name order.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &Arc<Command>)> {
        self.commands.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    /// Move every command of `other` into this package, replacing duplicates.
    pub fn absorb(&mut self, other: Package) {
        self.commands.extend(other.commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Command {
        Command::new(|_, _| Ok(None))
    }

    #[test]
    fn test_arity_bounds() {
        let cmd = noop().arity(1, Some(3));
        assert!(matches!(
            cmd.check_arity("c", 0),
            Err(Cmd9Error::TooFewArguments { min: 1, got: 0, .. })
        ));
        for n in 1..=3 {
            assert!(cmd.check_arity("c", n).is_ok());
        }
        assert!(matches!(
            cmd.check_arity("c", 4),
            Err(Cmd9Error::TooManyArguments { max: 3, got: 4, .. })
        ));
    }

    #[test]
    fn test_unbounded_arity() {
        let cmd = noop().arity(2, None);
        assert!(cmd.check_arity("c", 1).is_err());
        assert!(cmd.check_arity("c", 200).is_ok());
        assert_eq!(cmd.arity_label(), "2..");
    }

    #[test]
    fn test_register_rejects_inverted_arity() {
        let mut pkg = Package::new("p");
        let result = pkg.register("bad", noop().arity(3, Some(1)));
        assert!(matches!(result, Err(Cmd9Error::InvalidDefinition(_))));
        assert!(pkg.is_empty());
    }

    #[test]
    fn test_register_rejects_blank_name() {
        let mut pkg = Package::new("p");
        assert!(pkg.register("two words", noop()).is_err());
        assert!(pkg.register("", noop()).is_err());
    }

    #[test]
    fn test_translate_declared_positions() {
        let cmd = noop().typed(&[ArgType::Int, ArgType::Bool]);
        let args = cmd
            .translate("t", &["7".into(), "on".into(), "rest".into()])
            .unwrap();
        assert_eq!(args.int(0).unwrap(), 7);
        assert!(args.bool(1).unwrap());
        assert_eq!(args.text(2).unwrap(), "rest");
    }

    #[test]
    fn test_translate_failure_reports_position() {
        let cmd = noop().typed(&[ArgType::Text, ArgType::Float]);
        match cmd.translate("t", &["a".into(), "nope".into()]) {
            Err(Cmd9Error::ArgumentTranslation { position, value, expected, .. }) => {
                assert_eq!(position, 1);
                assert_eq!(value, "nope");
                assert_eq!(expected, ArgType::Float);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_package_commands_sorted() {
        let pkg = Package::new("p")
            .with("zeta", noop())
            .and_then(|p| p.with("alpha", noop()))
            .unwrap();
        let names: Vec<_> = pkg.commands().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
