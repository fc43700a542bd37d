//! Error types for cmd9

use crate::value::ArgType;
use thiserror::Error;

/// Result type alias for cmd9 operations
pub type Cmd9Result<T> = Result<T, Cmd9Error>;

/// Error types raised by the interpreter engine and by command bodies
#[derive(Error, Debug)]
pub enum Cmd9Error {
    /// No package in the search order defines the name
    #[error("unrecognized command: {0}")]
    UnrecognizedCommand(String),

    #[error("{command}: too few arguments (expected at least {min}, got {got})")]
    TooFewArguments {
        command: String,
        min: usize,
        got: usize,
    },

    #[error("{command}: too many arguments (expected at most {max}, got {got})")]
    TooManyArguments {
        command: String,
        max: usize,
        got: usize,
    },

    /// A declared positional type could not be produced from the raw text
    #[error("{command}: argument {position} ('{value}') is not a valid {expected}")]
    ArgumentTranslation {
        command: String,
        position: usize,
        value: String,
        expected: ArgType,
    },

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// Enter/exit misuse or an attempt to cross a temp-scope boundary
    #[error("scope discipline violated: {0}")]
    ScopeDiscipline(String),

    #[error("memory stack is empty")]
    MemoryEmpty,

    #[error("stack frame error: {0}")]
    StackFrameCritical(String),

    /// Explicit abort, or a domain error raised by a command package
    #[error("{0}")]
    UserRaised(String),

    #[error("unexpected failure in '{command}': {message}")]
    CriticalUnexpected { command: String, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    /// A command definition that breaks the arity invariant
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Cmd9Error {
    pub fn raised(message: impl Into<String>) -> Self {
        Self::UserRaised(message.into())
    }

    pub fn scope(message: impl Into<String>) -> Self {
        Self::ScopeDiscipline(message.into())
    }

    /// Stable short name of the error class, used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnrecognizedCommand(_) => "unrecognized",
            Self::TooFewArguments { .. } | Self::TooManyArguments { .. } => "arity",
            Self::ArgumentTranslation { .. } => "argument",
            Self::UndefinedVariable(_) => "variable",
            Self::ScopeDiscipline(_) => "scope",
            Self::MemoryEmpty => "memory",
            Self::StackFrameCritical(_) => "frame",
            Self::UserRaised(_) => "raised",
            Self::CriticalUnexpected { .. } => "critical",
            Self::Parse(_) => "parse",
            Self::InvalidDefinition(_) => "definition",
            Self::Io(_) => "io",
        }
    }

    #[must_use]
    pub fn is_arity(&self) -> bool {
        matches!(self, Self::TooFewArguments { .. } | Self::TooManyArguments { .. })
    }
}
