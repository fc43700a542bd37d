//! Typed arguments and memory values

use crate::error::{Cmd9Error, Cmd9Result};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Declared type of a positional command argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Bool,
    Int,
    Float,
    Char,
    Text,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "boolean",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Char => "character",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

impl ArgType {
    /// Parse a type name as written in scripts (`int`, `bool`, …).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(Self::Bool),
            "int" | "integer" => Some(Self::Int),
            "float" | "number" => Some(Self::Float),
            "char" | "character" => Some(Self::Char),
            "text" | "string" | "str" => Some(Self::Text),
            _ => None,
        }
    }

    /// Convert raw argument text; `None` when the text is not of this type.
    pub fn coerce(self, raw: &str) -> Option<Arg> {
        match self {
            Self::Text => Some(Arg::Text(raw.to_string())),
            Self::Bool => parse_bool(raw).map(Arg::Bool),
            Self::Int => raw.trim().parse::<i64>().ok().map(Arg::Int),
            Self::Float => raw.trim().parse::<f64>().ok().map(Arg::Float),
            Self::Char => {
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Arg::Char(c)),
                    _ => None,
                }
            }
        }
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// One argument after positional type coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Text(String),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Coerced argument list handed to a command body.
#[derive(Debug, Clone)]
pub struct Args {
    command: String,
    items: Vec<Arg>,
}

impl Args {
    pub fn new(command: impl Into<String>, items: Vec<Arg>) -> Self {
        Self {
            command: command.into(),
            items,
        }
    }

    /// Name the command was invoked under.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.items.iter()
    }

    fn require(&self, index: usize) -> Cmd9Result<&Arg> {
        self.items.get(index).ok_or_else(|| Cmd9Error::CriticalUnexpected {
            command: self.command.clone(),
            message: format!("argument {index} was not supplied"),
        })
    }

    fn mismatch(&self, index: usize, arg: &Arg, expected: ArgType) -> Cmd9Error {
        Cmd9Error::ArgumentTranslation {
            command: self.command.clone(),
            position: index,
            value: arg.to_string(),
            expected,
        }
    }

    pub fn text(&self, index: usize) -> Cmd9Result<&str> {
        match self.require(index)? {
            Arg::Text(s) => Ok(s),
            other => Err(self.mismatch(index, other, ArgType::Text)),
        }
    }

    pub fn int(&self, index: usize) -> Cmd9Result<i64> {
        match self.require(index)? {
            Arg::Int(i) => Ok(*i),
            other => Err(self.mismatch(index, other, ArgType::Int)),
        }
    }

    pub fn float(&self, index: usize) -> Cmd9Result<f64> {
        match self.require(index)? {
            Arg::Float(x) => Ok(*x),
            Arg::Int(i) => Ok(*i as f64),
            other => Err(self.mismatch(index, other, ArgType::Float)),
        }
    }

    pub fn bool(&self, index: usize) -> Cmd9Result<bool> {
        match self.require(index)? {
            Arg::Bool(b) => Ok(*b),
            other => Err(self.mismatch(index, other, ArgType::Bool)),
        }
    }

    pub fn char(&self, index: usize) -> Cmd9Result<char> {
        match self.require(index)? {
            Arg::Char(c) => Ok(*c),
            other => Err(self.mismatch(index, other, ArgType::Char)),
        }
    }

    /// Optional boolean at `index`; absent means `None`.
    pub fn opt_bool(&self, index: usize) -> Cmd9Result<Option<bool>> {
        if index < self.items.len() {
            self.bool(index).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Text form of every argument from `start` on.
    pub fn rest(&self, start: usize) -> Vec<String> {
        self.items
            .iter()
            .skip(start)
            .map(ToString::to_string)
            .collect()
    }

    /// Arguments from `start` on joined by single spaces.
    pub fn joined(&self, start: usize) -> String {
        self.rest(start).join(" ")
    }

    /// Split off `(command, args)` for commands that forward to another command.
    pub fn forward(&self, start: usize) -> Cmd9Result<(String, Vec<String>)> {
        let mut rest = self.rest(start).into_iter();
        let name = rest.next().ok_or_else(|| Cmd9Error::CriticalUnexpected {
            command: self.command.clone(),
            message: "no command to forward to".to_string(),
        })?;
        Ok((name, rest.collect()))
    }
}

/// Host value carried through the memory stack without interpretation.
#[derive(Clone)]
pub struct Opaque {
    type_name: String,
    value: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A value produced by a command and stored on a memory stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MemoryItem {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Seq(Vec<String>),
    #[serde(serialize_with = "serialize_opaque")]
    Opaque(Opaque),
}

fn serialize_opaque<S: Serializer>(value: &Opaque, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.type_name())
}

impl MemoryItem {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Seq(_) => "seq",
            Self::Opaque(o) => o.type_name(),
        }
    }

    /// Truth value for conditionals; only booleans and their text forms qualify.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Text(s) => parse_bool(s),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Build an item of `kind` from raw text.
    pub fn from_typed(kind: ArgType, raw: &str) -> Option<Self> {
        kind.coerce(raw).map(|arg| match arg {
            Arg::Bool(b) => Self::Bool(b),
            Arg::Int(i) => Self::Int(i),
            Arg::Float(x) => Self::Float(x),
            Arg::Char(c) => Self::Text(c.to_string()),
            Arg::Text(s) => Self::Text(s),
        })
    }
}

impl fmt::Display for MemoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Seq(items) => f.write_str(&items.join(" ")),
            Self::Opaque(o) => write!(f, "<{}>", o.type_name()),
        }
    }
}

impl From<bool> for MemoryItem {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MemoryItem {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MemoryItem {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for MemoryItem {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MemoryItem {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for MemoryItem {
    fn from(value: Vec<String>) -> Self {
        Self::Seq(value)
    }
}
