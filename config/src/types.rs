use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cmd9Config {
    pub interpreter: InterpreterConfig,
    pub shell: ShellConfig,
    pub packages: PackagesConfig,
    pub logging: LoggingConfig,
}

/// Toggles and limits owned by one interpreter instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Emit informational command feedback.
    pub feedback: bool,
    /// Emit diagnostics for failed commands.
    pub error_feedback: bool,
    /// Stop `$name$` substitution after this many matches per text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolation_limit: Option<usize>,
    /// Maximum nesting of re-entrant dispatch.
    pub max_call_depth: usize,
    /// Remove ignore markers once every preprocessing pass has run.
    pub strip_markers: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            feedback: true,
            error_feedback: true,
            interpolation_limit: None,
            max_call_depth: 256,
            strip_markers: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub prompt: String,
    pub history: HistoryConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: "cmd9[{depth}]{mode}> ".to_string(),
            history: HistoryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub file: String,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "~/.cmd9_history".to_string(),
            max_entries: 10000,
        }
    }
}

impl HistoryConfig {
    /// History file path with `~` and `$VAR` expanded.
    pub fn resolved_file(&self) -> String {
        shellexpand::full(&self.file)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| self.file.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Compiled-in registry packages instantiated at startup.
    pub preload: Vec<String>,
    /// Directories scanned for script packages.
    pub script_dirs: Vec<String>,
    /// Scripts sourced once the launcher is ready.
    pub startup: Vec<String>,
}

impl PackagesConfig {
    pub fn resolved_script_dirs(&self) -> Vec<String> {
        self.script_dirs
            .iter()
            .map(|dir| shellexpand::tilde(dir).into_owned())
            .collect()
    }

    pub fn resolved_startup(&self) -> Vec<String> {
        self.startup
            .iter()
            .map(|script| shellexpand::tilde(script).into_owned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Pretty,
            filter: String::new(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive for `EnvFilter`; an explicit filter wins over the level.
    pub fn directive(&self) -> String {
        if self.filter.is_empty() {
            self.level.as_str().to_string()
        } else {
            self.filter.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}
