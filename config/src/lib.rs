//! cmd9 Configuration System
//!
//! Provides YAML-based configuration for the cmd9 interpreter and its shell.
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/cmd9/cmd9.yaml` (system-wide)
//! 3. `~/.config/cmd9/cmd9.yaml` (user)
//! 4. `./cmd9.yaml` (project-local)
//! 5. `CMD9_CONFIG=/path/to/config.yaml` (explicit)
//! 6. Environment variables (highest priority)
//!
//! # Example Configuration
//!
//! ```yaml
//! interpreter:
//!   feedback: true
//!   interpolation_limit: 8
//!
//! shell:
//!   prompt: "cmd9[{depth}]{mode}> "
//!
//! packages:
//!   script_dirs:
//!     - "~/.cmd9/scripts"
//!
//! logging:
//!   level: debug
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<Cmd9Config, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<Cmd9Config, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Cmd9Config::default();
        assert!(config.interpreter.feedback);
        assert!(config.interpreter.error_feedback);
        assert_eq!(config.interpreter.max_call_depth, 256);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = r#"
interpreter:
  feedback: false
"#;
        let config: Cmd9Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.interpreter.feedback);
        assert!(config.interpreter.error_feedback); // default
        assert_eq!(config.shell.prompt, "cmd9[{depth}]{mode}> ");
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
interpreter:
  feedback: true
  error_feedback: false
  interpolation_limit: 3
  max_call_depth: 64
  strip_markers: false

shell:
  prompt: "> "
  history:
    enabled: false
    file: "/tmp/cmd9_history"
    max_entries: 50

packages:
  preload: [strings]
  script_dirs: ["/opt/cmd9/scripts"]
  startup: ["init.c9"]

logging:
  level: debug
  filter: "cmd9=trace"
"#;
        let config: Cmd9Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.interpreter.interpolation_limit, Some(3));
        assert_eq!(config.interpreter.max_call_depth, 64);
        assert!(!config.interpreter.strip_markers);
        assert!(!config.shell.history.enabled);
        assert_eq!(config.packages.preload, vec!["strings".to_string()]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.directive(), "cmd9=trace");
    }
}
