use crate::{Cmd9Config, ConfigError};
use regex::Regex;
use std::path::PathBuf;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/cmd9/cmd9.yaml"));
        }
        search_paths.push(PathBuf::from("./cmd9.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/cmd9/cmd9.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<Cmd9Config, ConfigError> {
        let mut config = Cmd9Config::default();

        if let Ok(env_path) = std::env::var("CMD9_CONFIG") {
            config = self.read_file(&PathBuf::from(env_path))?;
        } else if let Some(ref explicit) = self.explicit_file {
            config = self.read_file(explicit)?;
        } else {
            for path in &self.search_paths {
                if path.exists() {
                    if let Ok(content) = std::fs::read_to_string(path) {
                        tracing::debug!(path = ?path, "Merging config file");
                        config = self.merge_yaml(&config, &content)?;
                    }
                }
            }
        }

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn read_file(&self, path: &PathBuf) -> Result<Cmd9Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        self.parse_yaml(&content)
    }

    fn parse_yaml(&self, content: &str) -> Result<Cmd9Config, ConfigError> {
        let expanded = self.expand_env_vars(content);
        Ok(serde_yaml::from_str(&expanded)?)
    }

    fn merge_yaml(&self, base: &Cmd9Config, content: &str) -> Result<Cmd9Config, ConfigError> {
        let overlay = self.parse_yaml(content)?;
        Ok(self.merge_configs(base, &overlay))
    }

    fn merge_configs(&self, base: &Cmd9Config, overlay: &Cmd9Config) -> Cmd9Config {
        let defaults = Cmd9Config::default();
        let mut result = base.clone();

        if overlay.interpreter != defaults.interpreter {
            result.interpreter = overlay.interpreter.clone();
        }
        if overlay.shell.prompt != defaults.shell.prompt {
            result.shell.prompt = overlay.shell.prompt.clone();
        }
        if overlay.shell.history != defaults.shell.history {
            result.shell.history = overlay.shell.history.clone();
        }
        if !overlay.packages.preload.is_empty() {
            result.packages.preload = overlay.packages.preload.clone();
        }
        if !overlay.packages.script_dirs.is_empty() {
            result.packages.script_dirs = overlay.packages.script_dirs.clone();
        }
        if !overlay.packages.startup.is_empty() {
            result.packages.startup = overlay.packages.startup.clone();
        }
        if overlay.logging != defaults.logging {
            result.logging = overlay.logging.clone();
        }

        result
    }

    fn expand_env_vars(&self, content: &str) -> String {
        let Ok(re) = Regex::new(r"\$\{([^}]+)\}") else {
            return content.to_string();
        };
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string()
    }

    fn apply_env_overrides(&self, config: &mut Cmd9Config) -> Result<(), ConfigError> {
        if let Ok(level) = std::env::var("CMD9_LOG_LEVEL") {
            if let Ok(l) = serde_yaml::from_str(&level) {
                config.logging.level = l;
            }
        }
        if let Ok(value) = std::env::var("CMD9_FEEDBACK") {
            config.interpreter.feedback = parse_flag("CMD9_FEEDBACK", &value)?;
        }
        if let Ok(value) = std::env::var("CMD9_ERROR_FEEDBACK") {
            config.interpreter.error_feedback = parse_flag("CMD9_ERROR_FEEDBACK", &value)?;
        }
        if let Ok(prompt) = std::env::var("CMD9_PROMPT") {
            if !prompt.is_empty() {
                config.shell.prompt = prompt;
            }
        }
        if let Ok(dir) = std::env::var("CMD9_SCRIPT_DIR") {
            if !dir.is_empty() {
                config.packages.script_dirs.insert(0, dir);
            }
        }
        if let Ok(limit) = std::env::var("CMD9_INTERPOLATION_LIMIT") {
            let parsed = limit.parse::<usize>().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "CMD9_INTERPOLATION_LIMIT must be a non-negative integer, got '{limit}'"
                ))
            })?;
            config.interpreter.interpolation_limit = Some(parsed);
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue(format!(
            "{name} must be a boolean, got '{value}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_vars_works() {
        std::env::set_var("CMD9_TEST_VAR_123", "hello");
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("value: ${CMD9_TEST_VAR_123}");
        assert_eq!(result, "value: hello");
        std::env::remove_var("CMD9_TEST_VAR_123");
    }

    #[test]
    fn missing_env_var_becomes_empty() {
        let loader = ConfigLoader::new();
        let result = loader.expand_env_vars("value: ${NONEXISTENT_VAR_XYZ}");
        assert_eq!(result, "value: ");
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmd9.yaml");
        std::fs::write(&path, "interpreter:\n  max_call_depth: 12\n").unwrap();

        let config = ConfigLoader::new()
            .with_file(path.to_str().unwrap())
            .load()
            .unwrap();
        assert_eq!(config.interpreter.max_call_depth, 12);
        assert!(config.interpreter.feedback);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = ConfigLoader::new()
            .with_file("/nonexistent/cmd9.yaml")
            .load();
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn search_paths_merge_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.yaml");
        let second = dir.path().join("second.yaml");
        std::fs::write(&first, "shell:\n  prompt: \"a> \"\npackages:\n  preload: [math]\n").unwrap();
        std::fs::write(&second, "shell:\n  prompt: \"b> \"\n").unwrap();

        let config = ConfigLoader::new()
            .with_search_paths(vec![first, second, dir.path().join("absent.yaml")])
            .load()
            .unwrap();
        assert_eq!(config.shell.prompt, "b> ");
        assert_eq!(config.packages.preload, vec!["math".to_string()]);
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("X", "On").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
