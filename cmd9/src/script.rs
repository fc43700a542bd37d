//! Script-backed commands and directory discovery

use crate::command::{Command, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::launcher::COMMENT_PREFIX;
use crate::registry::PackageLoader;
use std::path::{Path, PathBuf};

pub const SCRIPT_EXTENSION: &str = "c9";

/// A command that replays `body` with its arguments bound as `1`, `2`, …
pub fn script_command(body: String, description: String, usage: String) -> Command {
    Command::new(move |args, ctx| {
        ctx.launcher.run_script_command(&body, &args.rest(0))?;
        Ok(None)
    })
    .describe(description, usage)
}

/// The leading `//` comment of a script, if any.
fn summary(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.strip_prefix(COMMENT_PREFIX))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn stem(path: &Path) -> Cmd9Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| Cmd9Error::raised(format!("cannot name a command after '{}'", path.display())))
}

/// Read one script file; returns the command name (`name` or the file stem)
/// and the command.
pub fn load_script(path: &Path, name: Option<&str>) -> Cmd9Result<(String, Command)> {
    let body = std::fs::read_to_string(path)?;
    let name = match name {
        Some(name) => name.to_string(),
        None => stem(path)?,
    };
    let description = summary(&body).unwrap_or_else(|| format!("script {}", path.display()));
    tracing::debug!(name = %name, path = %path.display(), "Loaded script");
    Ok((name.clone(), script_command(body, description, format!("{name} [ARG]..."))))
}

/// Script files in `dir`, sorted by path.
pub fn script_files(dir: &Path) -> Cmd9Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenate every script in `dir` into a single command.
pub fn compile_dir(dir: &Path, name: &str) -> Cmd9Result<Command> {
    let files = script_files(dir)?;
    if files.is_empty() {
        return Err(Cmd9Error::raised(format!(
            "no .{SCRIPT_EXTENSION} scripts in '{}'",
            dir.display()
        )));
    }
    let mut body = String::new();
    for file in &files {
        body.push_str(&std::fs::read_to_string(file)?);
        if !body.ends_with('\n') {
            body.push('\n');
        }
    }
    tracing::debug!(name, dir = %dir.display(), scripts = files.len(), "Compiled script directory");
    Ok(script_command(
        body,
        format!("{} scripts compiled from {}", files.len(), dir.display()),
        format!("{name} [ARG]..."),
    ))
}

/// Discovers a directory of `.c9` scripts as one package named after the
/// directory, one command per script.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptPackageLoader;

impl PackageLoader for ScriptPackageLoader {
    fn discover(&self, directory: &Path) -> Cmd9Result<Vec<Package>> {
        let files = script_files(directory)?;
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let package_name = directory
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("scripts");
        let mut package = Package::new(package_name);
        for file in files {
            let (name, command) = load_script(&file, None)?;
            package.register(name, command)?;
        }
        Ok(vec![package])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_summary_from_leading_comment() {
        assert_eq!(summary("// greets people\nprint hi"), Some("greets people".into()));
        assert_eq!(summary("\n\n//   \nprint"), None);
        assert_eq!(summary("print hi"), None);
    }

    #[test]
    fn test_load_script_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("greet.c9");
        fs::write(&path, "// say hello\nprint hello $1$\n").unwrap();

        let (name, command) = load_script(&path, None).unwrap();
        assert_eq!(name, "greet");
        assert_eq!(command.description(), "say hello");

        let (name, _) = load_script(&path, Some("hi")).unwrap();
        assert_eq!(name, "hi");
    }

    #[test]
    fn test_script_files_filter_and_sort() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.c9"), "").unwrap();
        fs::write(dir.path().join("a.c9"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let files = script_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.c9", "b.c9"]);
    }

    #[test]
    fn test_compile_empty_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(compile_dir(dir.path(), "all").is_err());
    }

    #[test]
    fn test_loader_names_package_after_dir() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("tools");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("one.c9"), "print 1").unwrap();
        fs::write(dir.join("two.c9"), "print 2").unwrap();

        let packages = ScriptPackageLoader.discover(&dir).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name(), "tools");
        assert!(packages[0].contains("one"));
        assert!(packages[0].contains("two"));
    }
}
