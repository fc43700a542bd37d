//! Introspection text derived from the package set
//!
//! Only reachable commands are listed: a command shadowed by a same-named
//! command earlier in the search order does not appear.

use crate::command::Command;
use crate::registry::PackageSet;
use std::fmt::Write;

pub fn format_help(name: &str, package: &str, cmd: &Command) -> String {
    let mut out = String::new();
    if cmd.description().is_empty() {
        let _ = writeln!(out, "{name}\n");
    } else {
        let _ = writeln!(out, "{name} - {}\n", cmd.description());
    }
    let usage = if cmd.usage().is_empty() { name } else { cmd.usage() };
    let _ = writeln!(out, "Usage: {usage}");
    let _ = writeln!(out, "Arguments: {}", cmd.arity_label());
    if !cmd.arg_types().is_empty() {
        let types: Vec<String> = cmd.arg_types().iter().map(ToString::to_string).collect();
        let _ = writeln!(out, "Types: {}", types.join(", "));
    }
    let _ = writeln!(out, "Package: {package}");
    out
}

pub fn format_help_list(packages: &PackageSet) -> String {
    let mut out = String::from("cmd9 - available commands\n");
    for pkg in packages.iter() {
        let reachable: Vec<_> = pkg
            .commands()
            .filter(|(name, _)| packages.is_reachable(pkg.name(), name))
            .collect();
        if reachable.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n[{}]", pkg.name());
        for (name, cmd) in reachable {
            let _ = writeln!(out, "  {name:14} {}", cmd.description());
        }
    }
    out.push_str("\nUse 'help NAME' for more information.\n");
    out
}

pub fn format_package_list(packages: &PackageSet) -> String {
    let mut out = String::new();
    for pkg in packages.iter() {
        let reachable = pkg
            .commands()
            .filter(|(name, _)| packages.is_reachable(pkg.name(), name))
            .count();
        let _ = write!(out, "{:12} {reachable} commands", pkg.name());
        if reachable < pkg.len() {
            let _ = write!(out, " ({} shadowed)", pkg.len() - reachable);
        }
        out.push('\n');
    }
    out
}
