use super::markers::{self, SUPPRESS};
use super::{PreprocessPass, BUILTIN_PRIORITY};
use crate::error::Cmd9Result;
use crate::launcher::Launcher;

/// Definition-forming command names; no user macro may rewrite them.
pub const RESERVED_NAMES: &[&str] = &["#define", "#call", "#action", "#undef"];

pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Always-first pass.
///
/// Wraps reserved names in an ignore span and turns `#!NAME` into an ignore
/// span around the longest macro name that follows the marker. A `#!` that
/// precedes no macro name is copied through.
pub struct BuiltinPass;

impl BuiltinPass {
    pub const NAME: &'static str = "builtin";
}

impl PreprocessPass for BuiltinPass {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> i32 {
        BUILTIN_PRIORITY
    }

    fn apply(&self, text: &str, launcher: &mut Launcher) -> Cmd9Result<String> {
        let names = launcher.macro_names_longest_first();
        markers::map_open(text, |open| Ok(mask(open, &names)))
    }
}

fn mask(text: &str, macro_names: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    'scan: while let Some(c) = rest.chars().next() {
        for reserved in RESERVED_NAMES {
            if rest.starts_with(reserved) {
                out.push_str(&markers::ignore(reserved));
                rest = &rest[reserved.len()..];
                continue 'scan;
            }
        }
        if let Some(after) = rest.strip_prefix(SUPPRESS) {
            if let Some(name) = macro_names.iter().find(|n| after.starts_with(n.as_str())) {
                out.push_str(&markers::ignore(name));
                rest = &after[name.len()..];
            } else {
                out.push_str(SUPPRESS);
                rest = after;
            }
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}
