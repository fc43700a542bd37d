use super::markers;
use super::{PreprocessPass, MEMORY_PRIORITY};
use crate::error::Cmd9Result;
use crate::launcher::Launcher;

pub const PEEK_ESCAPE: &str = "^";
pub const POP_ESCAPE: &str = "^^";

/// Replaces `^^` with the popped top of the active stack and `^` with a peek.
///
/// Occurrences are handled left to right, each exactly once.
pub struct MemoryPass;

impl PreprocessPass for MemoryPass {
    fn name(&self) -> &str {
        "memory"
    }

    fn priority(&self) -> i32 {
        MEMORY_PRIORITY
    }

    fn apply(&self, text: &str, launcher: &mut Launcher) -> Cmd9Result<String> {
        if !text.contains(PEEK_ESCAPE) {
            return Ok(text.to_string());
        }
        markers::map_open(text, |open| {
            let mut out = String::with_capacity(open.len());
            let mut rest = open;
            while let Some(at) = rest.find(PEEK_ESCAPE) {
                out.push_str(&rest[..at]);
                let tail = &rest[at..];
                if let Some(after) = tail.strip_prefix(POP_ESCAPE) {
                    out.push_str(&launcher.memory_mut().active_mut().pop()?.to_string());
                    rest = after;
                } else {
                    out.push_str(&launcher.memory().active().peek()?.to_string());
                    rest = &tail[PEEK_ESCAPE.len()..];
                }
            }
            out.push_str(rest);
            Ok(out)
        })
    }
}
