use super::markers;
use super::{PreprocessPass, VARIABLE_PRIORITY};
use crate::error::Cmd9Result;
use crate::launcher::Launcher;

/// `$name$` interpolation, honoring the launcher's interpolation limit.
pub struct VariablePass;

impl PreprocessPass for VariablePass {
    fn name(&self) -> &str {
        "variables"
    }

    fn priority(&self) -> i32 {
        VARIABLE_PRIORITY
    }

    fn apply(&self, text: &str, launcher: &mut Launcher) -> Cmd9Result<String> {
        let mut remaining = launcher.interpolation_limit();
        let scopes = launcher.scopes();
        markers::map_open(text, |open| {
            let (out, used) = scopes.interpolate_counted(open, remaining)?;
            remaining = remaining.map(|left| left.saturating_sub(used));
            Ok(out)
        })
    }
}
