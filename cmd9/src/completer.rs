use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::sync::{Arc, PoisonError, RwLock};

/// Completes reachable command names in first position and macro names
/// anywhere. The read loop refreshes both lists before each prompt.
pub struct Cmd9Helper {
    pub commands: Arc<RwLock<Vec<String>>>,
    pub macros: Arc<RwLock<Vec<String>>>,
}

impl Default for Cmd9Helper {
    fn default() -> Self {
        Self::new()
    }
}

impl Cmd9Helper {
    pub fn new() -> Self {
        Self {
            commands: Arc::new(RwLock::new(Vec::new())),
            macros: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Completer for Cmd9Helper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let (start, word) = find_word_start(line_to_cursor);
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let is_first_word = !line_to_cursor[..start].contains(|c: char| !c.is_whitespace());
        let mut completions: Vec<Pair> = Vec::new();

        if is_first_word {
            let commands = self.commands.read().unwrap_or_else(PoisonError::into_inner);
            completions.extend(candidates(&commands, word));
        }
        let macros = self.macros.read().unwrap_or_else(PoisonError::into_inner);
        completions.extend(candidates(&macros, word));

        completions.sort_by(|a, b| a.replacement.cmp(&b.replacement));
        completions.dedup_by(|a, b| a.replacement == b.replacement);
        Ok((start, completions))
    }
}

fn candidates<'a>(names: &'a [String], word: &'a str) -> impl Iterator<Item = Pair> + 'a {
    names
        .iter()
        .filter(move |name| name.starts_with(word))
        .map(|name| Pair {
            display: name.clone(),
            replacement: name.clone(),
        })
}

fn find_word_start(line: &str) -> (usize, &str) {
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        if c.is_whitespace() || c == '\'' || c == '"' {
            break;
        }
        start = i;
    }
    (start, &line[start..])
}

impl Hinter for Cmd9Helper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for Cmd9Helper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Borrowed(hint)
    }
}

impl Validator for Cmd9Helper {}

impl Helper for Cmd9Helper {}
