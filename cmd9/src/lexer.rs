//! Tokenizer for the cmd9 line protocol
//!
//! A line is `name arg1 arg2 …`. Arguments are separated by unquoted,
//! unescaped spaces; `'…'` and `"…"` spans keep spaces and the other quote
//! character literal. An unterminated quote runs to the end of the line.
//! Backslash escapes apply outside quotes only, so `"C:\dir\"` keeps both
//! backslashes.

use crate::error::{Cmd9Error, Cmd9Result};
use chumsky::prelude::*;

/// Characters that a backslash makes literal.
const ESCAPABLE: &str = " \t'\"\\";

fn escaped() -> impl Parser<char, char, Error = Simple<char>> + Clone {
    just('\\').ignore_then(one_of(ESCAPABLE))
}

fn quoted(quote: char) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    just(quote)
        .ignore_then(filter(move |c: &char| *c != quote).repeated())
        .then_ignore(just(quote).or_not())
        .collect::<String>()
}

pub fn lexer() -> impl Parser<char, Vec<String>, Error = Simple<char>> {
    let ws = filter(|c: &char| *c == ' ' || *c == '\t').repeated();

    let bare = escaped()
        .or(filter(|c: &char| !matches!(c, ' ' | '\t' | '\'' | '"')))
        .repeated()
        .at_least(1)
        .collect::<String>();

    // Adjacent bare and quoted segments form one argument: a"b c"d -> ab cd
    let word = choice((quoted('"'), quoted('\''), bare))
        .repeated()
        .at_least(1)
        .map(|segments: Vec<String>| segments.concat());

    ws.clone()
        .ignore_then(word.then_ignore(ws).repeated())
        .then_ignore(end())
}

/// Split a raw line into all of its words.
pub fn split(line: &str) -> Cmd9Result<Vec<String>> {
    let line = line.trim_end_matches(['\r', '\n']);
    lexer().parse(line).map_err(|errs| {
        let msg = errs
            .into_iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Cmd9Error::Parse(msg)
    })
}

/// Split a raw line into `(command_name, argv)`.
///
/// Empty input yields an empty name and no arguments.
pub fn tokenize(line: &str) -> Cmd9Result<(String, Vec<String>)> {
    let mut words = split(line)?.into_iter();
    let name = words.next().unwrap_or_default();
    Ok((name, words.collect()))
}

/// Quote `word` so that [`split`] returns it unchanged.
///
/// Single quotes are preferred, double quotes cover words containing `'`,
/// and words with both fall back to backslash escapes.
pub fn quote(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    if !word.contains(|c: char| ESCAPABLE.contains(c)) {
        return word.to_string();
    }
    if !word.contains('\'') {
        return format!("'{word}'");
    }
    if !word.contains('"') {
        return format!("\"{word}\"");
    }
    let mut out = String::with_capacity(word.len() * 2);
    for c in word.chars() {
        if ESCAPABLE.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &str) -> Vec<String> {
        split(input).unwrap()
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(words("echo hello"), vec!["echo", "hello"]);
    }

    #[test]
    fn test_double_quoted() {
        assert_eq!(words("a \"b c\" d"), vec!["a", "b c", "d"]);
    }

    #[test]
    fn test_single_quoted_keeps_double_quote() {
        assert_eq!(words("say 'he said \"hi\"'"), vec!["say", "he said \"hi\""]);
    }

    #[test]
    fn test_unterminated_quote_runs_to_end() {
        assert_eq!(words("a \"b c d"), vec!["a", "b c d"]);
        assert_eq!(words("x 'open  spaces "), vec!["x", "open  spaces "]);
    }

    #[test]
    fn test_empty_input() {
        assert!(words("").is_empty());
        assert!(words("   \t ").is_empty());
        let (name, args) = tokenize("").unwrap();
        assert_eq!(name, "");
        assert!(args.is_empty());
    }

    #[test]
    fn test_consecutive_spaces() {
        assert_eq!(words("  a    b  "), vec!["a", "b"]);
    }

    #[test]
    fn test_explicit_empty_argument() {
        assert_eq!(words("set x \"\""), vec!["set", "x", ""]);
    }

    #[test]
    fn test_escaped_space() {
        assert_eq!(words("open my\\ file"), vec!["open", "my file"]);
        assert_eq!(words("path c:\\dir"), vec!["path", "c:\\dir"]);
    }

    #[test]
    fn test_backslash_literal_inside_quotes() {
        assert_eq!(
            words(r#"load "C:\scripts\" next"#),
            vec!["load", r"C:\scripts\", "next"]
        );
        assert_eq!(words(r"x 'a\'"), vec!["x", r"a\"]);
        assert_eq!(words(r"x a\'b"), vec!["x", "a'b"]);
    }

    #[test]
    fn test_adjacent_segments_merge() {
        assert_eq!(words("key=\"a b\"c"), vec!["key=a bc"]);
    }

    #[test]
    fn test_tokenize_splits_name() {
        let (name, args) = tokenize("repeat 3 print \"hi there\"").unwrap();
        assert_eq!(name, "repeat");
        assert_eq!(args, vec!["3", "print", "hi there"]);
    }

    #[test]
    fn test_quote_is_inverse_of_split() {
        for word in [
            "plain",
            "two words",
            "",
            "q\"uote",
            "back\\slash",
            "it's",
            "both ' and \" quotes\\",
        ] {
            let line = format!("cmd {}", quote(word));
            assert_eq!(words(&line), vec!["cmd".to_string(), word.to_string()]);
        }
    }
}
