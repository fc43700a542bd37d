//! Ignore spans and the suppress marker

use crate::error::Cmd9Result;

pub const IGNORE_START: &str = "#[";
pub const IGNORE_END: &str = "]#";
pub const SUPPRESS: &str = "#!";

/// A piece of text either open to substitution or inside an ignore span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Open(&'a str),
    /// Includes its markers; an unterminated span runs to the end of the text.
    Ignored(&'a str),
}

pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(IGNORE_START) {
        if start > 0 {
            out.push(Segment::Open(&rest[..start]));
        }
        let body = &rest[start + IGNORE_START.len()..];
        match body.find(IGNORE_END) {
            Some(end) => {
                let stop = start + IGNORE_START.len() + end + IGNORE_END.len();
                out.push(Segment::Ignored(&rest[start..stop]));
                rest = &rest[stop..];
            }
            None => {
                out.push(Segment::Ignored(&rest[start..]));
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        out.push(Segment::Open(rest));
    }
    out
}

/// Rewrite the open segments of `text`, copying ignore spans untouched.
pub fn map_open<F>(text: &str, mut rewrite: F) -> Cmd9Result<String>
where
    F: FnMut(&str) -> Cmd9Result<String>,
{
    let mut out = String::with_capacity(text.len());
    for segment in segments(text) {
        match segment {
            Segment::Open(s) => out.push_str(&rewrite(s)?),
            Segment::Ignored(s) => out.push_str(s),
        }
    }
    Ok(out)
}

pub fn ignore(text: &str) -> String {
    format!("{IGNORE_START}{text}{IGNORE_END}")
}

/// Remove ignore markers, keeping the bracketed content.
pub fn strip(text: &str) -> String {
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Open(s) => s,
            Segment::Ignored(s) => {
                let inner = &s[IGNORE_START.len()..];
                inner.strip_suffix(IGNORE_END).unwrap_or(inner)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments() {
        assert_eq!(
            segments("a #[b]# c"),
            vec![
                Segment::Open("a "),
                Segment::Ignored("#[b]#"),
                Segment::Open(" c")
            ]
        );
        assert_eq!(segments("#[open"), vec![Segment::Ignored("#[open")]);
        assert!(segments("").is_empty());
    }

    #[test]
    fn test_strip_keeps_content() {
        assert_eq!(strip("x#[y]#z"), "xyz");
        assert_eq!(strip("#[tail"), "tail");
        assert_eq!(strip("plain ]# text"), "plain ]# text");
    }

    #[test]
    fn test_map_open_skips_ignored() {
        let out = map_open("ab#[ab]#ab", |s| Ok(s.to_uppercase())).unwrap();
        assert_eq!(out, "AB#[ab]#AB");
    }
}
