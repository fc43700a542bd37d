//! Small bundled `text` package, available through `use text`.

use crate::command::{Command, CommandResult, Context, Package};
use crate::error::Cmd9Result;
use crate::value::{ArgType, Args, MemoryItem};

pub(super) const PACKAGE: &str = "text";

pub(super) fn package() -> Cmd9Result<Package> {
    Package::new(PACKAGE)
        .with(
            "upper",
            Command::new(cmd_upper)
                .arity(1, None)
                .describe("Push the text in upper case", "upper TEXT..."),
        )?
        .with(
            "lower",
            Command::new(cmd_lower)
                .arity(1, None)
                .describe("Push the text in lower case", "lower TEXT..."),
        )?
        .with(
            "length",
            Command::new(cmd_length)
                .arity(1, Some(1))
                .describe("Push the number of characters", "length TEXT"),
        )?
        .with(
            "concat",
            Command::new(cmd_concat).describe("Push the arguments joined without spaces", "concat [TEXT]..."),
        )?
        .with(
            "words",
            Command::new(cmd_words)
                .arity(1, Some(1))
                .describe("Push the whitespace-separated words as a sequence", "words TEXT"),
        )?
        .with(
            "replace",
            Command::new(cmd_replace)
                .arity(3, Some(3))
                .describe("Push TEXT with every FROM replaced by TO", "replace TEXT FROM TO"),
        )?
        .with(
            "char-at",
            Command::new(cmd_char_at)
                .arity(2, Some(2))
                .typed(&[ArgType::Text, ArgType::Int])
                .describe("Push the character at a zero-based index", "char-at TEXT INDEX"),
        )
}

fn cmd_upper(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Ok(Some(MemoryItem::text(args.joined(0).to_uppercase())))
}

fn cmd_lower(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Ok(Some(MemoryItem::text(args.joined(0).to_lowercase())))
}

fn cmd_length(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    let len = args.text(0)?.chars().count();
    Ok(Some(MemoryItem::Int(i64::try_from(len).unwrap_or(i64::MAX))))
}

fn cmd_concat(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Ok(Some(MemoryItem::text(args.rest(0).concat())))
}

fn cmd_words(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    let words = args.text(0)?.split_whitespace().map(ToString::to_string).collect();
    Ok(Some(MemoryItem::Seq(words)))
}

fn cmd_replace(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Ok(Some(MemoryItem::text(
        args.text(0)?.replace(args.text(1)?, args.text(2)?),
    )))
}

fn cmd_char_at(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    let text = args.text(0)?;
    let index = args.int(1)?;
    let found = usize::try_from(index).ok().and_then(|i| text.chars().nth(i));
    Ok(found.map(|c| MemoryItem::text(c.to_string())))
}

#[cfg(test)]
mod tests {
    use crate::launcher::{Launcher, Output};
    use crate::value::MemoryItem;

    fn launcher() -> Launcher {
        let mut l = Launcher::builder()
            .stdout(Output::buffer())
            .stderr(Output::buffer())
            .build()
            .unwrap();
        l.run_line("use text").unwrap();
        l
    }

    fn top(l: &Launcher) -> MemoryItem {
        l.memory().active().peek().unwrap().clone()
    }

    #[test]
    fn test_case_and_length() {
        let mut l = launcher();
        l.run_line("upper 'hello there'").unwrap();
        assert_eq!(top(&l), MemoryItem::text("HELLO THERE"));
        l.run_line("length héllo").unwrap();
        assert_eq!(top(&l), MemoryItem::Int(5));
    }

    #[test]
    fn test_words_is_sequence() {
        let mut l = launcher();
        l.run_line("words ' a  b c '").unwrap();
        assert_eq!(
            top(&l),
            MemoryItem::Seq(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(l.run_capture("peek").stdout, "a b c\n");
    }

    #[test]
    fn test_char_at_out_of_range_pushes_nothing() {
        let mut l = launcher();
        l.run_line("char-at abc 1").unwrap();
        assert_eq!(top(&l), MemoryItem::text("b"));
        l.run_line("char-at abc 9").unwrap();
        assert_eq!(l.memory().active().count(), 1);
    }
}
