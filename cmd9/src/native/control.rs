use crate::command::{Command, CommandResult, Context, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::launcher::Launcher;
use crate::value::{ArgType, Args, MemoryItem};
use regex::Regex;
use std::collections::BTreeMap;

pub(super) fn register(pkg: &mut Package) -> Cmd9Result<()> {
    pkg.register(
        "run",
        Command::new(cmd_run)
            .arity(1, Some(1))
            .describe("Preprocess and execute a line", "run LINE"),
    )?;
    pkg.register(
        "chain",
        Command::new(cmd_chain)
            .arity(1, None)
            .describe("Run lines in order, stopping at the first failure", "chain LINE..."),
    )?;
    pkg.register(
        "repeat",
        Command::new(cmd_repeat)
            .arity(2, None)
            .typed(&[ArgType::Int])
            .describe("Invoke a command N times with the same arguments", "repeat N COMMAND [ARG]..."),
    )?;
    pkg.register(
        "while",
        Command::new(cmd_while)
            .arity(2, None)
            .describe(
                "Invoke a command while a condition line yields true",
                "while CONDITION COMMAND [ARG]...",
            ),
    )?;
    pkg.register(
        "if",
        Command::new(cmd_if)
            .arity(2, None)
            .typed(&[ArgType::Bool])
            .describe("Invoke a command when BOOL is true", "if BOOL COMMAND [ARG]..."),
    )?;
    pkg.register(
        "unless",
        Command::new(cmd_unless)
            .arity(2, None)
            .typed(&[ArgType::Bool])
            .describe("Invoke a command when BOOL is false", "unless BOOL COMMAND [ARG]..."),
    )?;
    pkg.register(
        "if-else",
        Command::new(cmd_if_else)
            .arity(3, Some(3))
            .typed(&[ArgType::Bool])
            .describe("Run the first line when BOOL is true, else the second", "if-else BOOL LINE LINE"),
    )?;
    pkg.register(
        "catch",
        Command::new(cmd_catch)
            .arity(1, None)
            .describe(
                "Run a command under supervision and push whether it succeeded",
                "catch COMMAND [ARG]...",
            ),
    )?;
    pkg.register(
        "async",
        Command::new(cmd_async)
            .arity(1, None)
            .describe("Run a command in the background on a snapshot", "async COMMAND [ARG]..."),
    )?;
    pkg.register(
        "jobs",
        Command::new(cmd_jobs)
            .arity(0, Some(0))
            .describe("List background jobs", "jobs"),
    )?;
    pkg.register(
        "wait",
        Command::new(cmd_wait)
            .arity(0, Some(0))
            .describe("Wait for every background job", "wait"),
    )?;
    pkg.register(
        "equals",
        Command::new(cmd_equals)
            .arity(2, Some(2))
            .describe("Push whether two texts are equal", "equals A B"),
    )?;
    pkg.register(
        "not",
        Command::new(cmd_not)
            .arity(1, Some(1))
            .typed(&[ArgType::Bool])
            .describe("Push the negation of BOOL", "not BOOL"),
    )?;
    pkg.register(
        "matches",
        Command::new(cmd_matches)
            .arity(2, Some(2))
            .describe("Push whether TEXT matches a regular expression", "matches TEXT REGEX"),
    )?;
    Ok(())
}

fn cmd_run(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.run_line(args.text(0)?)?;
    Ok(None)
}

fn cmd_chain(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    for line in args.rest(0) {
        ctx.launcher.run_line(&line)?;
    }
    Ok(None)
}

fn cmd_repeat(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let times = args.int(0)?;
    if times < 0 {
        return Err(Cmd9Error::raised(format!("repeat: count must not be negative, got {times}")));
    }
    let (name, rest) = args.forward(1)?;
    for _ in 0..times {
        ctx.launcher.execute(&name, &rest)?;
    }
    Ok(None)
}

/// Run `line` on an isolated stack and read the boolean it leaves behind.
fn condition(launcher: &mut Launcher, line: &str) -> Cmd9Result<bool> {
    let item = launcher.isolated(|l| {
        l.run_line(line)?;
        l.memory_mut().active_mut().pop()
    })?;
    item.as_bool().ok_or_else(|| {
        Cmd9Error::raised(format!("condition '{line}' produced '{item}', not a boolean"))
    })
}

fn cmd_while(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let cond = args.text(0)?;
    let (name, rest) = args.forward(1)?;
    while condition(ctx.launcher, cond)? {
        ctx.launcher.execute(&name, &rest)?;
    }
    Ok(None)
}

fn cmd_if(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    if args.bool(0)? {
        let (name, rest) = args.forward(1)?;
        ctx.launcher.execute(&name, &rest)?;
    }
    Ok(None)
}

fn cmd_unless(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    if !args.bool(0)? {
        let (name, rest) = args.forward(1)?;
        ctx.launcher.execute(&name, &rest)?;
    }
    Ok(None)
}

fn cmd_if_else(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let line = if args.bool(0)? { args.text(1)? } else { args.text(2)? };
    ctx.launcher.run_line(line)?;
    Ok(None)
}

fn cmd_catch(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (name, rest) = args.forward(0)?;
    let ok = ctx.launcher.execute_supervised(&name, &rest);
    Ok(Some(MemoryItem::Bool(ok)))
}

fn cmd_async(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (name, rest) = args.forward(0)?;
    let id = ctx.launcher.spawn(&name, &rest)?;
    ctx.launcher.feedback_line(&format!("[{id}] started"));
    Ok(None)
}

/// Finished jobs are listed once with their outcome, then forgotten.
fn cmd_jobs(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let listed = ctx.launcher.jobs();
    let finished: BTreeMap<usize, bool> = ctx.launcher.reap_jobs().into_iter().collect();
    for job in listed {
        let state = match finished.get(&job.id) {
            Some(true) => "done",
            Some(false) => "failed",
            None => "running",
        };
        ctx.launcher
            .feedback_line(&format!("[{}] {state:8} {}", job.id, job.label));
    }
    Ok(None)
}

fn cmd_wait(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    for (id, ok) in ctx.launcher.wait_jobs() {
        let state = if ok { "done" } else { "failed" };
        ctx.launcher.feedback_line(&format!("[{id}] {state}"));
    }
    Ok(None)
}

fn cmd_equals(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Ok(Some(MemoryItem::Bool(args.text(0)? == args.text(1)?)))
}

fn cmd_not(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Ok(Some(MemoryItem::Bool(!args.bool(0)?)))
}

fn cmd_matches(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    let pattern = args.text(1)?;
    let re = Regex::new(pattern)
        .map_err(|e| Cmd9Error::raised(format!("matches: invalid pattern '{pattern}': {e}")))?;
    Ok(Some(MemoryItem::Bool(re.is_match(args.text(0)?))))
}
