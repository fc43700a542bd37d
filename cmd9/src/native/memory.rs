use crate::command::{Command, CommandResult, Context, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::value::{ArgType, Args, MemoryItem};

pub(super) fn register(pkg: &mut Package) -> Cmd9Result<()> {
    pkg.register(
        "push",
        Command::new(cmd_push)
            .arity(1, Some(2))
            .describe(
                "Push a value, optionally typed as bool, int, float, char or text. \
                 A ^ in VALUE is read from the stack; write #[^]# for a literal caret",
                "push VALUE [TYPE]",
            ),
    )?;
    pkg.register(
        "pop",
        Command::new(cmd_pop)
            .arity(0, Some(0))
            .describe("Pop and print the top value", "pop"),
    )?;
    pkg.register(
        "peek",
        Command::new(cmd_peek)
            .arity(0, Some(0))
            .describe("Print the top value", "peek"),
    )?;
    pkg.register(
        "dup",
        Command::new(cmd_dup)
            .arity(0, Some(0))
            .describe("Duplicate the top value", "dup"),
    )?;
    pkg.register(
        "swap",
        Command::new(cmd_swap)
            .arity(0, Some(0))
            .describe("Exchange the two top values", "swap"),
    )?;
    pkg.register(
        "clear",
        Command::new(cmd_clear)
            .arity(0, Some(0))
            .describe("Empty the active stack", "clear"),
    )?;
    pkg.register(
        "count",
        Command::new(cmd_count)
            .arity(0, Some(0))
            .describe("Push the size of the active stack", "count"),
    )?;
    pkg.register(
        "stack",
        Command::new(cmd_stack)
            .arity(0, Some(1))
            .describe("List the active stack, most recent first", "stack [--json]"),
    )?;
    pkg.register(
        "lock",
        Command::new(cmd_lock)
            .arity(0, Some(0))
            .describe("Stop command results from landing on the active stack", "lock"),
    )?;
    pkg.register(
        "unlock",
        Command::new(cmd_unlock)
            .arity(0, Some(0))
            .describe("Let command results land on the active stack again", "unlock"),
    )?;
    pkg.register(
        "push-frame",
        Command::new(cmd_push_frame)
            .arity(0, Some(0))
            .describe("Open a fresh memory stack", "push-frame"),
    )?;
    pkg.register(
        "pop-frame",
        Command::new(cmd_pop_frame)
            .arity(0, Some(0))
            .describe("Discard the active memory stack", "pop-frame"),
    )?;
    pkg.register(
        "frames",
        Command::new(cmd_frames)
            .arity(0, Some(0))
            .describe("List memory stacks, active first", "frames"),
    )?;
    pkg.register(
        "isolated",
        Command::new(cmd_isolated)
            .arity(1, None)
            .describe("Run a command on its own memory stack", "isolated COMMAND [ARG]..."),
    )?;
    Ok(())
}

fn cmd_push(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let raw = args.text(0)?;
    let item = match args.get(1) {
        Some(kind) => {
            let kind = kind.to_string();
            let parsed = ArgType::from_name(&kind)
                .ok_or_else(|| Cmd9Error::raised(format!("push: unknown type '{kind}'")))?;
            MemoryItem::from_typed(parsed, raw).ok_or_else(|| Cmd9Error::ArgumentTranslation {
                command: args.command().to_string(),
                position: 0,
                value: raw.to_string(),
                expected: parsed,
            })?
        }
        None => MemoryItem::text(raw),
    };
    ctx.launcher.memory_mut().active_mut().push(item);
    Ok(None)
}

fn cmd_pop(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let item = ctx.launcher.memory_mut().active_mut().pop()?;
    ctx.launcher.feedback_line(&item.to_string());
    Ok(None)
}

fn cmd_peek(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let text = ctx.launcher.memory().active().peek()?.to_string();
    ctx.launcher.feedback_line(&text);
    Ok(None)
}

fn cmd_dup(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let stack = ctx.launcher.memory_mut().active_mut();
    let top = stack.peek()?.clone();
    stack.push(top);
    Ok(None)
}

fn cmd_swap(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let stack = ctx.launcher.memory_mut().active_mut();
    if stack.count() < 2 {
        return Err(Cmd9Error::MemoryEmpty);
    }
    let first = stack.pop()?;
    let second = stack.pop()?;
    stack.push(first);
    stack.push(second);
    Ok(None)
}

fn cmd_clear(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.memory_mut().active_mut().clear();
    Ok(None)
}

fn cmd_count(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let count = ctx.launcher.memory().active().count();
    Ok(Some(MemoryItem::Int(i64::try_from(count).unwrap_or(i64::MAX))))
}

fn cmd_stack(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let json = match args.get(0) {
        Some(flag) if flag.to_string() == "--json" => true,
        Some(flag) => return Err(Cmd9Error::raised(format!("stack: unknown option '{flag}'"))),
        None => false,
    };
    let stack = ctx.launcher.memory().active();
    let text = if json {
        let items: Vec<&MemoryItem> = stack.iter().collect();
        let mut text = serde_json::to_string(&items)
            .map_err(|e| Cmd9Error::raised(format!("stack: {e}")))?;
        text.push('\n');
        text
    } else {
        stack.iter().map(|item| format!("{item}\n")).collect()
    };
    ctx.launcher.feedback(&text);
    Ok(None)
}

fn cmd_lock(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.memory_mut().active_mut().lock();
    Ok(None)
}

fn cmd_unlock(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.memory_mut().active_mut().unlock();
    Ok(None)
}

fn cmd_push_frame(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.memory_mut().add_stack();
    Ok(None)
}

fn cmd_pop_frame(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.memory_mut().remove_stack()?;
    Ok(None)
}

fn cmd_frames(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let memory = ctx.launcher.memory();
    let depth = memory.depth();
    let text: String = memory
        .frames()
        .enumerate()
        .map(|(i, frame)| {
            let lock = if frame.is_locked() { " (locked)" } else { "" };
            format!("{}: {} items{lock}\n", depth - 1 - i, frame.count())
        })
        .collect();
    ctx.launcher.feedback(&text);
    Ok(None)
}

fn cmd_isolated(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (name, rest) = args.forward(0)?;
    ctx.launcher.isolated(|l| l.execute(&name, &rest))?;
    Ok(None)
}
