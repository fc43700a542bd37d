use crate::command::{Command, CommandResult, Context, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::scope::is_variable_name;
use crate::value::{Args, MemoryItem};

pub(super) fn register(pkg: &mut Package) -> Cmd9Result<()> {
    pkg.register(
        "set",
        Command::new(cmd_set)
            .arity(1, None)
            .describe(
                "Store a variable in the active scope. A ^ in VALUE is read from the \
                 stack here and again wherever $NAME$ expands",
                "set NAME [VALUE]...",
            ),
    )?;
    pkg.register(
        "get",
        Command::new(cmd_get)
            .arity(1, Some(1))
            .describe("Push a variable's value", "get NAME"),
    )?;
    pkg.register(
        "unset",
        Command::new(cmd_unset)
            .arity(1, Some(1))
            .describe("Remove a variable from the active scope", "unset NAME"),
    )?;
    pkg.register(
        "vars",
        Command::new(cmd_vars)
            .arity(0, Some(0))
            .describe("List variables of the active scope", "vars"),
    )?;
    pkg.register(
        "enter-scope",
        Command::new(cmd_enter_scope)
            .arity(0, Some(0))
            .describe("Open a new local scope", "enter-scope"),
    )?;
    pkg.register(
        "exit-scope",
        Command::new(cmd_exit_scope)
            .arity(0, Some(0))
            .describe("Close the innermost local scope", "exit-scope"),
    )?;
    pkg.register(
        "enter-global",
        Command::new(cmd_enter_global)
            .arity(0, Some(0))
            .describe("Direct variable access to the Global scope", "enter-global"),
    )?;
    pkg.register(
        "exit-global",
        Command::new(cmd_exit_global)
            .arity(0, Some(0))
            .describe("Return variable access to local scopes", "exit-global"),
    )?;
    pkg.register(
        "scoped",
        Command::new(cmd_scoped)
            .arity(1, None)
            .describe("Run a command in a temporary local scope", "scoped COMMAND [ARG]..."),
    )?;
    pkg.register(
        "globally",
        Command::new(cmd_globally)
            .arity(1, None)
            .describe("Run a command with Global active", "globally COMMAND [ARG]..."),
    )?;
    Ok(())
}

fn cmd_set(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let name = args.text(0)?;
    if !is_variable_name(name) {
        return Err(Cmd9Error::raised(format!("set: '{name}' is not a valid variable name")));
    }
    ctx.launcher.scopes_mut().store(name, &args.joined(1));
    Ok(None)
}

fn cmd_get(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let value = ctx.launcher.scopes().load(args.text(0)?)?;
    Ok(Some(MemoryItem::text(value)))
}

fn cmd_unset(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let name = args.text(0)?;
    if !ctx.launcher.scopes_mut().remove(name) {
        return Err(Cmd9Error::UndefinedVariable(name.to_string()));
    }
    Ok(None)
}

fn cmd_vars(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let text: String = ctx
        .launcher
        .scopes()
        .active()
        .iter()
        .map(|(name, value)| format!("{name}={value}\n"))
        .collect();
    ctx.launcher.feedback(&text);
    Ok(None)
}

fn cmd_enter_scope(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.scopes_mut().enter_scope()?;
    Ok(None)
}

fn cmd_exit_scope(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.scopes_mut().exit_scope()?;
    Ok(None)
}

fn cmd_enter_global(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.scopes_mut().enter_global()?;
    Ok(None)
}

fn cmd_exit_global(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.scopes_mut().exit_global()?;
    Ok(None)
}

fn cmd_scoped(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (name, rest) = args.forward(0)?;
    ctx.launcher.temp_scope(|l| l.execute(&name, &rest))?;
    Ok(None)
}

fn cmd_globally(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (name, rest) = args.forward(0)?;
    ctx.launcher.temp_global(|l| l.execute(&name, &rest))?;
    Ok(None)
}
