use crate::command::{Command, CommandResult, Context, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::help;
use crate::value::{ArgType, Args};

pub(super) fn register(pkg: &mut Package) -> Cmd9Result<()> {
    pkg.register(
        "help",
        Command::new(cmd_help)
            .arity(0, Some(1))
            .describe("List commands or describe one", "help [NAME]"),
    )?;
    pkg.register(
        "packages",
        Command::new(cmd_packages)
            .arity(0, Some(0))
            .describe("List packages in search order", "packages"),
    )?;
    for name in ["quit", "exit"] {
        pkg.register(
            name,
            Command::new(cmd_quit)
                .arity(0, Some(0))
                .describe("Stop the read loop", name),
        )?;
    }
    pkg.register(
        "feedback",
        Command::new(cmd_feedback)
            .arity(0, Some(1))
            .typed(&[ArgType::Bool])
            .describe("Set or toggle command feedback", "feedback [BOOL]"),
    )?;
    pkg.register(
        "errors",
        Command::new(cmd_errors)
            .arity(0, Some(1))
            .typed(&[ArgType::Bool])
            .describe("Set or toggle error diagnostics", "errors [BOOL]"),
    )?;
    pkg.register(
        "print",
        Command::new(cmd_print).describe("Print the arguments as one line", "print [TEXT]..."),
    )?;
    pkg.register(
        "raise",
        Command::new(cmd_raise)
            .arity(1, None)
            .describe("Abort with a message", "raise MESSAGE..."),
    )?;
    Ok(())
}

fn cmd_help(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let packages = ctx.launcher.packages();
    let text = match args.get(0) {
        Some(name) => {
            let name = name.to_string();
            let (pkg, cmd) = packages
                .resolve(&name)
                .ok_or_else(|| Cmd9Error::UnrecognizedCommand(name.clone()))?;
            help::format_help(&name, pkg.name(), cmd)
        }
        None => help::format_help_list(packages),
    };
    ctx.launcher.feedback(&text);
    Ok(None)
}

fn cmd_packages(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let text = help::format_package_list(ctx.launcher.packages());
    ctx.launcher.feedback(&text);
    Ok(None)
}

fn cmd_quit(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.quit();
    Ok(None)
}

fn cmd_feedback(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let enabled = args
        .opt_bool(0)?
        .unwrap_or(!ctx.launcher.feedback_enabled());
    ctx.launcher.set_feedback(enabled);
    Ok(None)
}

fn cmd_errors(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let enabled = args
        .opt_bool(0)?
        .unwrap_or(!ctx.launcher.error_feedback_enabled());
    ctx.launcher.set_error_feedback(enabled);
    Ok(None)
}

fn cmd_print(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.feedback_line(&args.joined(0));
    Ok(None)
}

fn cmd_raise(args: &Args, _ctx: &mut Context<'_>) -> CommandResult {
    Err(Cmd9Error::raised(args.joined(0)))
}
