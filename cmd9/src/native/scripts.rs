use crate::command::{Command, CommandResult, Context, Package};
use crate::error::Cmd9Result;
use crate::script::{self, ScriptPackageLoader};
use crate::value::Args;
use std::path::Path;

pub(super) fn register(pkg: &mut Package) -> Cmd9Result<()> {
    pkg.register(
        "load",
        Command::new(cmd_load)
            .arity(1, Some(2))
            .describe("Register a script file as a custom command", "load PATH [NAME]"),
    )?;
    pkg.register(
        "compile",
        Command::new(cmd_compile)
            .arity(2, Some(2))
            .describe("Register every script in a directory as one command", "compile DIR NAME"),
    )?;
    pkg.register(
        "source",
        Command::new(cmd_source)
            .arity(1, Some(1))
            .describe("Run a script file in the current scope", "source PATH"),
    )?;
    pkg.register(
        "import",
        Command::new(cmd_import)
            .arity(1, Some(1))
            .describe("Load a directory of scripts as a package", "import DIR"),
    )?;
    pkg.register(
        "use",
        Command::new(cmd_use)
            .arity(1, Some(1))
            .describe("Add a compiled-in package", "use NAME"),
    )?;
    Ok(())
}

fn cmd_load(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let path = Path::new(args.text(0)?);
    let name = args.get(1).map(ToString::to_string);
    let (name, command) = script::load_script(path, name.as_deref())?;
    ctx.launcher.custom_package_mut().register(name, command)?;
    Ok(None)
}

fn cmd_compile(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let name = args.text(1)?;
    let command = script::compile_dir(Path::new(args.text(0)?), name)?;
    ctx.launcher.custom_package_mut().register(name, command)?;
    Ok(None)
}

fn cmd_source(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let text = std::fs::read_to_string(args.text(0)?)?;
    ctx.launcher.run_script_unsupervised(&text)?;
    Ok(None)
}

fn cmd_import(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let dir = args.text(0)?;
    let count = ctx
        .launcher
        .load_packages(&ScriptPackageLoader, Path::new(dir))?;
    tracing::debug!(dir, packages = count, "Imported script directory");
    Ok(None)
}

fn cmd_use(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher.use_package(args.text(0)?)?;
    Ok(None)
}
