use crate::command::{Command, CommandResult, Context, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::lexer;
use crate::preprocess::Macro;
use crate::value::Args;

pub(super) fn register(pkg: &mut Package) -> Cmd9Result<()> {
    pkg.register(
        "#define",
        Command::new(cmd_define)
            .arity(1, None)
            .describe("Define a text macro", "#define NAME [TEXT]..."),
    )?;
    pkg.register(
        "#call",
        Command::new(cmd_call)
            .arity(2, None)
            .describe(
                "Define a macro that expands to a command's result",
                "#call NAME COMMAND [ARG]...",
            ),
    )?;
    pkg.register(
        "#action",
        Command::new(cmd_action)
            .arity(2, None)
            .describe(
                "Define a macro that runs a command and expands to nothing",
                "#action NAME COMMAND [ARG]...",
            ),
    )?;
    pkg.register(
        "#undef",
        Command::new(cmd_undef)
            .arity(1, Some(1))
            .describe("Remove a macro", "#undef NAME"),
    )?;
    pkg.register(
        "macros",
        Command::new(cmd_macros)
            .arity(0, Some(0))
            .describe("List macros", "macros"),
    )?;
    pkg.register(
        "alias",
        Command::new(cmd_alias)
            .arity(2, None)
            .describe(
                "Add a custom command forwarding to another with fixed leading arguments",
                "alias NAME COMMAND [ARG]...",
            ),
    )?;
    pkg.register(
        "unalias",
        Command::new(cmd_unalias)
            .arity(1, Some(1))
            .describe("Remove a custom command", "unalias NAME"),
    )?;
    Ok(())
}

fn cmd_define(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    ctx.launcher
        .define_macro(args.text(0)?, Macro::text(args.joined(1)))?;
    Ok(None)
}

fn cmd_call(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (command, rest) = args.forward(1)?;
    ctx.launcher
        .define_macro(args.text(0)?, Macro::Call { command, args: rest })?;
    Ok(None)
}

fn cmd_action(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let (command, rest) = args.forward(1)?;
    ctx.launcher
        .define_macro(args.text(0)?, Macro::Action { command, args: rest })?;
    Ok(None)
}

fn cmd_undef(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let name = args.text(0)?;
    if !ctx.launcher.undefine_macro(name) {
        return Err(Cmd9Error::raised(format!("#undef: no macro named '{name}'")));
    }
    Ok(None)
}

fn cmd_macros(_args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let text: String = ctx
        .launcher
        .macros()
        .iter()
        .map(|(name, body)| format!("{name:14} {}\n", body.describe()))
        .collect();
    ctx.launcher.feedback(&text);
    Ok(None)
}

fn cmd_alias(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let name = args.text(0)?.to_string();
    let (target, fixed) = args.forward(1)?;
    let usage = format!("{name} [ARG]...");
    let description = std::iter::once(target.clone())
        .chain(fixed.iter().map(|a| lexer::quote(a)))
        .collect::<Vec<_>>()
        .join(" ");
    let command = Command::new(move |args, ctx| {
        let mut all = fixed.clone();
        all.extend(args.rest(0));
        ctx.launcher.execute(&target, &all)?;
        Ok(None)
    })
    .describe(format!("alias for {description}"), usage);
    ctx.launcher.custom_package_mut().register(name, command)?;
    Ok(None)
}

fn cmd_unalias(args: &Args, ctx: &mut Context<'_>) -> CommandResult {
    let name = args.text(0)?;
    if ctx.launcher.custom_package_mut().remove(name).is_none() {
        return Err(Cmd9Error::UnrecognizedCommand(name.to_string()));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use crate::error::Cmd9Error;
    use crate::launcher::{Launcher, Output};

    fn launcher() -> Launcher {
        Launcher::builder()
            .stdout(Output::buffer())
            .stderr(Output::buffer())
            .build()
            .unwrap()
    }

    #[test]
    fn test_define_and_expand() {
        let mut l = launcher();
        l.run_line("#define answer 42").unwrap();
        assert_eq!(l.run_capture("print answer!").stdout, "42!\n");
        assert_eq!(l.run_capture("print #!answer").stdout, "answer\n");
    }

    #[test]
    fn test_redefine_existing_macro() {
        let mut l = launcher();
        l.run_line("#define x one").unwrap();
        l.run_line("#define x two").unwrap();
        assert_eq!(l.run_capture("print x").stdout, "two\n");
        l.run_line("#undef x").unwrap();
        assert_eq!(l.run_capture("print x").stdout, "x\n");
        assert!(l.run_line("#undef x").is_err());
    }

    #[test]
    fn test_reserved_names_never_shadowed() {
        let mut l = launcher();
        l.run_line("#define define boom").unwrap();
        l.run_line("#define undef boom").unwrap();
        l.run_line("#define y ok").unwrap();
        assert_eq!(l.run_capture("print y").stdout, "ok\n");
        l.run_line("#undef y").unwrap();
        assert!(matches!(
            l.run_line("#define #define x"),
            Err(Cmd9Error::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_call_and_action_macros() {
        let mut l = launcher();
        l.run_line("set who world").unwrap();
        l.run_line("#call who? get who").unwrap();
        assert_eq!(l.run_capture("print hello who?").stdout, "hello world\n");
        l.run_line("#action bump push x").unwrap();
        assert_eq!(l.run_capture("print [bump]").stdout, "[]\n");
        assert_eq!(l.memory().active().count(), 1);
    }

    #[test]
    fn test_definition_body_keeps_variables_lazy() {
        let mut l = launcher();
        l.run_line("#define greet #[$name$]#").unwrap();
        l.run_line("set name ada").unwrap();
        assert_eq!(l.run_capture("print greet").stdout, "ada\n");
    }

    #[test]
    fn test_alias_forwards_arguments() {
        let mut l = launcher();
        l.run_line("alias say print >>").unwrap();
        assert_eq!(l.run_capture("say hi there").stdout, ">> hi there\n");
        l.run_line("unalias say").unwrap();
        assert!(matches!(
            l.run_line("say hi"),
            Err(Cmd9Error::UnrecognizedCommand(_))
        ));
    }
}
