//! Embed cmd9 as a command engine in your Rust application.
//!
//! Run:  cargo run -p cmd9 --example embed

use cmd9::{Cmd9Error, Cmd9Result, Command, Launcher, Macro, MemoryItem, Output, Package};

fn print_capture(label: &str, out: &cmd9::CapturedOutput) {
    println!("\n== {label} ==");
    println!("success: {}", out.success);

    if out.stdout.is_empty() {
        println!("stdout: <empty>");
    } else {
        println!("stdout:\n{}", out.stdout);
    }

    if out.stderr.is_empty() {
        println!("stderr: <empty>");
    } else {
        println!("stderr:\n{}", out.stderr);
    }
}

/// A third-party package: integer arithmetic on typed arguments.
fn math_package() -> Cmd9Result<Package> {
    Package::new("math")
        .with(
            "add",
            Command::new(|args, _ctx| Ok(Some(MemoryItem::Int(args.int(0)? + args.int(1)?))))
                .arity(2, Some(2))
                .typed(&[cmd9::ArgType::Int, cmd9::ArgType::Int])
                .describe("Push the sum of two integers", "add A B"),
        )?
        .with(
            "div",
            Command::new(|args, _ctx| {
                let divisor = args.int(1)?;
                if divisor == 0 {
                    return Err(Cmd9Error::raised("division by zero"));
                }
                Ok(Some(MemoryItem::Int(args.int(0)? / divisor)))
            })
            .arity(2, Some(2))
            .typed(&[cmd9::ArgType::Int, cmd9::ArgType::Int])
            .describe("Push the integer quotient", "div A B"),
        )
}

fn main() -> Cmd9Result<()> {
    let mut launcher = Launcher::builder()
        .stdout(Output::buffer())
        .package(math_package()?)
        .define("answer", Macro::text("42"))
        .build()?;

    println!("cmd9 embedded demo");
    println!(
        "packages: {:?}",
        launcher.packages().iter().map(Package::name).collect::<Vec<_>>()
    );

    let out = launcher.run_capture("add 40 2");
    print_capture("typed package command", &out);
    println!("top of stack: {:?}", launcher.memory().active().peek().ok());

    let out = launcher.run_capture("print answer is answer");
    print_capture("text macro", &out);

    let out = launcher.run_capture("div 1 0");
    print_capture("raised error", &out);

    let out = launcher.run_capture("add one 2");
    print_capture("argument translation", &out);

    launcher.run_line("set who embedder")?;
    let out = launcher.run_capture("print hello $who$");
    print_capture("variables", &out);

    let out = launcher.run_script_capture(
        "demo",
        "// a short script\nadd 1 2\nadd ^^ 10\npeek\n",
    );
    print_capture("script with memory escapes", &out);

    launcher.define_macro(
        "depth",
        Macro::native(|l| Ok(l.memory().active().count().to_string())),
    )?;
    let out = launcher.run_capture("print stack holds depth items");
    print_capture("native macro", &out);

    Ok(())
}
