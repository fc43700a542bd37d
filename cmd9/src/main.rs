use clap::Parser;
use cmd9::launcher::{template_prompt, thread_stack_size};
use cmd9::{Cmd9Result, Launcher, ScriptPackageLoader};
use cmd9_config::{Cmd9Config, LogFormat, LoggingConfig, ShellConfig};
use std::path::Path;
use std::process::ExitCode;
use std::sync::PoisonError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod completer;

/// cmd9 - Extensible line-oriented command interpreter
#[derive(Parser, Debug)]
#[command(name = "cmd9", version, about)]
struct Args {
    /// Configuration file (replaces the default search path)
    #[arg(long, env = "CMD9_CONFIG")]
    config: Option<String>,

    /// Disable command feedback
    #[arg(short, long)]
    quiet: bool,

    /// Execute one line and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to execute
    script: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => cmd9_config::load_from_file(path),
        None => cmd9_config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("cmd9: {e}; using defaults");
        Cmd9Config::default()
    });

    init_logging(&config.logging);

    // Dispatch recurses on the native stack; size it for the call-depth limit.
    let interpreter = std::thread::Builder::new()
        .name("cmd9-main".to_string())
        .stack_size(thread_stack_size(config.interpreter.max_call_depth))
        .spawn(move || run(args, &config));
    match interpreter.map(std::thread::JoinHandle::join) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("cmd9: cannot start interpreter thread: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, config: &Cmd9Config) -> ExitCode {
    let mut launcher = match build_launcher(config, args.quiet) {
        Ok(launcher) => launcher,
        Err(e) => {
            eprintln!("cmd9: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ok = if let Some(line) = args.command {
        launcher.run_line_supervised(&line)
    } else if let Some(script_path) = args.script {
        match launcher.run_file(Path::new(&script_path)) {
            Ok(ok) => ok,
            Err(e) => {
                eprintln!("cmd9: cannot read '{script_path}': {e}");
                false
            }
        }
    } else {
        match run_repl(&mut launcher, &config.shell) {
            Ok(()) => true,
            Err(e) => {
                eprintln!("cmd9: {e}");
                false
            }
        }
    };

    let jobs_ok = launcher.wait_jobs().into_iter().all(|(_, job_ok)| job_ok);

    if ok && jobs_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(logging.directive());
    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command feedback, so logs go to stderr
    match logging.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_launcher(config: &Cmd9Config, quiet: bool) -> Cmd9Result<Launcher> {
    let mut launcher = Launcher::builder()
        .config(&config.interpreter)
        .feedback(config.interpreter.feedback && !quiet)
        .build()?;
    launcher.set_prompt_renderer(template_prompt(config.shell.prompt.clone()));

    for name in &config.packages.preload {
        launcher.use_package(name)?;
    }

    for dir in config.packages.resolved_script_dirs() {
        let path = Path::new(&dir);
        if !path.is_dir() {
            tracing::warn!(dir = %dir, "Script directory does not exist, skipping");
            continue;
        }
        let count = launcher.load_packages(&ScriptPackageLoader, path)?;
        tracing::info!(dir = %dir, packages = count, "Loaded script packages");
    }

    for path in config.packages.resolved_startup() {
        if !launcher.run_file(Path::new(&path))? {
            tracing::warn!(script = %path, "Startup script failed");
        }
    }

    Ok(launcher)
}

fn run_repl(launcher: &mut Launcher, shell_config: &ShellConfig) -> rustyline::Result<()> {
    use completer::Cmd9Helper;
    use rustyline::error::ReadlineError;
    use rustyline::history::DefaultHistory;
    use rustyline::{CompletionType, Config, Editor};

    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .max_history_size(shell_config.history.max_entries)?
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .build();

    let helper = Cmd9Helper::new();
    let commands = helper.commands.clone();
    let macros = helper.macros.clone();

    let mut rl: Editor<Cmd9Helper, DefaultHistory> = Editor::with_config(rl_config)?;
    rl.set_helper(Some(helper));

    let history_path = shell_config.history.resolved_file();
    if shell_config.history.enabled {
        let _ = rl.load_history(&history_path);
    }

    launcher.feedback_line(&format!("cmd9 v{}", env!("CARGO_PKG_VERSION")));
    launcher.feedback_line("Type 'quit' to exit, 'help' for help.");

    while launcher.is_running() {
        *commands.write().unwrap_or_else(PoisonError::into_inner) =
            launcher.packages().reachable_names();
        *macros.write().unwrap_or_else(PoisonError::into_inner) =
            launcher.macros().keys().cloned().collect();

        let prompt = launcher.render_prompt().unwrap_or_else(|| "> ".to_string());

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                launcher.run_line_supervised(line);
                for (id, ok) in launcher.reap_jobs() {
                    let state = if ok { "done" } else { "failed" };
                    launcher.feedback_line(&format!("[{id}] {state}"));
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("quit");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if shell_config.history.enabled {
        let _ = rl.save_history(&history_path);
    }

    Ok(())
}
