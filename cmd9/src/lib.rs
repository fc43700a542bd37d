//! cmd9 - Extensible line-oriented command interpreter
//!
//! This crate provides:
//! - A quote-aware tokenizer for the `name arg arg ...` line protocol
//! - The [`Package`]/[`Command`] extension contract with arity checks and
//!   typed argument coercion
//! - A multi-stack memory model, nested local scopes and a Global scope
//! - A priority-ordered preprocessing pipeline for macros, `$variables$`
//!   and `^` memory escapes
//! - [`Launcher`], which dispatches commands and supervises scripts
//!
//! ```no_run
//! use cmd9::{Command, Launcher, MemoryItem, Package};
//!
//! let greet = Command::new(|args, _ctx| Ok(Some(MemoryItem::text(format!("hi {}", args.joined(0))))))
//!     .arity(1, None)
//!     .describe("Push a greeting", "greet NAME...");
//! let mut launcher = Launcher::new()?;
//! launcher.add_package(Package::new("demo").with("greet", greet)?)?;
//! launcher.run_line("greet world")?;
//! launcher.run_line("pop")?;
//! # Ok::<(), cmd9::Cmd9Error>(())
//! ```

pub mod command;
pub mod error;
pub mod help;
pub mod launcher;
pub mod lexer;
pub mod memory;
pub mod native;
pub mod preprocess;
pub mod registry;
pub mod scope;
pub mod script;
pub mod value;

pub use command::{Command, CommandResult, Context, Package};
pub use error::{Cmd9Error, Cmd9Result};
pub use launcher::{CapturedOutput, JobInfo, Launcher, LauncherBuilder, Output};
pub use preprocess::{Macro, PreprocessPass};
pub use registry::{PackageLoader, PackageRegistry};
pub use script::ScriptPackageLoader;
pub use value::{Arg, ArgType, Args, MemoryItem, Opaque};
