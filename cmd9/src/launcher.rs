//! The interpreter instance: dispatch, supervision, and scoped helpers

use crate::command::{Context, Package};
use crate::error::{Cmd9Error, Cmd9Result};
use crate::lexer;
use crate::memory::MultiStack;
use crate::native;
use crate::preprocess::{self, markers, validate_macro_name, Macro, Pipeline, PreprocessPass};
use crate::registry::{PackageLoader, PackageRegistry, PackageSet, CUSTOM_PACKAGE, NATIVE_PACKAGE};
use crate::scope::{ScopeCheckpoint, ScopeManager};
use cmd9_config::InterpreterConfig;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Lines whose first word starts with this are ignored.
pub const COMMENT_PREFIX: &str = "//";

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Stack reserved per level of re-entrant dispatch on interpreter threads.
pub const STACK_PER_CALL_LEVEL: usize = 64 * 1024;

const MIN_THREAD_STACK: usize = 8 * 1024 * 1024;

/// Stack size for a thread that runs a launcher with the given call-depth
/// limit, large enough that the limit trips before the stack overflows.
pub fn thread_stack_size(max_depth: usize) -> usize {
    max_depth
        .saturating_mul(STACK_PER_CALL_LEVEL)
        .max(MIN_THREAD_STACK)
}

pub type PromptRenderer = Arc<dyn Fn(&Launcher) -> String + Send + Sync>;

/// Destination for feedback and diagnostics.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Stderr,
    Buffer(Arc<Mutex<String>>),
}

impl Output {
    pub fn buffer() -> Self {
        Self::Buffer(Arc::new(Mutex::new(String::new())))
    }

    pub fn write(&self, text: &str) {
        // Feedback is best effort; a closed terminal must not abort a command.
        match self {
            Self::Stdout => {
                let mut out = io::stdout().lock();
                let _ = out.write_all(text.as_bytes());
                let _ = out.flush();
            }
            Self::Stderr => {
                let mut err = io::stderr().lock();
                let _ = err.write_all(text.as_bytes());
            }
            Self::Buffer(buf) => buf
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_str(text),
        }
    }

    /// Buffered text so far; `None` for terminal outputs.
    pub fn contents(&self) -> Option<String> {
        match self {
            Self::Buffer(buf) => Some(buf.lock().unwrap_or_else(PoisonError::into_inner).clone()),
            _ => None,
        }
    }
}

/// Result of [`Launcher::run_capture`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

struct BackgroundJob {
    id: usize,
    label: String,
    handle: JoinHandle<bool>,
}

impl BackgroundJob {
    /// A job thread that died outside supervision counts as failed.
    fn join(self) -> (usize, bool) {
        (self.id, self.handle.join().unwrap_or(false))
    }
}

/// Status line for a background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: usize,
    pub label: String,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    frames: usize,
    scopes: ScopeCheckpoint,
    depth: usize,
}

/// Builder for [`Launcher`].
pub struct LauncherBuilder {
    feedback: bool,
    error_feedback: bool,
    interpolation_limit: Option<usize>,
    strip_markers: bool,
    max_depth: usize,
    stdout: Output,
    stderr: Output,
    prompt: Option<PromptRenderer>,
    registry: Option<PackageRegistry>,
    packages: Vec<Package>,
    macros: Vec<(String, Macro)>,
}

impl Default for LauncherBuilder {
    fn default() -> Self {
        Self {
            feedback: true,
            error_feedback: true,
            interpolation_limit: None,
            strip_markers: true,
            max_depth: DEFAULT_MAX_DEPTH,
            stdout: Output::Stdout,
            stderr: Output::Stderr,
            prompt: None,
            registry: None,
            packages: Vec::new(),
            macros: Vec::new(),
        }
    }
}

impl LauncherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the `interpreter` section of the configuration file.
    #[must_use]
    pub fn config(mut self, config: &InterpreterConfig) -> Self {
        self.feedback = config.feedback;
        self.error_feedback = config.error_feedback;
        self.interpolation_limit = config.interpolation_limit;
        self.strip_markers = config.strip_markers;
        self.max_depth = config.max_call_depth;
        self
    }

    #[must_use]
    pub fn feedback(mut self, enabled: bool) -> Self {
        self.feedback = enabled;
        self
    }

    #[must_use]
    pub fn error_feedback(mut self, enabled: bool) -> Self {
        self.error_feedback = enabled;
        self
    }

    #[must_use]
    pub fn interpolation_limit(mut self, limit: Option<usize>) -> Self {
        self.interpolation_limit = limit;
        self
    }

    #[must_use]
    pub fn strip_markers(mut self, strip: bool) -> Self {
        self.strip_markers = strip;
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn stdout(mut self, output: Output) -> Self {
        self.stdout = output;
        self
    }

    #[must_use]
    pub fn stderr(mut self, output: Output) -> Self {
        self.stderr = output;
        self
    }

    #[must_use]
    pub fn prompt<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&Launcher) -> String + Send + Sync + 'static,
    {
        self.prompt = Some(Arc::new(renderer));
        self
    }

    /// Replace the compiled-in package registry used by `use`.
    #[must_use]
    pub fn registry(mut self, registry: PackageRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    #[must_use]
    pub fn define(mut self, name: impl Into<String>, body: Macro) -> Self {
        self.macros.push((name.into(), body));
        self
    }

    pub fn build(self) -> Cmd9Result<Launcher> {
        let mut launcher = Launcher {
            packages: PackageSet::new(native::package()?),
            registry: Arc::new(self.registry.unwrap_or_else(native::default_registry)),
            memory: MultiStack::new(),
            scopes: ScopeManager::new(),
            pipeline: Pipeline::new(),
            macros: BTreeMap::new(),
            feedback: self.feedback,
            error_feedback: self.error_feedback,
            interpolation_limit: self.interpolation_limit,
            strip_markers: self.strip_markers,
            max_depth: self.max_depth,
            depth: 0,
            running: true,
            stdout: self.stdout,
            stderr: self.stderr,
            prompt: self.prompt,
            jobs: Vec::new(),
            next_job_id: 1,
        };
        for package in self.packages {
            launcher.add_package(package)?;
        }
        for (name, body) in self.macros {
            launcher.define_macro(&name, body)?;
        }
        Ok(launcher)
    }
}

/// One interpreter instance. Holds no process-wide state, so several may
/// coexist.
pub struct Launcher {
    packages: PackageSet,
    registry: Arc<PackageRegistry>,
    memory: MultiStack,
    scopes: ScopeManager,
    pipeline: Pipeline,
    macros: BTreeMap<String, Arc<Macro>>,
    feedback: bool,
    error_feedback: bool,
    interpolation_limit: Option<usize>,
    strip_markers: bool,
    max_depth: usize,
    depth: usize,
    running: bool,
    stdout: Output,
    stderr: Output,
    prompt: Option<PromptRenderer>,
    jobs: Vec<BackgroundJob>,
    next_job_id: usize,
}

impl Launcher {
    /// A launcher with default settings writing to the terminal.
    pub fn new() -> Cmd9Result<Self> {
        LauncherBuilder::new().build()
    }

    pub fn builder() -> LauncherBuilder {
        LauncherBuilder::new()
    }

    pub fn packages(&self) -> &PackageSet {
        &self.packages
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &MultiStack {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MultiStack {
        &mut self.memory
    }

    pub fn scopes(&self) -> &ScopeManager {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeManager {
        &mut self.scopes
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn call_depth(&self) -> usize {
        self.depth
    }

    pub fn feedback_enabled(&self) -> bool {
        self.feedback
    }

    pub fn set_feedback(&mut self, enabled: bool) {
        self.feedback = enabled;
    }

    pub fn error_feedback_enabled(&self) -> bool {
        self.error_feedback
    }

    pub fn set_error_feedback(&mut self, enabled: bool) {
        self.error_feedback = enabled;
    }

    pub fn interpolation_limit(&self) -> Option<usize> {
        self.interpolation_limit
    }

    pub fn set_interpolation_limit(&mut self, limit: Option<usize>) {
        self.interpolation_limit = limit;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the read loop to stop after the current line.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Add a loaded package, replacing one with the same name.
    pub fn add_package(&mut self, package: Package) -> Cmd9Result<()> {
        if package.name() == NATIVE_PACKAGE || package.name() == CUSTOM_PACKAGE {
            return Err(Cmd9Error::InvalidDefinition(format!(
                "package name '{}' is reserved",
                package.name()
            )));
        }
        let name = package.name().to_string();
        let commands = package.len();
        if self.packages.add(package).is_some() {
            tracing::warn!(package = %name, "Replaced previously loaded package");
        }
        tracing::debug!(package = %name, commands, "Package added");
        Ok(())
    }

    pub fn remove_package(&mut self, name: &str) -> Option<Package> {
        self.packages.remove(name)
    }

    /// The anonymous package that holds scripts and aliases.
    pub fn custom_package_mut(&mut self) -> &mut Package {
        self.packages.custom_mut()
    }

    /// Instantiate a package from the compiled-in registry.
    pub fn use_package(&mut self, name: &str) -> Cmd9Result<()> {
        let package = self.registry.create(name)?;
        self.add_package(package)
    }

    /// Add every package `loader` finds in `directory`; returns how many.
    pub fn load_packages(&mut self, loader: &dyn PackageLoader, directory: &Path) -> Cmd9Result<usize> {
        let found = loader.discover(directory)?;
        let count = found.len();
        for package in found {
            self.add_package(package)?;
        }
        Ok(count)
    }

    pub fn macros(&self) -> &BTreeMap<String, Arc<Macro>> {
        &self.macros
    }

    pub fn define_macro(&mut self, name: &str, body: Macro) -> Cmd9Result<()> {
        validate_macro_name(name)?;
        tracing::debug!(name, body = %body.describe(), "Macro defined");
        self.macros.insert(name.to_string(), Arc::new(body));
        Ok(())
    }

    pub fn undefine_macro(&mut self, name: &str) -> bool {
        self.macros.remove(name).is_some()
    }

    /// Macro names in the order the macro pass tries them.
    pub fn macro_names_longest_first(&self) -> Vec<String> {
        let mut names: Vec<String> = self.macros.keys().cloned().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names
    }

    pub fn add_pass(&mut self, pass: Arc<dyn PreprocessPass>) {
        self.pipeline.add(pass);
    }

    pub fn remove_pass(&mut self, name: &str) -> Cmd9Result<Arc<dyn PreprocessPass>> {
        self.pipeline.remove(name)
    }

    pub fn feedback(&self, text: &str) {
        if self.feedback {
            self.stdout.write(text);
        }
    }

    pub fn feedback_line(&self, text: &str) {
        if self.feedback {
            self.stdout.write(text);
            self.stdout.write("\n");
        }
    }

    pub fn error_line(&self, text: &str) {
        if self.error_feedback {
            self.stderr.write(text);
            self.stderr.write("\n");
        }
    }

    pub fn set_prompt_renderer(&mut self, renderer: PromptRenderer) {
        self.prompt = Some(renderer);
    }

    pub fn render_prompt(&self) -> Option<String> {
        self.prompt.as_ref().map(|render| render(self))
    }

    /// Resolve, arity-check, translate and invoke one command.
    ///
    /// Errors propagate unchanged. A produced result lands on the active
    /// stack unless that stack is locked.
    pub fn execute(&mut self, name: &str, args: &[String]) -> Cmd9Result<()> {
        let (package, command) = self
            .packages
            .resolve(name)
            .map(|(pkg, cmd)| (pkg.name().to_string(), Arc::clone(cmd)))
            .ok_or_else(|| Cmd9Error::UnrecognizedCommand(name.to_string()))?;
        command.check_arity(name, args.len())?;
        let args = command.translate(name, args)?;

        if self.depth >= self.max_depth {
            return Err(Cmd9Error::StackFrameCritical(format!(
                "call depth limit of {} reached at '{name}'",
                self.max_depth
            )));
        }

        self.depth += 1;
        tracing::debug!(command = name, package = %package, depth = self.depth, "Dispatching");
        let result = {
            let mut ctx = Context {
                package,
                launcher: &mut *self,
            };
            command.invoke(&args, &mut ctx)
        };
        self.depth -= 1;

        if let Some(item) = result? {
            let stack = self.memory.active_mut();
            if !stack.is_locked() {
                stack.push(item);
            }
        }
        Ok(())
    }

    /// Rewrite a tokenized line through every pass, then strip ignore markers.
    pub fn preprocess(&mut self, name: &str, args: &[String]) -> Cmd9Result<(String, Vec<String>)> {
        let defining = preprocess::is_reserved(name);
        let mut name = name.to_string();
        let mut args = args.to_vec();
        if defining {
            if let Some(first) = args.first_mut() {
                *first = markers::ignore(first);
            }
        }

        let passes = self.pipeline.passes().to_vec();
        for pass in passes {
            name = pass.apply(&name, self)?;
            for arg in &mut args {
                *arg = pass.apply(arg, self)?;
            }
        }

        let name = markers::strip(&name);
        let args = args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| {
                if self.strip_markers || (defining && i == 0) {
                    markers::strip(&arg)
                } else {
                    arg
                }
            })
            .collect();
        Ok((name, args))
    }

    /// Tokenize, preprocess and execute one line. Blank and comment lines
    /// do nothing.
    pub fn run_line(&mut self, line: &str) -> Cmd9Result<()> {
        let words = lexer::split(line)?;
        let Some((name, args)) = words.split_first() else {
            return Ok(());
        };
        if name.starts_with(COMMENT_PREFIX) {
            return Ok(());
        }
        let (name, args) = self.preprocess(name, args)?;
        self.execute(&name, &args)
    }

    /// Run lines in order, stopping at the first error or when quit.
    pub fn run_script_unsupervised(&mut self, text: &str) -> Cmd9Result<()> {
        for line in text.lines() {
            if !self.running {
                break;
            }
            self.run_line(line)?;
        }
        Ok(())
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            frames: self.memory.depth(),
            scopes: self.scopes.checkpoint(),
            depth: self.depth,
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.memory.truncate(checkpoint.frames);
        self.scopes.restore(checkpoint.scopes);
        self.depth = checkpoint.depth;
    }

    /// Run `f`, turning any error or panic into a diagnostic and `false`.
    ///
    /// A panic leaves frames and scopes wherever the unwinding body was, so
    /// they are rolled back to the state recorded on entry.
    pub fn supervise<F>(&mut self, source: &str, f: F) -> bool
    where
        F: FnOnce(&mut Self) -> Cmd9Result<()>,
    {
        let checkpoint = self.checkpoint();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(&mut *self)));
        let error = match outcome {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => e,
            Err(payload) => {
                self.restore(checkpoint);
                Cmd9Error::CriticalUnexpected {
                    command: source.to_string(),
                    message: panic_message(payload.as_ref()),
                }
            }
        };
        tracing::debug!(source, kind = error.kind(), error = %error, "Supervised run failed");
        self.error_line(&format!("{source}: {error}"));
        false
    }

    pub fn execute_supervised(&mut self, name: &str, args: &[String]) -> bool {
        self.supervise(name, |l| l.execute(name, args))
    }

    pub fn run_line_supervised(&mut self, line: &str) -> bool {
        let source = first_word(line);
        self.supervise(&source, |l| l.run_line(line))
    }

    /// Run a script fail-fast; each line is supervised and the first failure
    /// stops the rest.
    pub fn run_script(&mut self, origin: &str, text: &str) -> bool {
        for (index, line) in text.lines().enumerate() {
            if !self.running {
                break;
            }
            let source = format!("{origin}:{}: {}", index + 1, first_word(line));
            if !self.supervise(&source, |l| l.run_line(line)) {
                return false;
            }
        }
        true
    }

    pub fn run_file(&mut self, path: &Path) -> Cmd9Result<bool> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.run_script(&path.display().to_string(), &text))
    }

    /// Body of a script-backed command: lines run unsupervised inside a
    /// temporary scope with positional arguments bound as `1`, `2`, … and
    /// `argc`.
    pub fn run_script_command(&mut self, body: &str, positional: &[String]) -> Cmd9Result<()> {
        if self.scopes.is_global() {
            return Err(Cmd9Error::scope("scripts cannot run while Global is active"));
        }
        self.temp_scope(|l| {
            for (index, value) in positional.iter().enumerate() {
                l.scopes.store(&(index + 1).to_string(), value);
            }
            l.scopes.store("argc", &positional.len().to_string());
            l.run_script_unsupervised(body)
        })
    }

    /// Run a line with output captured instead of written to the terminal.
    ///
    /// Background jobs started by the line are joined before returning, so
    /// their output lands in the capture too.
    pub fn run_capture(&mut self, line: &str) -> CapturedOutput {
        self.capture(|l| l.run_line_supervised(line))
    }

    pub fn run_script_capture(&mut self, origin: &str, text: &str) -> CapturedOutput {
        self.capture(|l| l.run_script(origin, text))
    }

    fn capture<F>(&mut self, f: F) -> CapturedOutput
    where
        F: FnOnce(&mut Self) -> bool,
    {
        let out = Output::buffer();
        let err = Output::buffer();
        let prev_out = std::mem::replace(&mut self.stdout, out.clone());
        let prev_err = std::mem::replace(&mut self.stderr, err.clone());
        let first_job = self.next_job_id;
        let success = f(self);
        self.join_jobs_from(first_job);
        self.stdout = prev_out;
        self.stderr = prev_err;
        CapturedOutput {
            success,
            stdout: out.contents().unwrap_or_default(),
            stderr: err.contents().unwrap_or_default(),
        }
    }

    /// Run `f` on a fresh memory stack; every frame opened inside is
    /// discarded on return, whatever the outcome.
    pub fn isolated<T, F>(&mut self, f: F) -> Cmd9Result<T>
    where
        F: FnOnce(&mut Self) -> Cmd9Result<T>,
    {
        let restore_to = self.memory.enter_isolated();
        let result = f(self);
        self.memory.leave_isolated(restore_to);
        result
    }

    /// Run `f` in a new local scope that `exit-scope` cannot leave; every
    /// scope opened inside is unwound on return.
    pub fn temp_scope<T, F>(&mut self, f: F) -> Cmd9Result<T>
    where
        F: FnOnce(&mut Self) -> Cmd9Result<T>,
    {
        let mark = self.scopes.begin_temp()?;
        let result = f(self);
        self.scopes.end_temp(mark);
        result
    }

    /// Run `f` with Global active; `exit-global` is refused until it returns.
    /// Global is left as it was found, so guards nest.
    pub fn temp_global<T, F>(&mut self, f: F) -> Cmd9Result<T>
    where
        F: FnOnce(&mut Self) -> Cmd9Result<T>,
    {
        let was_global = self.scopes.begin_temp_global();
        let result = f(self);
        self.scopes.end_temp_global(was_global);
        result
    }

    /// An independent copy sharing only the packages, macros and outputs.
    pub fn fork(&self) -> Self {
        Self {
            packages: self.packages.clone(),
            registry: Arc::clone(&self.registry),
            memory: self.memory.clone(),
            scopes: self.scopes.clone(),
            pipeline: self.pipeline.clone(),
            macros: self.macros.clone(),
            feedback: self.feedback,
            error_feedback: self.error_feedback,
            interpolation_limit: self.interpolation_limit,
            strip_markers: self.strip_markers,
            max_depth: self.max_depth,
            depth: 0,
            running: true,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
            prompt: self.prompt.clone(),
            jobs: Vec::new(),
            next_job_id: 1,
        }
    }

    /// Run one command on a thread against a [`Launcher::fork`] snapshot.
    pub fn spawn(&mut self, name: &str, args: &[String]) -> Cmd9Result<usize> {
        let id = self.next_job_id;
        self.next_job_id += 1;
        let label = std::iter::once(name.to_string())
            .chain(args.iter().map(|a| lexer::quote(a)))
            .collect::<Vec<_>>()
            .join(" ");

        let mut child = self.fork();
        let name = name.to_string();
        let args = args.to_vec();
        let handle = std::thread::Builder::new()
            .name(format!("cmd9-job-{id}"))
            .stack_size(thread_stack_size(self.max_depth))
            .spawn(move || child.execute_supervised(&name, &args))?;

        tracing::debug!(job = id, label = %label, "Background job started");
        self.jobs.push(BackgroundJob { id, label, handle });
        Ok(id)
    }

    pub fn jobs(&self) -> Vec<JobInfo> {
        self.jobs
            .iter()
            .map(|job| JobInfo {
                id: job.id,
                label: job.label.clone(),
                finished: job.handle.is_finished(),
            })
            .collect()
    }

    /// Join every background job; returns `(id, succeeded)` pairs.
    pub fn wait_jobs(&mut self) -> Vec<(usize, bool)> {
        self.jobs.drain(..).map(BackgroundJob::join).collect()
    }

    /// Join and forget the jobs that have already finished.
    pub fn reap_jobs(&mut self) -> Vec<(usize, bool)> {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.jobs)
            .into_iter()
            .partition(|job| job.handle.is_finished());
        self.jobs = running;
        finished.into_iter().map(BackgroundJob::join).collect()
    }

    fn join_jobs_from(&mut self, first_id: usize) {
        let (started, earlier): (Vec<_>, Vec<_>) = std::mem::take(&mut self.jobs)
            .into_iter()
            .partition(|job| job.id >= first_id);
        self.jobs = earlier;
        for (id, ok) in started.into_iter().map(BackgroundJob::join) {
            tracing::debug!(job = id, ok, "Joined job started during capture");
        }
    }
}

fn first_word(line: &str) -> String {
    line.split_whitespace().next().unwrap_or_default().to_string()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "command panicked".to_string()
    }
}

/// Prompt renderer over a template with `{depth}`, `{mode}`, `{stack}` and
/// `{frames}` placeholders.
pub fn template_prompt(template: impl Into<String>) -> PromptRenderer {
    let template = template.into();
    Arc::new(move |launcher: &Launcher| {
        template
            .replace("{depth}", &launcher.scopes().depth().to_string())
            .replace("{mode}", if launcher.scopes().is_global() { "*" } else { "" })
            .replace("{stack}", &launcher.memory().active().count().to_string())
            .replace("{frames}", &launcher.memory().depth().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, CommandResult};
    use crate::value::{ArgType, MemoryItem};

    fn quiet() -> Launcher {
        Launcher::builder()
            .stdout(Output::buffer())
            .stderr(Output::buffer())
            .build()
            .unwrap()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_unrecognized_command() {
        let mut launcher = quiet();
        assert!(matches!(
            launcher.execute("nope", &[]),
            Err(Cmd9Error::UnrecognizedCommand(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_arity_checked_before_body() {
        let mut launcher = quiet();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        let pkg = Package::new("t")
            .with(
                "one-to-three",
                Command::new(move |_, _| {
                    *counter.lock().unwrap() += 1;
                    Ok(None)
                })
                .arity(1, Some(3)),
            )
            .unwrap();
        launcher.add_package(pkg).unwrap();

        assert!(launcher.execute("one-to-three", &[]).unwrap_err().is_arity());
        assert!(launcher.execute("one-to-three", &args(&["a", "b", "c", "d"])).unwrap_err().is_arity());
        for n in 1..=3 {
            launcher.execute("one-to-three", &vec!["x".to_string(); n]).unwrap();
        }
        assert_eq!(*hits.lock().unwrap(), 3);
    }

    #[test]
    fn test_result_pushed_unless_locked() {
        let mut launcher = quiet();
        let pkg = Package::new("t")
            .with("seven", Command::new(|_, _| Ok(Some(MemoryItem::Int(7)))))
            .unwrap();
        launcher.add_package(pkg).unwrap();

        launcher.execute("seven", &[]).unwrap();
        assert_eq!(launcher.memory().active().count(), 1);
        launcher.memory_mut().active_mut().lock();
        launcher.execute("seven", &[]).unwrap();
        assert_eq!(launcher.memory().active().count(), 1);
    }

    #[test]
    fn test_translation_failure_skips_body() {
        let mut launcher = quiet();
        let pkg = Package::new("t")
            .with(
                "typed",
                Command::new(|_, _| -> CommandResult { panic!("body must not run") })
                    .arity(1, Some(1))
                    .typed(&[ArgType::Int]),
            )
            .unwrap();
        launcher.add_package(pkg).unwrap();
        assert!(matches!(
            launcher.execute("typed", &args(&["x"])),
            Err(Cmd9Error::ArgumentTranslation { .. })
        ));
    }

    #[test]
    fn test_reserved_package_names() {
        let mut launcher = quiet();
        assert!(launcher.add_package(Package::new(NATIVE_PACKAGE)).is_err());
        assert!(launcher.add_package(Package::new(CUSTOM_PACKAGE)).is_err());
    }

    #[test]
    fn test_supervised_reports_and_returns_false() {
        let mut launcher = quiet();
        let captured = launcher.run_capture("raise boom");
        assert!(!captured.success);
        assert_eq!(captured.stderr, "raise: boom\n");
    }

    #[test]
    fn test_error_feedback_toggle() {
        let mut launcher = quiet();
        launcher.set_error_feedback(false);
        let captured = launcher.run_capture("raise boom");
        assert!(!captured.success);
        assert!(captured.stderr.is_empty());
    }

    #[test]
    fn test_panic_contained_and_state_restored() {
        let mut launcher = quiet();
        let pkg = Package::new("t")
            .with(
                "explode",
                Command::new(|_, ctx| -> CommandResult {
                    ctx.launcher.memory_mut().add_stack();
                    ctx.launcher.scopes_mut().enter_scope()?;
                    panic!("kaboom")
                }),
            )
            .unwrap();
        launcher.add_package(pkg).unwrap();

        let captured = launcher.run_capture("explode");
        assert!(!captured.success);
        assert!(captured.stderr.contains("kaboom"));
        assert_eq!(launcher.memory().depth(), 1);
        assert_eq!(launcher.scopes().depth(), 1);
        assert_eq!(launcher.call_depth(), 0);
    }

    #[test]
    fn test_call_depth_limit() {
        let mut launcher = Launcher::builder()
            .max_depth(8)
            .stderr(Output::buffer())
            .build()
            .unwrap();
        launcher.run_line("alias loop loop").unwrap();
        assert!(matches!(
            launcher.run_line("loop"),
            Err(Cmd9Error::StackFrameCritical(_))
        ));
        assert_eq!(launcher.call_depth(), 0);
    }

    #[test]
    fn test_comment_and_blank_lines() {
        let mut launcher = quiet();
        assert!(launcher.run_line("").is_ok());
        assert!(launcher.run_line("   ").is_ok());
        assert!(launcher.run_line("// raise nope").is_ok());
    }

    #[test]
    fn test_script_is_fail_fast() {
        let mut launcher = quiet();
        let captured = launcher.run_script_capture("t", "print a\nraise stop\nprint b");
        assert!(!captured.success);
        assert_eq!(captured.stdout, "a\n");
        assert_eq!(captured.stderr, "t:2: raise: stop\n");
    }

    #[test]
    fn test_quit_stops_script() {
        let mut launcher = quiet();
        let captured = launcher.run_script_capture("t", "print a\nquit\nprint b");
        assert!(captured.success);
        assert_eq!(captured.stdout, "a\n");
        assert!(!launcher.is_running());
    }

    #[test]
    fn test_fork_is_independent() {
        let mut launcher = quiet();
        launcher.scopes_mut().store("x", "1");
        let mut child = launcher.fork();
        child.scopes_mut().store("x", "2");
        child.memory_mut().active_mut().push(MemoryItem::Int(1));
        assert_eq!(launcher.scopes().load("x").unwrap(), "1");
        assert!(launcher.memory().active().is_empty());
    }

    #[test]
    fn test_spawn_and_wait() {
        let out = Output::buffer();
        let mut launcher = Launcher::builder().stdout(out.clone()).build().unwrap();
        let id = launcher.spawn("print", &args(&["from job"])).unwrap();
        let results = launcher.wait_jobs();
        assert_eq!(results, vec![(id, true)]);
        assert_eq!(out.contents().unwrap(), "from job\n");
        assert!(launcher.jobs().is_empty());
    }

    #[test]
    fn test_runaway_recursion_in_job_fails_cleanly() {
        let err = Output::buffer();
        let mut launcher = Launcher::builder()
            .stdout(Output::buffer())
            .stderr(err.clone())
            .build()
            .unwrap();
        launcher.run_line("#action m run m").unwrap();
        launcher.run_line("async run #!m").unwrap();
        assert_eq!(launcher.wait_jobs(), vec![(1, false)]);
        assert!(err
            .contents()
            .unwrap()
            .contains(&format!("call depth limit of {DEFAULT_MAX_DEPTH} reached")));
        assert!(launcher.run_line("print still here").is_ok());
    }

    #[test]
    fn test_thread_stack_grows_with_depth_limit() {
        assert_eq!(thread_stack_size(0), MIN_THREAD_STACK);
        assert!(thread_stack_size(DEFAULT_MAX_DEPTH) >= MIN_THREAD_STACK);
        assert_eq!(thread_stack_size(10_000), 10_000 * STACK_PER_CALL_LEVEL);
        assert_eq!(thread_stack_size(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_capture_collects_output_of_jobs_it_started() {
        let out = Output::buffer();
        let mut launcher = Launcher::builder()
            .stdout(out.clone())
            .stderr(Output::buffer())
            .build()
            .unwrap();
        let earlier = launcher.spawn("print", &args(&["earlier"])).unwrap();

        let captured = launcher.run_capture("async chain 'repeat 200 equals a a' 'print late'");
        assert!(captured.success);
        assert!(captured.stdout.contains("started\n"));
        assert!(captured.stdout.contains("late\n"));

        assert_eq!(launcher.wait_jobs(), vec![(earlier, true)]);
        assert_eq!(out.contents().unwrap(), "earlier\n");
    }

    #[test]
    fn test_reap_forgets_finished_jobs() {
        let mut launcher = quiet();
        let id = launcher.spawn("print", &args(&["x"])).unwrap();
        while !launcher.jobs().iter().all(|job| job.finished) {
            std::thread::yield_now();
        }
        assert_eq!(launcher.reap_jobs(), vec![(id, true)]);
        assert!(launcher.jobs().is_empty());
        assert!(launcher.reap_jobs().is_empty());
    }

    #[test]
    fn test_template_prompt() {
        let mut launcher = quiet();
        launcher.set_prompt_renderer(template_prompt("[{depth}]{mode}{stack}/{frames}> "));
        assert_eq!(launcher.render_prompt().unwrap(), "[1]0/1> ");
        launcher.scopes_mut().enter_global().unwrap();
        launcher.memory_mut().active_mut().push(MemoryItem::Bool(true));
        assert_eq!(launcher.render_prompt().unwrap(), "[1]*1/1> ");
    }
}
