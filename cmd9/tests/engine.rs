//! End-to-end engine properties: tokenizer, arity, frame balance, scopes,
//! preprocessing order and interpolation.

use cmd9::lexer::split;
use cmd9::scope::ScopeManager;
use cmd9::{
    Cmd9Error, Cmd9Result, Command, Launcher, Macro, MemoryItem, Output, Package, PreprocessPass,
};
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<Vec<String>>>>;

fn launcher() -> Launcher {
    Launcher::builder()
        .stdout(Output::buffer())
        .stderr(Output::buffer())
        .build()
        .unwrap()
}

/// A launcher with a `record` command that logs every argument list it sees.
fn recording_launcher() -> (Launcher, Calls) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&calls);
    let record = Command::new(move |args, _ctx| {
        log.lock().unwrap().push(args.rest(0));
        Ok(None)
    })
    .describe("Record the arguments", "record [ARG]...");
    let probe = Package::new("probe").with("record", record).unwrap();

    let l = Launcher::builder()
        .stdout(Output::buffer())
        .stderr(Output::buffer())
        .package(probe)
        .build()
        .unwrap();
    (l, calls)
}

#[test]
fn tokenizer_examples() {
    assert_eq!(split(r#"a "b c" d"#).unwrap(), vec!["a", "b c", "d"]);
    assert_eq!(
        split("print 'runs to the end").unwrap(),
        vec!["print", "runs to the end"]
    );
    assert!(split("").unwrap().is_empty());
    assert!(split("   ").unwrap().is_empty());
}

#[test]
fn arity_bounds_are_inclusive() {
    let cmd = Command::new(|_, _| Ok(None)).arity(1, Some(3));
    assert!(matches!(
        cmd.check_arity("c", 0),
        Err(Cmd9Error::TooFewArguments { min: 1, got: 0, .. })
    ));
    for got in 1..=3 {
        assert!(cmd.check_arity("c", got).is_ok());
    }
    assert!(matches!(
        cmd.check_arity("c", 4),
        Err(Cmd9Error::TooManyArguments { max: 3, got: 4, .. })
    ));
}

fn nest(l: &mut Launcher, levels: usize, extra: usize) -> Cmd9Result<()> {
    if levels == 0 {
        return Ok(());
    }
    l.isolated(|l| {
        for _ in 0..extra {
            l.memory_mut().add_stack();
            l.memory_mut().active_mut().push(MemoryItem::text("scratch"));
        }
        nest(l, levels - 1, extra)
    })
}

#[test]
fn nested_isolated_runs_restore_frame_depth() {
    for levels in 1..=4 {
        for extra in 0..=3 {
            let mut l = launcher();
            l.run_line("push-frame").unwrap();
            let before = l.memory().depth();
            nest(&mut l, levels, extra).unwrap();
            assert_eq!(l.memory().depth(), before, "levels={levels} extra={extra}");
        }
    }
}

#[test]
fn isolated_runs_restore_frame_depth_on_error() {
    let mut l = launcher();
    let before = l.memory().depth();
    let result: Cmd9Result<()> = l.isolated(|l| {
        l.memory_mut().add_stack();
        l.memory_mut().add_stack();
        Err(Cmd9Error::raised("fail inside"))
    });
    assert!(result.is_err());
    assert_eq!(l.memory().depth(), before);

    assert!(!l.run_capture("isolated chain push-frame push-frame 'raise x'").success);
    assert_eq!(l.memory().depth(), before);
}

#[test]
fn global_never_sees_locals() {
    let mut scopes = ScopeManager::new();
    scopes.enter_scope().unwrap();
    scopes.store("x", "1");
    scopes.enter_global().unwrap();
    assert!(matches!(
        scopes.load("x"),
        Err(Cmd9Error::UndefinedVariable(name)) if name == "x"
    ));
}

#[test]
fn locals_fall_back_to_global() {
    let mut scopes = ScopeManager::new();
    scopes.enter_global().unwrap();
    scopes.store("y", "2");
    scopes.exit_global().unwrap();
    scopes.enter_scope().unwrap();
    assert_eq!(scopes.load("y").unwrap(), "2");

    scopes.store("y", "local");
    assert_eq!(scopes.load("y").unwrap(), "local");
    assert_eq!(scopes.global().get("y"), Some("2"));
}

#[test]
fn temp_scope_boundary_holds_until_owner_returns() {
    let mut l = launcher();
    assert!(matches!(
        l.run_line("scoped exit-scope"),
        Err(Cmd9Error::ScopeDiscipline(_))
    ));
    assert!(matches!(
        l.run_line("scoped chain enter-scope exit-scope exit-scope"),
        Err(Cmd9Error::ScopeDiscipline(_))
    ));
    assert_eq!(l.scopes().depth(), 1);

    l.run_line("enter-scope").unwrap();
    l.run_line("exit-scope").unwrap();
    assert_eq!(l.scopes().depth(), 1);
}

#[test]
fn temp_global_refuses_early_exit() {
    let mut l = launcher();
    assert!(matches!(
        l.run_line("globally exit-global"),
        Err(Cmd9Error::ScopeDiscipline(_))
    ));
    assert!(!l.scopes().is_global());
}

struct TagPass {
    tag: &'static str,
    priority: i32,
    order: Arc<Mutex<Vec<&'static str>>>,
}

impl PreprocessPass for TagPass {
    fn name(&self) -> &str {
        self.tag
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn apply(&self, text: &str, _launcher: &mut Launcher) -> Cmd9Result<String> {
        self.order.lock().unwrap().push(self.tag);
        Ok(text.to_string())
    }
}

#[test]
fn passes_run_in_ascending_priority() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut l = launcher();
    for (tag, priority) in [("late", 150), ("first", -5), ("middle", 50)] {
        l.add_pass(Arc::new(TagPass {
            tag,
            priority,
            order: Arc::clone(&order),
        }));
    }

    l.preprocess("x", &[]).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["first", "middle", "late"]);

    let priorities: Vec<i32> = l.pipeline().passes().iter().map(|p| p.priority()).collect();
    let mut sorted = priorities.clone();
    sorted.sort_unstable();
    assert_eq!(priorities, sorted);
    assert_eq!(priorities.first(), Some(&i32::MIN));
}

#[test]
fn reserved_names_cannot_be_overridden() {
    let mut l = launcher();
    assert!(l.define_macro("#define", Macro::text("print")).is_err());

    // A user macro matching part of a reserved name leaves it intact.
    l.define_macro("define", Macro::text("oops")).unwrap();
    l.run_line("#define k v").unwrap();
    assert!(l.macros().contains_key("k"));
    assert_eq!(l.run_capture("print #undef").stdout, "#undef\n");
}

#[test]
fn interpolation_with_limit() {
    let mut scopes = ScopeManager::new();
    scopes.store("x", "1");
    scopes.store("y", "2");
    assert_eq!(scopes.interpolate("$x$ and $y$", None).unwrap(), "1 and 2");
    assert_eq!(scopes.interpolate("$x$ and $y$", Some(1)).unwrap(), "1 and $y$");

    let mut l = Launcher::builder()
        .stdout(Output::buffer())
        .stderr(Output::buffer())
        .interpolation_limit(Some(1))
        .build()
        .unwrap();
    l.run_line("set x 1").unwrap();
    l.run_line("set y 2").unwrap();
    assert_eq!(l.run_capture("print '$x$ and $y$'").stdout, "1 and $y$\n");
}

#[test]
fn macro_result_rewrites_argument_before_dispatch() {
    let (mut l, calls) = recording_launcher();
    l.run_line("#call answer push 42").unwrap();
    l.run_line("record answer").unwrap();
    assert_eq!(*calls.lock().unwrap(), vec![vec!["42".to_string()]]);
    assert!(l.memory().active().is_empty());
}

#[test]
fn repeat_invokes_with_identical_arguments() {
    let (mut l, calls) = recording_launcher();
    l.run_line("repeat 3 record a 'b c'").unwrap();
    let expected = vec!["a".to_string(), "b c".to_string()];
    assert_eq!(*calls.lock().unwrap(), vec![expected.clone(), expected.clone(), expected]);
}

#[test]
fn isolated_run_leaves_outer_items_untouched() {
    let mut l = launcher();
    l.run_line("push first").unwrap();
    l.run_line("push second").unwrap();
    let depth = l.memory().depth();

    l.run_line("isolated repeat 5 push extra").unwrap();

    assert_eq!(l.memory().depth(), depth);
    let items: Vec<String> = l.memory().active().iter().map(ToString::to_string).collect();
    assert_eq!(items, vec!["second", "first"]);
}

#[test]
fn instances_are_independent() {
    let mut a = launcher();
    let mut b = launcher();
    a.run_line("feedback off").unwrap();
    a.run_line("set who a").unwrap();
    assert!(b.feedback_enabled());
    assert!(b.run_line("get who").is_err());
}
