//! Snippet script executor: one sandboxed Luau state per preview instance,
//! with a `container` API over the shared render surface, captured print
//! output, event handler bindings, and a logical-clock timer queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mlua::{Lua, VmState};
use serde::Serialize;

use crate::config::PreviewLimits;
use kitbash_dom::{DomResult, NodeId, Surface, Tree};

/// 1 MB memory limit per script state.
pub const SCRIPT_MEMORY_LIMIT_BYTES: usize = 1024 * 1024;

/// The render surface cell an executor writes through. Teardown empties the
/// cell; container calls arriving afterwards see `None` and degrade to
/// no-ops instead of erroring.
pub type SharedSurface = Arc<Mutex<Option<Surface>>>;

/// Where in the instance lifecycle a script fault occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPhase {
    /// The top-level run at activation.
    Run,
    /// An event handler invocation.
    Handler,
    /// A deferred timer callback.
    Timer,
}

/// A recorded script fault, JSON-serializable so hosts can surface it
/// without access to Rust logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptDiagnostic {
    pub phase: ScriptPhase,
    pub message: String,
}

struct Handler {
    event: String,
    nodes: Vec<NodeId>,
    callback: mlua::Function,
}

struct TimerEntry {
    due_ms: u64,
    seq: u64,
    callback: mlua::Function,
}

#[derive(Default)]
struct TimerQueue {
    clock_ms: u64,
    next_seq: u64,
    entries: Vec<TimerEntry>,
}

fn dom_err(e: kitbash_dom::DomError) -> mlua::Error {
    mlua::Error::RuntimeError(e.to_string())
}

/// `event.target` for a node: `#id` when the node carries a non-empty id
/// attribute, the tag name otherwise.
fn describe_node(tree: &Tree, node: NodeId) -> String {
    match tree.attr(node, "id") {
        Some(id) if !id.is_empty() => format!("#{}", id),
        _ => tree.tag(node).unwrap_or_default().to_string(),
    }
}

/// Sandboxed script state for one preview instance. Created fresh on every
/// activation and dropped on the next one; it never migrates between
/// surfaces.
pub struct Executor {
    lua: Lua,
    surface: SharedSurface,
    output: Arc<Mutex<Vec<String>>>,
    handlers: Arc<Mutex<Vec<Handler>>>,
    timers: Arc<Mutex<TimerQueue>>,
    diagnostics: Vec<ScriptDiagnostic>,
    budget: Option<Arc<AtomicU64>>,
}

impl Executor {
    /// Build a sandboxed Luau state wired to `surface`: ambient capabilities
    /// blocked, memory capped, `print` captured, and the `container` API
    /// registered.
    pub fn new(surface: SharedSurface, limits: &PreviewLimits) -> Result<Executor, mlua::Error> {
        let lua = Lua::new();
        let _ = lua.sandbox(true);

        for name in ["io", "os", "require", "loadfile", "dofile", "debug"] {
            let msg = format!("{} is not available in snippet scripts", name);
            lua.globals().set(
                name,
                lua.create_function(move |_, _: mlua::Value| {
                    Err::<(), _>(mlua::Error::RuntimeError(msg.clone()))
                })?,
            )?;
        }

        // Optional step budget: the interrupt fires periodically during
        // execution and aborts the current entry once the counter passes
        // the configured cap. The counter is reset before every entry.
        let budget = match limits.instruction_budget {
            Some(max_steps) => {
                let used = Arc::new(AtomicU64::new(0));
                let counter = used.clone();
                lua.set_interrupt(move |_| {
                    if counter.fetch_add(1, Ordering::Relaxed) >= max_steps {
                        return Err(mlua::Error::RuntimeError(
                            "script exceeded its step budget".to_string(),
                        ));
                    }
                    Ok(VmState::Continue)
                });
                Some(used)
            }
            None => None,
        };

        lua.set_memory_limit(limits.memory_limit_bytes)?;

        let output = Arc::new(Mutex::new(Vec::new()));
        let sink = output.clone();
        lua.globals().set(
            "print",
            lua.create_function(move |_, args: mlua::Variadic<String>| {
                sink.lock().unwrap().push(args.join("\t"));
                Ok(())
            })?,
        )?;

        let handlers: Arc<Mutex<Vec<Handler>>> = Arc::new(Mutex::new(Vec::new()));
        let timers: Arc<Mutex<TimerQueue>> = Arc::new(Mutex::new(TimerQueue::default()));

        // The surface lock is taken per call and released before returning
        // into Lua, so callbacks invoked later can take it again.
        let container = lua.create_table()?;
        let s1 = surface.clone();
        container.set(
            "set_text",
            lua.create_function(move |_, (selector, text): (String, String)| {
                match s1.lock().unwrap().as_mut() {
                    Some(surface) => surface.set_text(&selector, &text).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        let s2 = surface.clone();
        container.set(
            "get_text",
            lua.create_function(move |_, selector: String| {
                match s2.lock().unwrap().as_ref() {
                    Some(surface) => surface.get_text(&selector).map_err(dom_err),
                    None => Ok(None),
                }
            })?,
        )?;
        let s3 = surface.clone();
        container.set(
            "set_markup",
            lua.create_function(move |_, (selector, markup): (String, String)| {
                match s3.lock().unwrap().as_mut() {
                    Some(surface) => surface.set_markup(&selector, &markup).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        let s4 = surface.clone();
        container.set(
            "set_attr",
            lua.create_function(move |_, (selector, name, value): (String, String, String)| {
                match s4.lock().unwrap().as_mut() {
                    Some(surface) => surface.set_attr(&selector, &name, &value).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        let s5 = surface.clone();
        container.set(
            "get_attr",
            lua.create_function(move |_, (selector, name): (String, String)| {
                match s5.lock().unwrap().as_ref() {
                    Some(surface) => surface.get_attr(&selector, &name).map_err(dom_err),
                    None => Ok(None),
                }
            })?,
        )?;
        let s6 = surface.clone();
        container.set(
            "add_class",
            lua.create_function(move |_, (selector, class): (String, String)| {
                match s6.lock().unwrap().as_mut() {
                    Some(surface) => surface.add_class(&selector, &class).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        let s7 = surface.clone();
        container.set(
            "remove_class",
            lua.create_function(move |_, (selector, class): (String, String)| {
                match s7.lock().unwrap().as_mut() {
                    Some(surface) => surface.remove_class(&selector, &class).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        let s8 = surface.clone();
        container.set(
            "toggle_class",
            lua.create_function(move |_, (selector, class): (String, String)| {
                match s8.lock().unwrap().as_mut() {
                    Some(surface) => surface.toggle_class(&selector, &class).map_err(dom_err),
                    None => Ok(false),
                }
            })?,
        )?;
        let s9 = surface.clone();
        container.set(
            "has_class",
            lua.create_function(move |_, (selector, class): (String, String)| {
                match s9.lock().unwrap().as_ref() {
                    Some(surface) => surface.has_class(&selector, &class).map_err(dom_err),
                    None => Ok(false),
                }
            })?,
        )?;
        let s10 = surface.clone();
        container.set(
            "set_style",
            lua.create_function(move |_, (selector, decls): (String, String)| {
                match s10.lock().unwrap().as_mut() {
                    Some(surface) => surface.set_style(&selector, &decls).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        let s11 = surface.clone();
        container.set(
            "count",
            lua.create_function(move |_, selector: String| {
                match s11.lock().unwrap().as_ref() {
                    Some(surface) => surface.count(&selector).map_err(dom_err),
                    None => Ok(0),
                }
            })?,
        )?;
        // Handlers bind to the nodes matching the selector now; nodes added
        // to the surface later never join an existing binding.
        let s12 = surface.clone();
        let registry = handlers.clone();
        container.set(
            "on",
            lua.create_function(
                move |_, (selector, event, callback): (String, String, mlua::Function)| {
                    let nodes = match s12.lock().unwrap().as_ref() {
                        Some(surface) => surface.query(&selector).map_err(dom_err)?,
                        None => Vec::new(),
                    };
                    let bound = nodes.len();
                    if bound > 0 {
                        registry.lock().unwrap().push(Handler { event, nodes, callback });
                    }
                    Ok(bound)
                },
            )?,
        )?;
        let queue = timers.clone();
        container.set(
            "defer",
            lua.create_function(move |_, (delay_ms, callback): (f64, mlua::Function)| {
                let mut queue = queue.lock().unwrap();
                let due_ms = queue.clock_ms.saturating_add(delay_ms.max(0.0) as u64);
                let seq = queue.next_seq;
                queue.next_seq += 1;
                queue.entries.push(TimerEntry { due_ms, seq, callback });
                Ok(())
            })?,
        )?;
        lua.globals().set("container", container)?;

        Ok(Executor {
            lua,
            surface,
            output,
            handlers,
            timers,
            diagnostics: Vec::new(),
            budget,
        })
    }

    /// Execute a chunk at the top level. Faults are recorded and returned;
    /// surface mutations made before the fault persist.
    pub fn run(&mut self, script: &str) -> Result<(), String> {
        self.reset_budget();
        match self.lua.load(script).exec() {
            Ok(()) => Ok(()),
            Err(e) => {
                let message = e.to_string();
                self.push_diagnostic(ScriptPhase::Run, message.clone());
                Err(message)
            }
        }
    }

    /// Deliver an event to every handler bound to a node currently matching
    /// `selector`. Returns the number of handler invocations; a handler
    /// fault becomes a diagnostic, never an error. An invalid selector is
    /// the caller's mistake and is returned as one.
    pub fn dispatch(&mut self, event: &str, selector: &str, value: Option<&str>) -> DomResult<usize> {
        let targets = {
            let guard = self.surface.lock().unwrap();
            match guard.as_ref() {
                Some(surface) => surface.query(selector)?,
                None => return Ok(0),
            }
        };
        if targets.is_empty() {
            return Ok(0);
        }

        // Snapshot matching bindings before invoking anything: a handler
        // that rebinds or tears down must not affect this delivery round.
        let work: Vec<(mlua::Function, NodeId)> = {
            let handlers = self.handlers.lock().unwrap();
            handlers
                .iter()
                .filter(|h| h.event == event)
                .flat_map(|h| {
                    h.nodes
                        .iter()
                        .copied()
                        .filter(|node| targets.contains(node))
                        .map(|node| (h.callback.clone(), node))
                        .collect::<Vec<_>>()
                })
                .collect()
        };

        self.reset_budget();
        let mut invoked = 0;
        for (callback, node) in work {
            let target = {
                let guard = self.surface.lock().unwrap();
                guard
                    .as_ref()
                    .map(|surface| describe_node(surface.tree(), node))
                    .unwrap_or_default()
            };
            let result = self.lua.create_table().and_then(|event_arg| {
                event_arg.set("type", event)?;
                event_arg.set("target", target.as_str())?;
                if let Some(value) = value {
                    event_arg.set("value", value)?;
                }
                callback.call::<()>(event_arg)
            });
            if let Err(e) = result {
                self.push_diagnostic(ScriptPhase::Handler, e.to_string());
            }
            invoked += 1;
        }
        Ok(invoked)
    }

    /// Advance the logical clock by `ms` and run every due callback in
    /// (due time, registration order). Callbacks scheduled during this tick
    /// wait for the next one, so a zero-delay self-rescheduling timer runs
    /// once per tick instead of spinning forever.
    pub fn tick(&mut self, ms: u64) -> usize {
        self.reset_budget();
        let (now, cutoff) = {
            let mut queue = self.timers.lock().unwrap();
            queue.clock_ms = queue.clock_ms.saturating_add(ms);
            (queue.clock_ms, queue.next_seq)
        };
        let mut ran = 0;
        loop {
            let next = {
                let mut queue = self.timers.lock().unwrap();
                let idx = queue
                    .entries
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| e.due_ms <= now && e.seq < cutoff)
                    .min_by_key(|(_, e)| (e.due_ms, e.seq))
                    .map(|(idx, _)| idx);
                idx.map(|idx| queue.entries.remove(idx))
            };
            let Some(entry) = next else {
                break;
            };
            if let Err(e) = entry.callback.call::<()>(()) {
                self.push_diagnostic(ScriptPhase::Timer, e.to_string());
            }
            ran += 1;
        }
        ran
    }

    /// Lines captured from `print`, in emission order.
    pub fn output(&self) -> Vec<String> {
        self.output.lock().unwrap().clone()
    }

    pub fn diagnostics(&self) -> &[ScriptDiagnostic] {
        &self.diagnostics
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.lock().unwrap().entries.len()
    }

    pub fn clock_ms(&self) -> u64 {
        self.timers.lock().unwrap().clock_ms
    }

    fn reset_budget(&self) {
        if let Some(used) = &self.budget {
            used.store(0, Ordering::Relaxed);
        }
    }

    fn push_diagnostic(&mut self, phase: ScriptPhase, message: String) {
        const MAX_DIAGNOSTICS: usize = 32;
        log::debug!("script fault in {:?} phase: {}", phase, message);
        self.diagnostics.push(ScriptDiagnostic { phase, message });
        if self.diagnostics.len() > MAX_DIAGNOSTICS {
            let excess = self.diagnostics.len() - MAX_DIAGNOSTICS;
            self.diagnostics.drain(0..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitbash_dom::ParseLimits;

    fn shared_surface(markup: &str) -> SharedSurface {
        let surface = Surface::build(markup, "", "kbtest", ParseLimits::default()).unwrap();
        Arc::new(Mutex::new(Some(surface)))
    }

    fn executor_over(markup: &str) -> Executor {
        Executor::new(shared_surface(markup), &PreviewLimits::default()).unwrap()
    }

    #[test]
    fn test_print_capture_joins_arguments_with_tabs() {
        let mut ex = executor_over("<div>x</div>");
        ex.run("print(\"a\", \"b\")\nprint(tostring(42))").unwrap();
        assert_eq!(ex.output(), vec!["a\tb".to_string(), "42".to_string()]);
    }

    #[test]
    fn test_container_ops_mutate_the_surface() {
        let surface = shared_surface("<button class=\"btn\">Go</button>");
        let mut ex = Executor::new(surface.clone(), &PreviewLimits::default()).unwrap();
        ex.run(
            "container.set_text(\".btn\", \"Stop\")\n\
             container.add_class(\".btn\", \"armed\")\n\
             print(tostring(container.count(\"button\")))\n\
             if container.get_text(\".ghost\") == nil then print(\"missing is nil\") end",
        )
        .unwrap();

        let guard = surface.lock().unwrap();
        let surface = guard.as_ref().unwrap();
        assert_eq!(surface.get_text(".btn").unwrap().as_deref(), Some("Stop"));
        assert!(surface.has_class(".btn", "armed").unwrap());
        drop(guard);
        assert_eq!(ex.output(), vec!["1".to_string(), "missing is nil".to_string()]);
    }

    #[test]
    fn test_compile_fault_is_recorded() {
        let mut ex = executor_over("<div>x</div>");
        let err = ex.run("this is not a script").unwrap_err();
        assert!(!err.is_empty());
        assert_eq!(ex.diagnostics().len(), 1);
        assert_eq!(ex.diagnostics()[0].phase, ScriptPhase::Run);
    }

    #[test]
    fn test_runtime_fault_keeps_partial_effects() {
        let surface = shared_surface("<p class=\"msg\">before</p>");
        let mut ex = Executor::new(surface.clone(), &PreviewLimits::default()).unwrap();
        let err = ex.run("container.set_text(\".msg\", \"after\")\nerror(\"boom\")").unwrap_err();
        assert!(err.contains("boom"));

        let guard = surface.lock().unwrap();
        let text = guard.as_ref().unwrap().get_text(".msg").unwrap();
        assert_eq!(text.as_deref(), Some("after"));
    }

    #[test]
    fn test_ambient_globals_are_blocked() {
        let mut ex = executor_over("<div>x</div>");
        let err = ex.run("require(\"socket\")").unwrap_err();
        assert!(err.contains("not available"));
    }

    #[test]
    fn test_second_run_shares_the_state() {
        let mut ex = executor_over("<div>x</div>");
        ex.run("counter = 1").unwrap();
        ex.run("counter = counter + 1\nprint(tostring(counter))").unwrap();
        assert_eq!(ex.output(), vec!["2".to_string()]);
    }

    #[test]
    fn test_second_run_keeps_earlier_handlers_bound() {
        let mut ex = executor_over("<button id=\"a\">A</button><button id=\"b\">B</button>");
        ex.run("container.on('#a', 'click', function() print('first') end)")
            .unwrap();
        ex.run("container.on('#b', 'click', function() print('second') end)")
            .unwrap();

        assert_eq!(ex.dispatch("click", "#a", None).unwrap(), 1);
        assert_eq!(ex.dispatch("click", "#b", None).unwrap(), 1);
        assert_eq!(ex.output(), vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_dispatch_invokes_bound_handlers_with_event_fields() {
        let mut ex = executor_over("<button id=\"go\" class=\"btn\">Go</button>");
        ex.run(
            "container.on(\".btn\", \"click\", function(e)\n\
               container.set_text(\".btn\", e.type .. \"@\" .. e.target)\n\
             end)",
        )
        .unwrap();

        let invoked = ex.dispatch("click", ".btn", None).unwrap();
        assert_eq!(invoked, 1);

        let guard = ex.surface.lock().unwrap();
        let text = guard.as_ref().unwrap().get_text(".btn").unwrap();
        assert_eq!(text.as_deref(), Some("click@#go"));
    }

    #[test]
    fn test_dispatch_passes_the_event_value() {
        let mut ex = executor_over("<input id=\"vol\" type=\"range\">");
        ex.run(
            "container.on(\"#vol\", \"input\", function(e)\n\
               print(\"vol=\" .. e.value)\n\
             end)",
        )
        .unwrap();

        ex.dispatch("input", "#vol", Some("72")).unwrap();
        assert_eq!(ex.output(), vec!["vol=72".to_string()]);
    }

    #[test]
    fn test_dispatch_without_targets_or_handlers_is_quiet() {
        let mut ex = executor_over("<button class=\"btn\">Go</button>");
        ex.run("container.on(\".btn\", \"click\", function() print(\"hit\") end)").unwrap();

        assert_eq!(ex.dispatch("click", ".nope", None).unwrap(), 0);
        assert_eq!(ex.dispatch("hover", ".btn", None).unwrap(), 0);
        assert!(ex.dispatch("click", "..", None).is_err());
        assert!(ex.output().is_empty());
    }

    #[test]
    fn test_binding_an_unmatched_selector_binds_nothing() {
        let mut ex = executor_over("<button class=\"btn\">Go</button>");
        ex.run("print(tostring(container.on(\".ghost\", \"click\", function() end)))").unwrap();
        assert_eq!(ex.output(), vec!["0".to_string()]);
    }

    #[test]
    fn test_handler_fault_becomes_a_diagnostic() {
        let mut ex = executor_over("<button class=\"btn\">Go</button>");
        ex.run("container.on(\".btn\", \"click\", function() error(\"bad handler\") end)").unwrap();

        let invoked = ex.dispatch("click", ".btn", None).unwrap();
        assert_eq!(invoked, 1);
        assert_eq!(ex.diagnostics().len(), 1);
        assert_eq!(ex.diagnostics()[0].phase, ScriptPhase::Handler);
        assert!(ex.diagnostics()[0].message.contains("bad handler"));
    }

    #[test]
    fn test_diagnostics_are_capped() {
        let mut ex = executor_over("<button class=\"btn\">Go</button>");
        ex.run("container.on(\".btn\", \"click\", function() error(\"x\") end)").unwrap();
        for _ in 0..40 {
            ex.dispatch("click", ".btn", None).unwrap();
        }
        assert_eq!(ex.diagnostics().len(), 32);
    }

    #[test]
    fn test_timers_run_in_due_then_registration_order() {
        let mut ex = executor_over("<div>x</div>");
        ex.run(
            "container.defer(200, function() print(\"late\") end)\n\
             container.defer(100, function() print(\"early\") end)\n\
             container.defer(100, function() print(\"second\") end)",
        )
        .unwrap();

        assert_eq!(ex.pending_timers(), 3);
        assert_eq!(ex.tick(50), 0);
        assert_eq!(ex.tick(200), 3);
        assert_eq!(
            ex.output(),
            vec!["early".to_string(), "second".to_string(), "late".to_string()]
        );
        assert_eq!(ex.clock_ms(), 250);
    }

    #[test]
    fn test_rescheduling_timer_waits_for_the_next_tick() {
        let mut ex = executor_over("<div>x</div>");
        ex.run(
            "local function again()\n\
               print(\"t\")\n\
               container.defer(0, again)\n\
             end\n\
             container.defer(0, again)",
        )
        .unwrap();

        assert_eq!(ex.tick(10), 1);
        assert_eq!(ex.pending_timers(), 1);
        assert_eq!(ex.tick(0), 1);
        assert_eq!(ex.output(), vec!["t".to_string(), "t".to_string()]);
    }

    #[test]
    fn test_stale_timer_after_surface_removal_is_a_no_op() {
        let surface = shared_surface("<p class=\"msg\">hi</p>");
        let mut ex = Executor::new(surface.clone(), &PreviewLimits::default()).unwrap();
        ex.run(
            "container.defer(100, function()\n\
               print(\"fired \" .. tostring(container.set_text(\".msg\", \"late\")))\n\
             end)",
        )
        .unwrap();

        *surface.lock().unwrap() = None;
        assert_eq!(ex.tick(100), 1);
        assert_eq!(ex.output(), vec!["fired 0".to_string()]);
        assert!(ex.diagnostics().is_empty());
    }

    #[test]
    fn test_step_budget_aborts_a_runaway_script() {
        let limits = PreviewLimits {
            instruction_budget: Some(1_000),
            ..PreviewLimits::default()
        };
        let mut ex = Executor::new(shared_surface("<div>x</div>"), &limits).unwrap();
        let err = ex.run("while true do end").unwrap_err();
        assert!(err.contains("step budget"));

        // The budget resets per entry, so the state stays usable.
        ex.run("print(\"still alive\")").unwrap();
        assert_eq!(ex.output(), vec!["still alive".to_string()]);
    }
}
