//! Preview instance lifecycle: build a surface from a fragment triple, run
//! the script against it, and tear the surface down when the host is done.
//! Every refresh is a full rebuild; nothing is patched in place.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::PreviewLimits;
use crate::script::{Executor, ScriptDiagnostic, SharedSurface};
use crate::snippet::FragmentSet;
use kitbash_dom::{DomResult, Surface};

/// Source of scope tokens. Global so two controllers on one host page can
/// never scope their styles to the same token.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

fn next_token() -> String {
    format!("kb{}", NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
}

/// Outcome of the most recent activation. A fault is a value here, never a
/// panic or an error bubbling out of `activate`; hosts branch on it to show
/// either the preview or an "unavailable" placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PreviewStatus {
    Ok,
    RenderFault { message: String },
    ScriptFault { message: String },
}

impl PreviewStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, PreviewStatus::Ok)
    }
}

impl fmt::Display for PreviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewStatus::Ok => f.write_str("ok"),
            PreviewStatus::RenderFault { message } => write!(f, "render-fault: {}", message),
            PreviewStatus::ScriptFault { message } => write!(f, "script-fault: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// No activation has happened yet.
    Empty,
    /// An instance is live (possibly faulted).
    Active,
    /// The surface was destroyed; the instance is gone.
    TornDown,
}

/// Owns the single preview instance of one context. The surface cell is
/// shared with the executor for the controller's whole lifetime, so
/// emptying it on teardown is the entire cleanup: container calls from
/// stale callbacks find `None` and do nothing.
pub struct PreviewController {
    limits: PreviewLimits,
    surface: SharedSurface,
    executor: Option<Executor>,
    state: PreviewState,
    status: PreviewStatus,
    token: Option<String>,
}

impl PreviewController {
    pub fn new(limits: PreviewLimits) -> Self {
        PreviewController {
            limits,
            surface: Arc::new(Mutex::new(None)),
            executor: None,
            state: PreviewState::Empty,
            status: PreviewStatus::Ok,
            token: None,
        }
    }

    /// Replace whatever instance exists with a fresh one built from
    /// `fragments`. The previous surface and executor are discarded first,
    /// so at no point do two instances overlap.
    ///
    /// A markup guard failure leaves no surface and reports a render fault.
    /// A script fault keeps the rendered surface; whatever the script did
    /// before faulting persists.
    pub fn activate(&mut self, fragments: &FragmentSet) -> PreviewStatus {
        *self.surface.lock().unwrap() = None;
        self.executor = None;
        self.state = PreviewState::Active;

        let token = next_token();
        let surface = match Surface::build(
            &fragments.markup,
            &fragments.style,
            &token,
            self.limits.parse_limits(),
        ) {
            Ok(surface) => surface,
            Err(e) => {
                log::debug!("render fault: {}", e);
                self.token = Some(token);
                self.status = PreviewStatus::RenderFault { message: e.to_string() };
                return self.status.clone();
            }
        };
        *self.surface.lock().unwrap() = Some(surface);
        self.token = Some(token);

        let mut executor = match Executor::new(self.surface.clone(), &self.limits) {
            Ok(executor) => executor,
            Err(e) => {
                log::debug!("script state setup failed: {}", e);
                self.status = PreviewStatus::ScriptFault { message: e.to_string() };
                return self.status.clone();
            }
        };
        self.status = match executor.run(&fragments.script) {
            Ok(()) => PreviewStatus::Ok,
            Err(message) => PreviewStatus::ScriptFault { message },
        };
        self.executor = Some(executor);
        self.status.clone()
    }

    /// Full rebuild from the current fragments. Identical to `activate`;
    /// the name marks call sites reacting to an edit.
    pub fn refresh(&mut self, fragments: &FragmentSet) -> PreviewStatus {
        self.activate(fragments)
    }

    /// Destroy the surface. The executor stays behind so stale timers can
    /// still fire; their surface writes land in the empty cell as no-ops.
    pub fn teardown(&mut self) {
        *self.surface.lock().unwrap() = None;
        if self.state != PreviewState::Empty {
            self.state = PreviewState::TornDown;
        }
    }

    /// Forward an event to the live executor. Harmless when no instance
    /// exists or the surface is gone.
    pub fn dispatch(&mut self, event: &str, selector: &str, value: Option<&str>) -> DomResult<usize> {
        match self.executor.as_mut() {
            Some(executor) => executor.dispatch(event, selector, value),
            None => Ok(0),
        }
    }

    /// Advance the instance's logical clock, running due timer callbacks.
    pub fn tick(&mut self, ms: u64) -> usize {
        match self.executor.as_mut() {
            Some(executor) => executor.tick(ms),
            None => 0,
        }
    }

    /// Serialized markup of the current surface, styles applied. `None`
    /// whenever there is nothing presentable: no activation yet, torn
    /// down, or the last activation faulted.
    pub fn html(&self) -> Option<String> {
        if !self.status.is_ok() {
            return None;
        }
        self.surface.lock().unwrap().as_ref().map(Surface::to_html)
    }

    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// Scope token of the current instance, unique across all instances
    /// in the process.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Print output captured from the instance's script.
    pub fn output(&self) -> Vec<String> {
        self.executor.as_ref().map(Executor::output).unwrap_or_default()
    }

    /// Script faults recorded by the instance, oldest first, bounded.
    pub fn diagnostics(&self) -> Vec<ScriptDiagnostic> {
        self.executor
            .as_ref()
            .map(|executor| executor.diagnostics().to_vec())
            .unwrap_or_default()
    }
}

impl Default for PreviewController {
    fn default() -> Self {
        PreviewController::new(PreviewLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_process_unique() {
        let a = next_token();
        let b = next_token();
        assert_ne!(a, b);
        assert!(a.starts_with("kb"));
    }

    #[test]
    fn test_empty_controller_is_inert() {
        let mut controller = PreviewController::default();
        assert_eq!(controller.state(), PreviewState::Empty);
        assert_eq!(controller.html(), None);
        assert_eq!(controller.dispatch("click", ".btn", None).unwrap(), 0);
        assert_eq!(controller.tick(1000), 0);
        assert!(controller.output().is_empty());
        assert!(controller.diagnostics().is_empty());
    }

    #[test]
    fn test_teardown_before_activation_stays_empty() {
        let mut controller = PreviewController::default();
        controller.teardown();
        assert_eq!(controller.state(), PreviewState::Empty);
    }
}
