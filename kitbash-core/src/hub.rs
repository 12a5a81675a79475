//! Concurrent registry of preview controllers keyed by context id. A host
//! showing many snippet cards gives each card its own context; activations
//! in one context never disturb another.

use dashmap::DashMap;

use crate::config::PreviewLimits;
use crate::preview::{PreviewController, PreviewStatus};
use crate::script::ScriptDiagnostic;
use crate::snippet::FragmentSet;
use kitbash_dom::DomResult;

pub struct PreviewHub {
    limits: PreviewLimits,
    contexts: DashMap<String, PreviewController>,
}

impl PreviewHub {
    pub fn new(limits: PreviewLimits) -> Self {
        PreviewHub {
            limits,
            contexts: DashMap::new(),
        }
    }

    /// Activate (or rebuild) the preview of `context`, creating the
    /// controller on first use.
    pub fn activate(&self, context: &str, fragments: &FragmentSet) -> PreviewStatus {
        let mut controller = self
            .contexts
            .entry(context.to_string())
            .or_insert_with(|| PreviewController::new(self.limits));
        controller.activate(fragments)
    }

    /// Forward an event into a context. Unknown contexts swallow it.
    pub fn dispatch(
        &self,
        context: &str,
        event: &str,
        selector: &str,
        value: Option<&str>,
    ) -> DomResult<usize> {
        match self.contexts.get_mut(context) {
            Some(mut controller) => controller.dispatch(event, selector, value),
            None => Ok(0),
        }
    }

    /// Advance a context's logical clock. Unknown contexts report zero.
    pub fn tick(&self, context: &str, ms: u64) -> usize {
        match self.contexts.get_mut(context) {
            Some(mut controller) => controller.tick(ms),
            None => 0,
        }
    }

    pub fn html(&self, context: &str) -> Option<String> {
        self.contexts.get(context).and_then(|controller| controller.html())
    }

    pub fn status(&self, context: &str) -> Option<PreviewStatus> {
        self.contexts.get(context).map(|controller| controller.status().clone())
    }

    pub fn output(&self, context: &str) -> Vec<String> {
        self.contexts
            .get(context)
            .map(|controller| controller.output())
            .unwrap_or_default()
    }

    pub fn diagnostics(&self, context: &str) -> Vec<ScriptDiagnostic> {
        self.contexts
            .get(context)
            .map(|controller| controller.diagnostics())
            .unwrap_or_default()
    }

    /// Tear down a context's instance and drop the controller. Closing an
    /// unknown context does nothing.
    pub fn close(&self, context: &str) {
        if let Some((_, mut controller)) = self.contexts.remove(context) {
            controller.teardown();
        }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl Default for PreviewHub {
    fn default() -> Self {
        PreviewHub::new(PreviewLimits::default())
    }
}
