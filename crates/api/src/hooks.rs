//! Named extension hooks
//!
//! Listeners run synchronously, in registration order, when a hook is
//! dispatched. A listener cannot abort the action that dispatched it.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

pub const HOOK_POST_PROCESS_GENERAL_BEFORE: &str =
    "actionAdminSecurityControllerPostProcessGeneralBefore";
pub const HOOK_POST_PROCESS_BEFORE: &str = "actionAdminSecurityControllerPostProcessBefore";

pub trait HookListener: Send + Sync {
    fn on_hook(&self, hook: &str, params: &Value);
}

impl<F> HookListener for F
where
    F: Fn(&str, &Value) + Send + Sync,
{
    fn on_hook(&self, hook: &str, params: &Value) {
        self(hook, params)
    }
}

#[derive(Clone, Default)]
pub struct HookDispatcher {
    listeners: HashMap<String, Vec<Arc<dyn HookListener>>>,
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listen(mut self, hook: &str, listener: Arc<dyn HookListener>) -> Self {
        self.listeners
            .entry(hook.to_string())
            .or_default()
            .push(listener);
        self
    }

    pub fn dispatch(&self, hook: &str, params: &Value) {
        let listeners = self.listeners.get(hook).map(Vec::as_slice).unwrap_or(&[]);
        tracing::debug!(hook, listeners = listeners.len(), "Dispatching hook");

        for listener in listeners {
            listener.on_hook(hook, params);
        }
    }
}
