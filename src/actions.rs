use log::{info, warn};
use serde::Serialize;

/// Receives the action id bound to a fired gesture. Fire-and-forget: the
/// engine never looks at the outcome.
pub trait ActionDispatcher {
    fn invoke(&mut self, action_id: &str);
}

impl<F: FnMut(&str)> ActionDispatcher for F {
    fn invoke(&mut self, action_id: &str) {
        self(action_id)
    }
}

/// Dispatcher that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl ActionDispatcher for NoopDispatcher {
    fn invoke(&mut self, _action_id: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity_id: String,
}

impl ServiceCall {
    /// `button.*` is pressed, `script.*` is turned on, anything else toggles.
    pub fn for_entity(entity_id: &str) -> Option<ServiceCall> {
        let entity_id = entity_id.trim();
        if entity_id.is_empty() {
            return None;
        }
        let domain = entity_id.split('.').next().unwrap_or(entity_id);
        if domain.is_empty() {
            return None;
        }
        let service = match domain {
            "button" => "press",
            "script" => "turn_on",
            _ => "toggle",
        };
        Some(ServiceCall {
            domain: domain.to_string(),
            service: service.to_string(),
            entity_id: entity_id.to_string(),
        })
    }
}

/// Turns entity-style action ids into service calls and keeps them until drained.
#[derive(Debug)]
pub struct ServiceDispatcher {
    enabled: bool,
    calls: Vec<ServiceCall>,
}

impl Default for ServiceDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDispatcher {
    pub fn new() -> Self {
        Self {
            enabled: true,
            calls: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, en: bool) {
        self.enabled = en;
    }

    pub fn drain(&mut self) -> Vec<ServiceCall> {
        std::mem::take(&mut self.calls)
    }
}

impl ActionDispatcher for ServiceDispatcher {
    fn invoke(&mut self, action_id: &str) {
        if !self.enabled {
            return;
        }
        match ServiceCall::for_entity(action_id) {
            Some(call) => {
                info!("service {}.{} for {}", call.domain, call.service, call.entity_id);
                self.calls.push(call);
            }
            None => warn!("cannot resolve action '{action_id}' to a service call"),
        }
    }
}
