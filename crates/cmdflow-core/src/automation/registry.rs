use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::automation::definition::AutomationDefinition;

/// In-memory store of automation definitions keyed by id
///
/// Same overwrite semantics as the command registry: registering an existing
/// id replaces it with a warning. Unregistering an unknown id is a no-op.
#[derive(Default)]
pub struct AutomationRegistry {
    automations: RwLock<HashMap<String, Arc<AutomationDefinition>>>,
}

impl AutomationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_automation(
        &self,
        def: AutomationDefinition,
    ) -> Option<Arc<AutomationDefinition>> {
        let id = def.id.clone();
        let previous = self
            .automations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::new(def));
        if previous.is_some() {
            tracing::warn!(automation_id = %id, "Overwriting existing automation definition");
        } else {
            tracing::debug!(automation_id = %id, "Registered automation");
        }
        previous
    }

    /// Remove a definition, returning it if it was registered
    pub fn unregister_automation(&self, id: &str) -> Option<Arc<AutomationDefinition>> {
        let removed = self
            .automations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if removed.is_some() {
            tracing::debug!(automation_id = %id, "Unregistered automation");
        }
        removed
    }

    pub fn get_automation(&self, id: &str) -> Option<Arc<AutomationDefinition>> {
        self.automations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Snapshot of every definition, sorted by id
    pub fn get_all_automations(&self) -> Vec<Arc<AutomationDefinition>> {
        let mut all: Vec<_> = self
            .automations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn list_by_tag(&self, tag: &str) -> Vec<Arc<AutomationDefinition>> {
        self.get_all_automations()
            .into_iter()
            .filter(|def| def.has_tag(tag))
            .collect()
    }

    /// Definitions carrying a `schedule`; a host scheduler polls this
    pub fn scheduled(&self) -> Vec<Arc<AutomationDefinition>> {
        self.get_all_automations()
            .into_iter()
            .filter(|def| def.schedule.is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.automations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
