use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventOutcome {
    Success,
    Rejected,
    Failed,
}

/// Lifecycle notification for the host page: open/close, navigation and
/// submission results for one wizard instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardEvent {
    pub event_id: String,
    pub wizard_id: String,
    pub event_type: String,
    pub outcome: EventOutcome,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl WizardEvent {
    pub fn new(
        wizard_id: impl Into<String>,
        event_type: impl Into<String>,
        outcome: EventOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            wizard_id: wizard_id.into(),
            event_type: event_type.into(),
            outcome,
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait WizardEventSink: Send + Sync {
    fn emit(&self, event: WizardEvent);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;

impl WizardEventSink for NoopEventSink {
    fn emit(&self, _event: WizardEvent) {}
}

#[derive(Clone, Default)]
pub struct InMemoryEventSink {
    events: Arc<Mutex<Vec<WizardEvent>>>,
}

impl InMemoryEventSink {
    pub fn events(&self) -> Vec<WizardEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|event| event.event_type).collect()
    }
}

impl WizardEventSink for InMemoryEventSink {
    fn emit(&self, event: WizardEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
