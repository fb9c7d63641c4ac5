use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use partlab_core::{Id, UserId};

/// One before/after snapshot of a mutated entity, attributed to the actor
/// that performed the change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEvent {
    pub entity_type: String,
    pub entity_id: Id,
    pub before: Option<JsonValue>,
    pub after: Option<JsonValue>,
    pub user_id: UserId,
}

/// Fire-and-forget audit recorder. Implementations must swallow their own
/// failures; a broken sink never rolls back the primary mutation.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Default sink: one structured log line per event.
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => log::info!(target: "partlab::audit", "{payload}"),
            Err(err) => log::warn!(target: "partlab::audit", "unserializable audit event: {err}"),
        }
    }
}

/// In-memory sink for tests and embedding hosts that drain events themselves.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event);
        }
    }
}
