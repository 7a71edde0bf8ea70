//! Audit events
//!
//! The decision core emits [`AuditEvent`]s; delivery and retention are the
//! sink's business.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity of an audit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    /// Access granted
    Success,
    /// Access refused
    Failure,
    /// The request could not be evaluated
    Error,
    /// Informational
    Info,
}

impl fmt::Display for AuditLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
            Self::Info => "info",
        };
        f.write_str(label)
    }
}

/// A single audit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Severity
    pub level: AuditLevel,
    /// Key/value context describing the request and its outcome
    pub context: BTreeMap<String, String>,
    /// Error detail when the request could not be evaluated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_error: Option<String>,
}

impl AuditEvent {
    /// Event with an empty context
    pub fn new(level: AuditLevel) -> Self {
        Self {
            level,
            context: BTreeMap::new(),
            underlying_error: None,
        }
    }

    /// Add a context entry
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Attach the error that prevented evaluation
    pub fn with_error(mut self, error: impl fmt::Display) -> Self {
        self.underlying_error = Some(error.to_string());
        self
    }

    /// Look up a context entry
    pub fn get(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    /// Record an event
    fn audit(&self, event: AuditEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn audit(&self, _event: AuditEvent) {}
}

/// Writes events to `tracing` under the `bastion::audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn audit(&self, event: AuditEvent) {
        let context = format!("{:?}", event.context);
        match event.level {
            AuditLevel::Success | AuditLevel::Info => tracing::info!(
                target: "bastion::audit",
                audit_level = %event.level,
                context = %context,
                "audit"
            ),
            AuditLevel::Failure => tracing::warn!(
                target: "bastion::audit",
                audit_level = %event.level,
                context = %context,
                "audit"
            ),
            AuditLevel::Error => tracing::error!(
                target: "bastion::audit",
                audit_level = %event.level,
                context = %context,
                error = event.underlying_error.as_deref().unwrap_or(""),
                "audit"
            ),
        }
    }
}

/// Keeps events in memory, in emission order
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every recorded event
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drop every recorded event
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn audit(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.audit(AuditEvent::new(AuditLevel::Success).with("resource", "ejb:Ledger"));
        sink.audit(AuditEvent::new(AuditLevel::Error).with_error("boom"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get("resource"), Some("ejb:Ledger"));
        assert_eq!(events[1].underlying_error.as_deref(), Some("boom"));
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_all_levels() {
        let sink = TracingAuditSink;
        for level in [
            AuditLevel::Success,
            AuditLevel::Failure,
            AuditLevel::Error,
            AuditLevel::Info,
        ] {
            sink.audit(AuditEvent::new(level).with("domain", "test"));
        }
    }
}
