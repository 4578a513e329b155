//! Audit Events
//!
//! Structured audit events constructed by the guards. Durability belongs
//! to the sink collaborator; an unreachable sink degrades to a log line
//! and never blocks the response.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use gate_common::RequestCorrelationId;

/// One audit trail entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// What happened, e.g. `session.end`
    pub action: String,
    /// Kind of entity acted on
    pub entity_type: String,
    /// Identifier of the entity acted on
    pub entity_id: String,
    /// Correlation id of the request that caused the event
    pub request_id: RequestCorrelationId,
    /// Free-form detail fields
    pub details: HashMap<String, String>,
}

impl AuditEvent {
    /// Construct an event for an action on an entity
    pub fn new(
        action: &str,
        entity_type: &str,
        entity_id: impl Into<String>,
        request_id: &RequestCorrelationId,
    ) -> Self {
        Self {
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.into(),
            request_id: request_id.clone(),
            details: HashMap::new(),
        }
    }

    /// Attach a detail field
    pub fn with_detail(mut self, key: &str, value: impl Into<String>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Audit sink failure
#[derive(Debug, Error)]
pub enum AuditSinkError {
    /// The sink could not take the event
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Audit log sink collaborator; persistence is its concern
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Take ownership of one event
    async fn record(&self, event: AuditEvent) -> Result<(), AuditSinkError>;
}

/// Emits audit events to the configured sink
pub struct AuditEmitter {
    sink: Arc<dyn AuditSink>,
}

impl AuditEmitter {
    /// Emit through the given sink
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Log the event and hand it to the sink. Sink failure degrades to a
    /// warn line; it never propagates to the request path.
    pub async fn emit(&self, event: AuditEvent) {
        tracing::info!(
            action = %event.action,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            request_id = %event.request_id,
            "audit event"
        );

        if let Err(e) = self.sink.record(event).await {
            tracing::warn!(error = %e, "audit sink unreachable, event dropped");
        }
    }
}

/// In-memory audit sink
#[derive(Default)]
pub struct MemoryAuditSink {
    events: parking_lot::RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditSinkError> {
        self.events.write().push(event);
        Ok(())
    }
}
