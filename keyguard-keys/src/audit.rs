//! Audit sinks for key lifecycle events
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::error::KeyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyguard_types::{AuditEvent, AuditEventType};
use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Destination for audit events
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> KeyResult<()>;
}

/// Writes audit events as structured log records on the `keyguard::audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> KeyResult<()> {
        let payload = serde_json::to_string(&event.payload)?;
        info!(
            target: "keyguard::audit",
            event_id = %event.event_id,
            event_type = ?event.event_type,
            tenant_id = %event.tenant_id,
            source = %event.source,
            timestamp = %event.timestamp,
            payload = %payload,
            "audit"
        );
        Ok(())
    }
}

/// Keeps events in memory, for tests and local inspection
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn events_of(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> KeyResult<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
        Ok(())
    }
}

/// Build and record an audit event.
///
/// Fire-and-forget: failures are logged and never returned, so auditing can
/// not undo the action being audited.
pub async fn emit(
    sink: &dyn AuditSink,
    event_type: AuditEventType,
    source: &str,
    tenant_id: Uuid,
    timestamp: DateTime<Utc>,
    payload: impl Serialize + Send,
) {
    let event = match AuditEvent::new(event_type, source, tenant_id, timestamp, payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, event_type = ?event_type, "Failed to build audit event");
            return;
        }
    };

    if let Err(e) = sink.record(&event).await {
        warn!(
            error = %e,
            event_id = %event.event_id,
            event_type = ?event_type,
            "Failed to record audit event"
        );
    }
}
