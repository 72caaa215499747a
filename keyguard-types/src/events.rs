//! Audit event envelope shared by every audit sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TypesError};
use crate::schemas::*;

/// Audit event type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditEventType {
    #[serde(rename = "key.registered")]
    KeyRegistered,
    #[serde(rename = "key.rotated")]
    KeyRotated,
    #[serde(rename = "key.rotation_failed")]
    KeyRotationFailed,
    #[serde(rename = "key.rolled_back")]
    KeyRolledBack,

    #[serde(rename = "policy.created")]
    PolicyCreated,
    #[serde(rename = "policy.status_changed")]
    PolicyStatusChanged,
}

/// Base audit event structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,

    pub event_id: Uuid,

    pub timestamp: DateTime<Utc>,

    /// Component that produced the event
    pub source: String,

    pub tenant_id: Uuid,

    /// Event payload (type depends on event_type)
    pub payload: serde_json::Value,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventType,
        source: impl Into<String>,
        tenant_id: Uuid,
        timestamp: DateTime<Utc>,
        payload: impl Serialize,
    ) -> Result<Self> {
        let payload_value = serde_json::to_value(payload)?;

        Ok(Self {
            event_type,
            event_id: Uuid::new_v4(),
            timestamp,
            source: source.into(),
            tenant_id,
            payload: payload_value,
        })
    }

    /// Deserialize the payload into a specific type
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| TypesError::InvalidPayload(e.to_string()))
    }

    /// Validate that the payload matches the event type
    pub fn validate(&self) -> Result<()> {
        match self.event_type {
            AuditEventType::KeyRegistered => {
                let _: KeyRegisteredPayload = self.payload_as()?;
            }
            AuditEventType::KeyRotated | AuditEventType::KeyRotationFailed => {
                let payload: KeyRotationPayload = self.payload_as()?;
                let expected = if self.event_type == AuditEventType::KeyRotated {
                    RotationOutcome::Success
                } else {
                    RotationOutcome::Failure
                };
                if payload.outcome != expected {
                    return Err(TypesError::InvalidPayload(format!(
                        "outcome {:?} does not match event type {:?}",
                        payload.outcome, self.event_type
                    )));
                }
            }
            AuditEventType::KeyRolledBack => {
                let _: KeyRolledBackPayload = self.payload_as()?;
            }
            AuditEventType::PolicyCreated | AuditEventType::PolicyStatusChanged => {
                let _: PolicyChangedPayload = self.payload_as()?;
            }
        }
        Ok(())
    }
}
