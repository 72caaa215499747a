//! Rotation policies and their schedule evaluation
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


use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, TypesError};
use crate::key::{EncryptionKey, KeyType, KmsProvider};

/// Longest accepted policy name
pub const MAX_POLICY_NAME_LEN: usize = 128;

/// Longest accepted time-based interval (ten years)
pub const MAX_ROTATION_INTERVAL_DAYS: u32 = 3650;

/// Policy status. Only `Active` policies are evaluated by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    Draft,
    Active,
    Inactive,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Draft => "DRAFT",
            PolicyStatus::Active => "ACTIVE",
            PolicyStatus::Inactive => "INACTIVE",
        }
    }

    /// Policies never return to `Draft` once they have left it
    pub fn can_transition_to(&self, next: PolicyStatus) -> bool {
        match (self, next) {
            (current, next) if *current == next => true,
            (_, PolicyStatus::Draft) => false,
            _ => true,
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What makes a policy fire. Trigger-specific settings live on their variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rotation_trigger", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RotationTrigger {
    TimeBased {
        #[serde(rename = "rotation_interval_days")]
        interval_days: u32,
    },
    EventBased {
        event_name: String,
    },
    UsageBased {
        #[serde(rename = "usage_threshold")]
        threshold: u64,
    },
}

impl RotationTrigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            RotationTrigger::TimeBased { .. } => TriggerKind::TimeBased,
            RotationTrigger::EventBased { .. } => TriggerKind::EventBased,
            RotationTrigger::UsageBased { .. } => TriggerKind::UsageBased,
        }
    }

    /// Rotation interval for time-based triggers
    pub fn interval(&self) -> Option<Duration> {
        match self {
            RotationTrigger::TimeBased { interval_days } => {
                Some(Duration::days(i64::from(*interval_days)))
            }
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            RotationTrigger::TimeBased { interval_days } => {
                if *interval_days == 0 || *interval_days > MAX_ROTATION_INTERVAL_DAYS {
                    return Err(TypesError::Validation(format!(
                        "rotation_interval_days must be between 1 and {}",
                        MAX_ROTATION_INTERVAL_DAYS
                    )));
                }
            }
            RotationTrigger::EventBased { event_name } => {
                if event_name.trim().is_empty() {
                    return Err(TypesError::Validation(
                        "event_name is required for EVENT_BASED policies".to_string(),
                    ));
                }
            }
            RotationTrigger::UsageBased { threshold } => {
                if *threshold == 0 {
                    return Err(TypesError::Validation(
                        "usage_threshold must be greater than zero".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Trigger discriminant as it arrives from the administration surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    TimeBased,
    EventBased,
    UsageBased,
}

/// Policy creation input.
///
/// Mirrors the flat request shape of the administration API. `to_trigger`
/// turns the optional per-trigger fields into a [`RotationTrigger`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRotationPolicy {
    pub tenant_id: Uuid,
    pub policy_name: String,
    pub key_type: KeyType,
    pub kms_provider: KmsProvider,
    pub rotation_trigger: TriggerKind,
    #[serde(default)]
    pub rotation_interval_days: Option<u32>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub usage_threshold: Option<u64>,
    /// Defaults to `Draft`
    #[serde(default)]
    pub status: Option<PolicyStatus>,
    #[serde(default)]
    pub created_by_token_id: Option<Uuid>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

impl CreateRotationPolicy {
    pub fn to_trigger(&self) -> Result<RotationTrigger> {
        let trigger = match self.rotation_trigger {
            TriggerKind::TimeBased => RotationTrigger::TimeBased {
                interval_days: self.rotation_interval_days.ok_or_else(|| {
                    TypesError::Validation(
                        "rotation_interval_days is required for TIME_BASED policies".to_string(),
                    )
                })?,
            },
            TriggerKind::EventBased => RotationTrigger::EventBased {
                event_name: self.event_name.clone().ok_or_else(|| {
                    TypesError::Validation(
                        "event_name is required for EVENT_BASED policies".to_string(),
                    )
                })?,
            },
            TriggerKind::UsageBased => RotationTrigger::UsageBased {
                threshold: self.usage_threshold.ok_or_else(|| {
                    TypesError::Validation(
                        "usage_threshold is required for USAGE_BASED policies".to_string(),
                    )
                })?,
            },
        };
        trigger.validate()?;
        Ok(trigger)
    }
}

/// Tenant-scoped rotation configuration for one key type and provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationPolicy {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub policy_name: String,
    pub key_type: KeyType,
    pub kms_provider: KmsProvider,
    #[serde(flatten)]
    pub trigger: RotationTrigger,
    pub status: PolicyStatus,
    pub last_rotation_at: Option<DateTime<Utc>>,
    /// Next due marker, recomputed each time the policy fires
    pub next_rotation_at: Option<DateTime<Utc>>,
    pub created_by_token_id: Option<Uuid>,
    pub last_modified_by_token_id: Option<Uuid>,
    pub correlation_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RotationPolicy {
    /// Build a policy from validated creation input.
    ///
    /// Time-based policies start out due at `now`.
    pub fn new(input: CreateRotationPolicy, now: DateTime<Utc>) -> Result<Self> {
        let policy_name = input.policy_name.trim().to_string();
        if policy_name.is_empty() {
            return Err(TypesError::Validation("policy_name is required".to_string()));
        }
        if policy_name.len() > MAX_POLICY_NAME_LEN {
            return Err(TypesError::Validation(format!(
                "policy_name exceeds {} characters",
                MAX_POLICY_NAME_LEN
            )));
        }

        let trigger = input.to_trigger()?;
        let next_rotation_at = trigger.interval().map(|_| now);

        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            policy_name,
            key_type: input.key_type,
            kms_provider: input.kms_provider,
            trigger,
            status: input.status.unwrap_or(PolicyStatus::Draft),
            last_rotation_at: None,
            next_rotation_at,
            created_by_token_id: input.created_by_token_id,
            last_modified_by_token_id: input.created_by_token_id,
            correlation_id: input.correlation_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    /// Whether the policy is due at `now`.
    ///
    /// Never true for non-active policies or for event and usage triggers,
    /// which are driven by signals outside the policy.
    pub fn should_rotate_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active() {
            return false;
        }
        let Some(interval) = self.trigger.interval() else {
            return false;
        };

        match (self.last_rotation_at, self.next_rotation_at) {
            (None, _) => true,
            (Some(_), Some(next)) => now >= next,
            (Some(last), None) => last
                .checked_add_signed(interval)
                .map_or(false, |due| now >= due),
        }
    }

    pub fn should_rotate_now(&self) -> bool {
        self.should_rotate_at(Utc::now())
    }

    /// Record a firing at `now` and move the due marker one interval ahead.
    ///
    /// Leaves the policy untouched when the next due time is out of range.
    pub fn update_rotation_schedule_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        let next_rotation_at = match self.trigger.interval() {
            Some(interval) => Some(now.checked_add_signed(interval).ok_or_else(|| {
                TypesError::Validation(format!(
                    "next rotation of policy {} is out of range",
                    self.id
                ))
            })?),
            None => None,
        };
        self.last_rotation_at = Some(now);
        self.next_rotation_at = next_rotation_at;
        self.updated_at = now;
        Ok(())
    }

    pub fn update_rotation_schedule(&mut self) -> Result<()> {
        self.update_rotation_schedule_at(Utc::now())
    }

    /// Whether a key is bound to this policy and still inside its scope
    pub fn governs(&self, key: &EncryptionKey) -> bool {
        key.rotation_policy_id == Some(self.id)
            && key.tenant_id == self.tenant_id
            && key.key_type == self.key_type
            && key.kms_provider == self.kms_provider
    }
}
