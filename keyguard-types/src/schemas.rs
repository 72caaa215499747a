//! Audit event payload schemas
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


use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::key::{KeyType, KmsProvider};
use crate::policy::PolicyStatus;

// ============================================================================
// Key Event Payloads
// ============================================================================

/// Outcome recorded for a rotation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationOutcome {
    Success,
    Failure,
}

/// Payload for `key.rotated` and `key.rotation_failed` events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRotationPayload {
    pub policy_id: Option<Uuid>,
    pub old_key_id: Uuid,
    pub new_key_id: Option<Uuid>,
    /// Token that initiated the rotation, `None` for the scheduler
    pub initiated_by: Option<Uuid>,
    pub outcome: RotationOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload for `key.registered` events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRegisteredPayload {
    pub key_id: Uuid,
    pub key_name: String,
    pub key_type: KeyType,
    pub kms_provider: KmsProvider,
    pub rotation_policy_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Payload for `key.rolled_back` events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyRolledBackPayload {
    pub restored_key_id: Uuid,
    pub deactivated_key_id: Uuid,
    pub initiated_by: Option<Uuid>,
}

// ============================================================================
// Policy Event Payloads
// ============================================================================

/// Payload for `policy.created` and `policy.status_changed` events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyChangedPayload {
    pub policy_id: Uuid,
    pub policy_name: String,
    pub previous_status: Option<PolicyStatus>,
    pub status: PolicyStatus,
    pub modified_by: Option<Uuid>,
}
