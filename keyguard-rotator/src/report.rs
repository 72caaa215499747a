//! Per-cycle rotation results
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


use chrono::{DateTime, Utc};
use keyguard_types::RotationPolicy;
use serde::Serialize;
use uuid::Uuid;

/// Result of rotating one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeyRotationResult {
    Success { key_id: Uuid, new_key_id: Uuid },
    Error { key_id: Uuid, error: String },
}

impl KeyRotationResult {
    pub fn key_id(&self) -> Uuid {
        match self {
            KeyRotationResult::Success { key_id, .. } | KeyRotationResult::Error { key_id, .. } => {
                *key_id
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, KeyRotationResult::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyCycleStatus {
    /// Every bound key was attempted and the schedule was advanced
    Completed,
    /// The policy could not be processed or its schedule not persisted
    Failed,
}

/// Result of one due policy within a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyRotationResult {
    pub policy_id: Uuid,
    pub policy_name: String,
    pub status: PolicyCycleStatus,
    pub rotated_keys: usize,
    pub failed_keys: usize,
    pub results: Vec<KeyRotationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PolicyRotationResult {
    pub fn completed(policy: &RotationPolicy, results: Vec<KeyRotationResult>) -> Self {
        let rotated_keys = results.iter().filter(|r| r.is_success()).count();
        let failed_keys = results.len() - rotated_keys;
        Self {
            policy_id: policy.id,
            policy_name: policy.policy_name.clone(),
            status: PolicyCycleStatus::Completed,
            rotated_keys,
            failed_keys,
            results,
            error: None,
        }
    }

    pub fn failed(policy: &RotationPolicy, error: impl Into<String>) -> Self {
        Self {
            policy_id: policy.id,
            policy_name: policy.policy_name.clone(),
            status: PolicyCycleStatus::Failed,
            rotated_keys: 0,
            failed_keys: 0,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Keep the per-key results but flag the policy as failed
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = PolicyCycleStatus::Failed;
        self.error = Some(error.into());
    }
}

/// Summary of one scheduler cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub policies_evaluated: usize,
    pub policies: Vec<PolicyRotationResult>,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>, policies_evaluated: usize) -> Self {
        Self {
            started_at,
            policies_evaluated,
            policies: Vec::new(),
        }
    }

    pub fn rotated_keys(&self) -> usize {
        self.policies.iter().map(|p| p.rotated_keys).sum()
    }

    pub fn failed_keys(&self) -> usize {
        self.policies.iter().map(|p| p.failed_keys).sum()
    }

    pub fn failed_policies(&self) -> usize {
        self.policies
            .iter()
            .filter(|p| p.status == PolicyCycleStatus::Failed)
            .count()
    }

    pub fn policy(&self, policy_id: Uuid) -> Option<&PolicyRotationResult> {
        self.policies.iter().find(|p| p.policy_id == policy_id)
    }
}
