//! Rotation policy administration
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


use crate::audit::{emit, AuditSink};
use crate::error::{KeyError, KeyResult};
use crate::repository::{KeyRepository, PolicyRepository};
use chrono::{DateTime, Utc};
use keyguard_types::schemas::PolicyChangedPayload;
use keyguard_types::{
    AuditEventType, CreateRotationPolicy, EncryptionKey, KeyStatus, KeyType, KmsProvider,
    PolicyStatus, RotationPolicy,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const AUDIT_SOURCE: &str = "policy-admin";

/// Upper bound on a single history page
pub const MAX_HISTORY_LIMIT: usize = 1000;

/// Compliance view of a rotated key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationHistoryEntry {
    pub key_id: Uuid,
    pub key_name: String,
    pub key_type: KeyType,
    pub kms_provider: KmsProvider,
    pub kms_key_id: String,
    pub version: u32,
    pub status: KeyStatus,
    pub rotated_at: Option<DateTime<Utc>>,
    pub rotated_by_token_id: Option<Uuid>,
    pub parent_key_id: Option<Uuid>,
    pub rotation_policy_id: Option<Uuid>,
}

impl From<EncryptionKey> for RotationHistoryEntry {
    fn from(key: EncryptionKey) -> Self {
        Self {
            key_id: key.id,
            key_name: key.key_name,
            key_type: key.key_type,
            kms_provider: key.kms_provider,
            kms_key_id: key.kms_key_id,
            version: key.version,
            status: key.status,
            rotated_at: key.rotated_at,
            rotated_by_token_id: key.rotated_by_token_id,
            parent_key_id: key.parent_key_id,
            rotation_policy_id: key.rotation_policy_id,
        }
    }
}

/// Operations behind the policy administration API
pub struct PolicyAdministration {
    policies: Arc<dyn PolicyRepository>,
    keys: Arc<dyn KeyRepository>,
    audit: Arc<dyn AuditSink>,
}

impl PolicyAdministration {
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        keys: Arc<dyn KeyRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            policies,
            keys,
            audit,
        }
    }

    /// Validate and persist a new policy. Status defaults to DRAFT.
    pub async fn create_rotation_policy(
        &self,
        input: CreateRotationPolicy,
    ) -> KeyResult<RotationPolicy> {
        let now = Utc::now();
        let policy = RotationPolicy::new(input, now)?;

        if self
            .policies
            .find_policy_by_name(policy.tenant_id, &policy.policy_name)
            .await?
            .is_some()
        {
            return Err(KeyError::AlreadyExists(format!(
                "rotation policy {}",
                policy.policy_name
            )));
        }
        self.policies.save_policy(&policy).await?;

        info!(
            policy_id = %policy.id,
            tenant_id = %policy.tenant_id,
            policy_name = %policy.policy_name,
            status = %policy.status,
            "Created rotation policy"
        );
        emit(
            self.audit.as_ref(),
            AuditEventType::PolicyCreated,
            AUDIT_SOURCE,
            policy.tenant_id,
            now,
            PolicyChangedPayload {
                policy_id: policy.id,
                policy_name: policy.policy_name.clone(),
                previous_status: None,
                status: policy.status,
                modified_by: policy.created_by_token_id,
            },
        )
        .await;

        Ok(policy)
    }

    /// Move a policy to `status`. Policies are deactivated, never deleted.
    pub async fn update_policy_status(
        &self,
        policy_id: Uuid,
        status: PolicyStatus,
        modified_by: Option<Uuid>,
    ) -> KeyResult<RotationPolicy> {
        let now = Utc::now();
        let (previous, policy) = self
            .policies
            .set_policy_status(policy_id, status, modified_by, now)
            .await?;

        info!(
            policy_id = %policy.id,
            previous_status = %previous,
            status = %status,
            "Updated rotation policy status"
        );
        emit(
            self.audit.as_ref(),
            AuditEventType::PolicyStatusChanged,
            AUDIT_SOURCE,
            policy.tenant_id,
            now,
            PolicyChangedPayload {
                policy_id: policy.id,
                policy_name: policy.policy_name.clone(),
                previous_status: Some(previous),
                status,
                modified_by,
            },
        )
        .await;

        Ok(policy)
    }

    pub async fn get_policy(&self, policy_id: Uuid) -> KeyResult<RotationPolicy> {
        self.policies.get_policy(policy_id).await
    }

    pub async fn list_policies(&self, tenant_id: Uuid) -> KeyResult<Vec<RotationPolicy>> {
        self.policies.list_policies(tenant_id).await
    }

    /// Bind an active key to a policy whose scope it matches
    pub async fn bind_key_to_policy(
        &self,
        key_id: Uuid,
        policy_id: Uuid,
    ) -> KeyResult<EncryptionKey> {
        let policy = self.policies.get_policy(policy_id).await?;
        let mut key = self.keys.get_key(key_id).await?;
        if !key.is_active() {
            return Err(KeyError::Validation(format!("key {} is not active", key_id)));
        }

        key.rotation_policy_id = Some(policy.id);
        if !policy.governs(&key) {
            return Err(KeyError::Validation(format!(
                "key {} is outside the scope of policy {}",
                key_id, policy.policy_name
            )));
        }
        key.updated_at = Utc::now();
        self.keys.save_key(&key).await?;

        info!(key_id = %key.id, policy_id = %policy.id, "Bound key to rotation policy");
        Ok(key)
    }

    /// Rotated keys of a tenant, most recent first
    pub async fn get_rotation_history(
        &self,
        tenant_id: Uuid,
        limit: usize,
    ) -> KeyResult<Vec<RotationHistoryEntry>> {
        let limit = limit.min(MAX_HISTORY_LIMIT);
        let keys = self.keys.list_rotated_keys(tenant_id, limit).await?;
        Ok(keys.into_iter().map(RotationHistoryEntry::from).collect())
    }
}
