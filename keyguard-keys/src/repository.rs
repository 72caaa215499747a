//! Persistence interfaces for policies and keys
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
use keyguard_types::{EncryptionKey, PolicyStatus, RotationPolicy};
use uuid::Uuid;

/// Which policies a sweep covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyScope {
    All,
    Tenant(Uuid),
}

impl PolicyScope {
    pub fn includes(&self, tenant_id: Uuid) -> bool {
        match self {
            PolicyScope::All => true,
            PolicyScope::Tenant(scoped) => *scoped == tenant_id,
        }
    }
}

/// Policy storage
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Policies with `ACTIVE` status inside `scope`
    async fn list_active_policies(&self, scope: PolicyScope) -> KeyResult<Vec<RotationPolicy>>;

    /// Every policy of a tenant regardless of status
    async fn list_policies(&self, tenant_id: Uuid) -> KeyResult<Vec<RotationPolicy>>;

    async fn get_policy(&self, policy_id: Uuid) -> KeyResult<RotationPolicy>;

    async fn find_policy_by_name(
        &self,
        tenant_id: Uuid,
        policy_name: &str,
    ) -> KeyResult<Option<RotationPolicy>>;

    async fn save_policy(&self, policy: &RotationPolicy) -> KeyResult<()>;

    /// Record a firing at `now` on the stored row, touching only its schedule
    async fn record_rotation(
        &self,
        policy_id: Uuid,
        now: DateTime<Utc>,
    ) -> KeyResult<RotationPolicy>;

    /// Move the stored row to `status`, returning the previous status and the updated row
    async fn set_policy_status(
        &self,
        policy_id: Uuid,
        status: PolicyStatus,
        modified_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> KeyResult<(PolicyStatus, RotationPolicy)>;
}

/// Key reference storage. Keys are never deleted.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    async fn get_key(&self, key_id: Uuid) -> KeyResult<EncryptionKey>;

    async fn save_key(&self, key: &EncryptionKey) -> KeyResult<()>;

    /// Save several keys in one transaction: all rows change or none do
    async fn save_keys(&self, keys: &[EncryptionKey]) -> KeyResult<()>;

    /// ACTIVE keys bound to `policy` that still match its scope
    async fn list_active_keys_for_policy(
        &self,
        policy: &RotationPolicy,
    ) -> KeyResult<Vec<EncryptionKey>>;

    /// The ACTIVE key of a lineage chain, if any
    async fn find_active_key(
        &self,
        tenant_id: Uuid,
        key_name: &str,
    ) -> KeyResult<Option<EncryptionKey>>;

    /// Keys of a tenant that were rotated at least once, most recent first
    async fn list_rotated_keys(&self, tenant_id: Uuid, limit: usize) -> KeyResult<Vec<EncryptionKey>>;
}
