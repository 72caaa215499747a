//! Key lifecycle: registration, rotation and rollback
//!
//! A rotation mints a successor reference, flips the current key to
//! ROTATED and links the successor to it through `parent_key_id`. Both rows
//! are written in a single repository transaction. The retired key keeps its
//! `kms_key_id` so data encrypted under it stays decryptable.
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
use crate::kms::{KmsRegistry, MintRequest};
use crate::repository::KeyRepository;
use chrono::{DateTime, Utc};
use keyguard_types::schemas::{KeyRegisteredPayload, KeyRolledBackPayload};
use keyguard_types::{AuditEventType, EncryptionKey, KeyStatus, KeyType, KmsProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

const AUDIT_SOURCE: &str = "key-lifecycle";

/// Input for registering the first key of a lineage chain
#[derive(Debug, Clone)]
pub struct NewKey {
    pub tenant_id: Uuid,
    pub key_name: String,
    pub key_type: KeyType,
    pub kms_provider: KmsProvider,
    pub algorithm: String,
    pub rotation_policy_id: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by_token_id: Option<Uuid>,
}

/// The two rows changed by a rotation
#[derive(Debug, Clone)]
pub struct RotatedKeys {
    /// Previous key, now ROTATED
    pub retired: EncryptionKey,
    /// New ACTIVE key
    pub successor: EncryptionKey,
}

/// The two rows changed by a rollback
#[derive(Debug, Clone)]
pub struct RolledBackKeys {
    /// Parent key, ACTIVE again
    pub restored: EncryptionKey,
    /// Successor that was rolled back, now INACTIVE
    pub deactivated: EncryptionKey,
}

/// Performs single-key lifecycle operations
pub struct KeyLifecycleService {
    keys: Arc<dyn KeyRepository>,
    kms: Arc<KmsRegistry>,
    audit: Arc<dyn AuditSink>,
    rollback_window: chrono::Duration,
    kms_timeout: Duration,
}

impl KeyLifecycleService {
    pub fn new(
        keys: Arc<dyn KeyRepository>,
        kms: Arc<KmsRegistry>,
        audit: Arc<dyn AuditSink>,
        rollback_window_days: u32,
        kms_timeout: Duration,
    ) -> Self {
        Self {
            keys,
            kms,
            audit,
            rollback_window: chrono::Duration::days(i64::from(rollback_window_days)),
            kms_timeout,
        }
    }

    /// Bound a KMS call by the configured timeout
    async fn with_kms_timeout<T, F>(&self, operation: &str, call: F) -> KeyResult<T>
    where
        F: Future<Output = KeyResult<T>>,
    {
        match tokio::time::timeout(self.kms_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(KeyError::ExternalProvider(format!(
                "KMS {} timed out after {}s",
                operation,
                self.kms_timeout.as_secs()
            ))),
        }
    }

    async fn load_active(&self, key_id: Uuid) -> KeyResult<EncryptionKey> {
        let key = self.keys.get_key(key_id).await?;
        if !key.is_active() {
            return Err(KeyError::NotFound(format!(
                "no active key {} (status {})",
                key_id, key.status
            )));
        }
        Ok(key)
    }

    /// Register the first key of a chain, minted by its provider
    pub async fn register_key(&self, new_key: NewKey) -> KeyResult<EncryptionKey> {
        let key_name = new_key.key_name.trim().to_string();
        if key_name.is_empty() {
            return Err(KeyError::Validation("key_name is required".to_string()));
        }
        if new_key.algorithm.trim().is_empty() {
            return Err(KeyError::Validation("algorithm is required".to_string()));
        }
        if self
            .keys
            .find_active_key(new_key.tenant_id, &key_name)
            .await?
            .is_some()
        {
            return Err(KeyError::AlreadyExists(format!(
                "key chain {} already has an active key",
                key_name
            )));
        }

        let client = self.kms.client_for(new_key.kms_provider)?;
        let request = MintRequest {
            tenant_id: new_key.tenant_id,
            key_name: key_name.clone(),
            key_type: new_key.key_type,
            algorithm: new_key.algorithm.clone(),
            previous_reference: None,
        };
        let reference = self
            .with_kms_timeout("mint", client.mint_reference(&request))
            .await?;
        self.with_kms_timeout("validate", client.validate_reference(&reference))
            .await?;

        let now = Utc::now();
        let key = EncryptionKey {
            id: Uuid::new_v4(),
            tenant_id: new_key.tenant_id,
            key_name,
            key_type: new_key.key_type,
            kms_provider: new_key.kms_provider,
            kms_key_id: reference,
            algorithm: new_key.algorithm,
            status: KeyStatus::Active,
            version: 1,
            activated_at: Some(now),
            expires_at: new_key.expires_at,
            rotated_at: None,
            last_used_at: None,
            parent_key_id: None,
            can_rollback: false,
            rollback_expires_at: None,
            rotation_policy_id: new_key.rotation_policy_id,
            created_by_token_id: new_key.created_by_token_id,
            rotated_by_token_id: None,
            created_at: now,
            updated_at: now,
        };
        self.keys.save_key(&key).await?;

        info!(
            key_id = %key.id,
            tenant_id = %key.tenant_id,
            key_name = %key.key_name,
            kms_provider = %key.kms_provider,
            "Registered encryption key"
        );
        emit(
            self.audit.as_ref(),
            AuditEventType::KeyRegistered,
            AUDIT_SOURCE,
            key.tenant_id,
            now,
            KeyRegisteredPayload {
                key_id: key.id,
                key_name: key.key_name.clone(),
                key_type: key.key_type,
                kms_provider: key.kms_provider,
                rotation_policy_id: key.rotation_policy_id,
                created_by: key.created_by_token_id,
            },
        )
        .await;

        Ok(key)
    }

    /// Rotate `key_id` onto a reference the provider has already minted
    pub async fn rotate(
        &self,
        key_id: Uuid,
        new_reference: String,
        initiated_by: Option<Uuid>,
    ) -> KeyResult<RotatedKeys> {
        let current = self.load_active(key_id).await?;
        if new_reference.trim().is_empty() || new_reference == current.kms_key_id {
            return Err(KeyError::ExternalProvider(format!(
                "provider returned an unusable successor reference for key {}",
                key_id
            )));
        }

        let rotated = successor_of(
            &current,
            new_reference,
            initiated_by,
            Utc::now(),
            self.rollback_window,
        )?;
        self.keys
            .save_keys(&[rotated.retired.clone(), rotated.successor.clone()])
            .await?;

        info!(
            key_id = %rotated.retired.id,
            new_key_id = %rotated.successor.id,
            tenant_id = %rotated.successor.tenant_id,
            version = rotated.successor.version,
            "Rotated encryption key"
        );
        Ok(rotated)
    }

    /// Mint a successor through the key's provider, then rotate onto it
    pub async fn rotate_with_kms(
        &self,
        key_id: Uuid,
        initiated_by: Option<Uuid>,
    ) -> KeyResult<RotatedKeys> {
        let current = self.load_active(key_id).await?;
        let client = self.kms.client_for(current.kms_provider)?;
        let request = MintRequest::successor_of(&current);

        let reference = self
            .with_kms_timeout("mint", client.mint_reference(&request))
            .await?;
        self.with_kms_timeout("validate", client.validate_reference(&reference))
            .await?;

        self.rotate(key_id, reference, initiated_by).await
    }

    /// Reactivate the parent of `key_id` while its rollback window is open
    pub async fn rollback(
        &self,
        key_id: Uuid,
        initiated_by: Option<Uuid>,
    ) -> KeyResult<RolledBackKeys> {
        let now = Utc::now();
        let current = self.load_active(key_id).await?;
        let parent_id = current.parent_key_id.ok_or_else(|| {
            KeyError::Validation(format!("key {} has no parent to roll back to", key_id))
        })?;
        let parent = self.keys.get_key(parent_id).await?;
        if !parent.rollback_open_at(now) {
            return Err(KeyError::Validation(format!(
                "rollback window for key {} is closed",
                parent_id
            )));
        }

        let mut restored = parent;
        restored.status = KeyStatus::Active;
        restored.rotated_at = None;
        restored.rotated_by_token_id = None;
        restored.can_rollback = false;
        restored.rollback_expires_at = None;
        restored.updated_at = now;

        let mut deactivated = current;
        deactivated.status = KeyStatus::Inactive;
        deactivated.updated_at = now;

        self.keys
            .save_keys(&[deactivated.clone(), restored.clone()])
            .await?;

        warn!(
            restored_key_id = %restored.id,
            deactivated_key_id = %deactivated.id,
            tenant_id = %restored.tenant_id,
            "Rolled back key rotation"
        );
        emit(
            self.audit.as_ref(),
            AuditEventType::KeyRolledBack,
            AUDIT_SOURCE,
            restored.tenant_id,
            now,
            KeyRolledBackPayload {
                restored_key_id: restored.id,
                deactivated_key_id: deactivated.id,
                initiated_by,
            },
        )
        .await;

        Ok(RolledBackKeys {
            restored,
            deactivated,
        })
    }
}

/// Build the retired and successor rows for a rotation at `now`
fn successor_of(
    current: &EncryptionKey,
    new_reference: String,
    initiated_by: Option<Uuid>,
    now: DateTime<Utc>,
    rollback_window: chrono::Duration,
) -> KeyResult<RotatedKeys> {
    let version = current.version.checked_add(1).ok_or_else(|| {
        KeyError::Validation(format!("key {} reached its maximum version", current.id))
    })?;

    let successor = EncryptionKey {
        id: Uuid::new_v4(),
        tenant_id: current.tenant_id,
        key_name: current.key_name.clone(),
        key_type: current.key_type,
        kms_provider: current.kms_provider,
        kms_key_id: new_reference,
        algorithm: current.algorithm.clone(),
        status: KeyStatus::Active,
        version,
        activated_at: Some(now),
        expires_at: None,
        rotated_at: None,
        last_used_at: None,
        parent_key_id: Some(current.id),
        can_rollback: false,
        rollback_expires_at: None,
        rotation_policy_id: current.rotation_policy_id,
        created_by_token_id: initiated_by,
        rotated_by_token_id: None,
        created_at: now,
        updated_at: now,
    };

    let mut retired = current.clone();
    retired.status = KeyStatus::Rotated;
    retired.rotated_at = Some(now);
    retired.rotated_by_token_id = initiated_by;
    retired.can_rollback = rollback_window > chrono::Duration::zero();
    retired.rollback_expires_at = if retired.can_rollback {
        Some(now.checked_add_signed(rollback_window).ok_or_else(|| {
            KeyError::Validation(format!(
                "rollback window for key {} ends out of range",
                current.id
            ))
        })?)
    } else {
        None
    };
    retired.updated_at = now;

    Ok(RotatedKeys { retired, successor })
}
