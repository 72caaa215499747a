//! Policy and key store with optional JSON snapshot persistence
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


use crate::error::{KeyError, KeyResult};
use crate::repository::{KeyRepository, PolicyRepository, PolicyScope};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keyguard_types::{EncryptionKey, KeyStatus, PolicyStatus, RotationPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct Snapshot {
    policies: HashMap<Uuid, RotationPolicy>,
    keys: HashMap<Uuid, EncryptionKey>,
}

/// On-disk layout of a snapshot
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotFile {
    policies: Vec<RotationPolicy>,
    keys: Vec<EncryptionKey>,
}

impl From<&Snapshot> for SnapshotFile {
    fn from(snapshot: &Snapshot) -> Self {
        let mut policies: Vec<_> = snapshot.policies.values().cloned().collect();
        policies.sort_by_key(|p| (p.created_at, p.id));
        let mut keys: Vec<_> = snapshot.keys.values().cloned().collect();
        keys.sort_by_key(|k| (k.created_at, k.id));
        Self { policies, keys }
    }
}

impl From<SnapshotFile> for Snapshot {
    fn from(file: SnapshotFile) -> Self {
        Self {
            policies: file.policies.into_iter().map(|p| (p.id, p)).collect(),
            keys: file.keys.into_iter().map(|k| (k.id, k)).collect(),
        }
    }
}

/// Policy and key store.
///
/// Every mutation is applied to a copy of the current snapshot, written to
/// disk (when a path is configured) and only then swapped in, so a failed
/// write leaves no partial state behind. Writers are serialized by the lock.
pub struct KeyStore {
    path: Option<PathBuf>,
    state: RwLock<Snapshot>,
}

impl KeyStore {
    /// Store without persistence
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(Snapshot::default()),
        }
    }

    /// Open a store persisted to `path`, loading it if it exists
    pub async fn open<P: AsRef<Path>>(path: P) -> KeyResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let snapshot = match fs::read(&path).await {
            Ok(bytes) => {
                let file: SnapshotFile = serde_json::from_slice(&bytes)?;
                Snapshot::from(file)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            policies = snapshot.policies.len(),
            keys = snapshot.keys.len(),
            "Opened key store"
        );

        Ok(Self {
            path: Some(path),
            state: RwLock::new(snapshot),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> KeyResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(&SnapshotFile::from(snapshot))
            .map_err(|e| KeyError::Persistence(format!("snapshot encoding failed: {}", e)))?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)
            .await
            .map_err(|e| KeyError::Persistence(format!("snapshot write failed: {}", e)))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| KeyError::Persistence(format!("snapshot rename failed: {}", e)))?;

        debug!(path = %path.display(), "Persisted key store snapshot");
        Ok(())
    }

    async fn commit<T, F>(&self, apply: F) -> KeyResult<T>
    where
        F: FnOnce(&mut Snapshot) -> KeyResult<T> + Send,
        T: Send,
    {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let output = apply(&mut next)?;
        self.persist(&next).await?;
        *state = next;
        Ok(output)
    }
}

impl Snapshot {
    fn policy_mut(&mut self, policy_id: Uuid) -> KeyResult<&mut RotationPolicy> {
        self.policies
            .get_mut(&policy_id)
            .ok_or_else(|| KeyError::NotFound(format!("rotation policy {}", policy_id)))
    }
}

/// A KMS reference belongs to exactly one key row
fn check_unique_reference(snapshot: &Snapshot, changed: &[EncryptionKey]) -> KeyResult<()> {
    for key in changed {
        let reused = snapshot
            .keys
            .values()
            .any(|other| other.id != key.id && other.kms_key_id == key.kms_key_id);
        if reused {
            return Err(KeyError::AlreadyExists(format!(
                "KMS reference {} is already held by another key",
                key.kms_key_id
            )));
        }
    }
    Ok(())
}

/// At most one ACTIVE key per lineage chain touched by `changed`
fn check_single_active(snapshot: &Snapshot, changed: &[EncryptionKey]) -> KeyResult<()> {
    for key in changed.iter().filter(|k| k.is_active()) {
        let active = snapshot
            .keys
            .values()
            .filter(|other| other.is_active() && other.same_chain(key))
            .count();
        if active > 1 {
            return Err(KeyError::AlreadyExists(format!(
                "key chain {} already has an active key",
                key.key_name
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl PolicyRepository for KeyStore {
    async fn list_active_policies(&self, scope: PolicyScope) -> KeyResult<Vec<RotationPolicy>> {
        let state = self.state.read().await;
        let mut policies: Vec<_> = state
            .policies
            .values()
            .filter(|p| p.is_active() && scope.includes(p.tenant_id))
            .cloned()
            .collect();
        policies.sort_by_key(|p| (p.created_at, p.id));
        Ok(policies)
    }

    async fn list_policies(&self, tenant_id: Uuid) -> KeyResult<Vec<RotationPolicy>> {
        let state = self.state.read().await;
        let mut policies: Vec<_> = state
            .policies
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect();
        policies.sort_by(|a, b| a.policy_name.cmp(&b.policy_name));
        Ok(policies)
    }

    async fn get_policy(&self, policy_id: Uuid) -> KeyResult<RotationPolicy> {
        let state = self.state.read().await;
        state
            .policies
            .get(&policy_id)
            .cloned()
            .ok_or_else(|| KeyError::NotFound(format!("rotation policy {}", policy_id)))
    }

    async fn find_policy_by_name(
        &self,
        tenant_id: Uuid,
        policy_name: &str,
    ) -> KeyResult<Option<RotationPolicy>> {
        let state = self.state.read().await;
        Ok(state
            .policies
            .values()
            .find(|p| p.tenant_id == tenant_id && p.policy_name == policy_name)
            .cloned())
    }

    async fn save_policy(&self, policy: &RotationPolicy) -> KeyResult<()> {
        let policy = policy.clone();
        self.commit(move |snapshot| {
            let duplicate = snapshot.policies.values().any(|other| {
                other.id != policy.id
                    && other.tenant_id == policy.tenant_id
                    && other.policy_name == policy.policy_name
            });
            if duplicate {
                return Err(KeyError::AlreadyExists(format!(
                    "rotation policy {}",
                    policy.policy_name
                )));
            }
            snapshot.policies.insert(policy.id, policy);
            Ok(())
        })
        .await
    }

    async fn record_rotation(
        &self,
        policy_id: Uuid,
        now: DateTime<Utc>,
    ) -> KeyResult<RotationPolicy> {
        self.commit(move |snapshot| {
            let policy = snapshot.policy_mut(policy_id)?;
            policy.update_rotation_schedule_at(now)?;
            Ok(policy.clone())
        })
        .await
    }

    async fn set_policy_status(
        &self,
        policy_id: Uuid,
        status: PolicyStatus,
        modified_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> KeyResult<(PolicyStatus, RotationPolicy)> {
        self.commit(move |snapshot| {
            let policy = snapshot.policy_mut(policy_id)?;
            let previous = policy.status;
            if !previous.can_transition_to(status) {
                return Err(KeyError::Validation(format!(
                    "policy {} cannot move from {} to {}",
                    policy_id, previous, status
                )));
            }
            policy.status = status;
            policy.last_modified_by_token_id = modified_by;
            policy.updated_at = now;
            Ok((previous, policy.clone()))
        })
        .await
    }
}

#[async_trait]
impl KeyRepository for KeyStore {
    async fn get_key(&self, key_id: Uuid) -> KeyResult<EncryptionKey> {
        let state = self.state.read().await;
        state
            .keys
            .get(&key_id)
            .cloned()
            .ok_or_else(|| KeyError::NotFound(format!("encryption key {}", key_id)))
    }

    async fn save_key(&self, key: &EncryptionKey) -> KeyResult<()> {
        self.save_keys(std::slice::from_ref(key)).await
    }

    async fn save_keys(&self, keys: &[EncryptionKey]) -> KeyResult<()> {
        let keys = keys.to_vec();
        self.commit(move |snapshot| {
            for key in &keys {
                snapshot.keys.insert(key.id, key.clone());
            }
            check_unique_reference(snapshot, &keys)?;
            check_single_active(snapshot, &keys)
        })
        .await
    }

    async fn list_active_keys_for_policy(
        &self,
        policy: &RotationPolicy,
    ) -> KeyResult<Vec<EncryptionKey>> {
        let state = self.state.read().await;
        let mut keys: Vec<_> = state
            .keys
            .values()
            .filter(|k| k.status == KeyStatus::Active && policy.governs(k))
            .cloned()
            .collect();
        keys.sort_by_key(|k| (k.created_at, k.id));
        Ok(keys)
    }

    async fn find_active_key(
        &self,
        tenant_id: Uuid,
        key_name: &str,
    ) -> KeyResult<Option<EncryptionKey>> {
        let state = self.state.read().await;
        Ok(state
            .keys
            .values()
            .find(|k| k.is_active() && k.tenant_id == tenant_id && k.key_name == key_name)
            .cloned())
    }

    async fn list_rotated_keys(&self, tenant_id: Uuid, limit: usize) -> KeyResult<Vec<EncryptionKey>> {
        let state = self.state.read().await;
        let mut keys: Vec<_> = state
            .keys
            .values()
            .filter(|k| k.tenant_id == tenant_id && k.rotated_at.is_some())
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.rotated_at.cmp(&a.rotated_at));
        keys.truncate(limit);
        Ok(keys)
    }
}
