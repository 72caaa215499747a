//! Local HSM client backed by encrypted key files
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
use crate::kms::{KmsClient, MintRequest};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use async_trait::async_trait;
use keyguard_types::KmsProvider;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix of every reference issued by the local HSM
pub const LOCAL_HSM_REFERENCE_PREFIX: &str = "local-hsm:";

/// Size of generated key material
const KEY_MATERIAL_LEN: usize = 32;

const NONCE_LEN: usize = 12;

/// Master key wrapping every stored key
type MasterKey = [u8; 32];

/// Local HSM emulation.
///
/// Generates key material itself, wraps it with AES-256-GCM under a master
/// key and writes it to `storage_path`. Callers only ever see the
/// `local-hsm:` reference.
pub struct LocalHsmClient {
    storage_path: PathBuf,
    master_key: MasterKey,
}

impl LocalHsmClient {
    /// Create a new local HSM client
    ///
    /// # Arguments
    /// * `storage_path` - Directory where wrapped keys will be stored
    /// * `master_key` - Optional 32 byte master key (if None, an ephemeral one is generated)
    pub async fn new<P: AsRef<Path>>(storage_path: P, master_key: Option<&[u8]>) -> KeyResult<Self> {
        let storage_path = storage_path.as_ref().to_path_buf();
        fs::create_dir_all(&storage_path).await?;

        let master_key = match master_key {
            Some(key) => {
                if key.len() != 32 {
                    return Err(KeyError::Configuration(
                        "Master key must be exactly 32 bytes".to_string(),
                    ));
                }
                let mut mk = [0u8; 32];
                mk.copy_from_slice(key);
                mk
            }
            None => Self::ephemeral_master_key(),
        };

        Ok(Self {
            storage_path,
            master_key,
        })
    }

    /// Create a client from a configured secret.
    ///
    /// A 64 character hex string is used as-is, anything else is hashed
    /// with SHA-256.
    pub async fn from_secret<P: AsRef<Path>>(storage_path: P, secret: Option<&str>) -> KeyResult<Self> {
        match secret {
            Some(secret) => {
                let master_key = Self::derive_master_key(secret);
                Self::new(storage_path, Some(&master_key)).await
            }
            None => Self::new(storage_path, None).await,
        }
    }

    fn derive_master_key(secret: &str) -> MasterKey {
        if let Ok(key_bytes) = hex::decode(secret) {
            if key_bytes.len() == 32 {
                let mut mk = [0u8; 32];
                mk.copy_from_slice(&key_bytes);
                return mk;
            }
        }
        let hash = Sha256::digest(secret.as_bytes());
        let mut mk = [0u8; 32];
        mk.copy_from_slice(&hash);
        mk
    }

    fn ephemeral_master_key() -> MasterKey {
        warn!("No local HSM master key configured, generating an ephemeral one. Wrapped keys will not survive a restart!");
        let mut master_key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut master_key);
        master_key
    }

    /// Wrap key material under the master key, nonce first
    fn wrap(&self, material: &[u8]) -> KeyResult<Vec<u8>> {
        let cipher = Aes256Gcm::new(&self.master_key.into());
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, material)
            .map_err(|e| KeyError::Encryption(format!("Key wrapping failed: {}", e)))?;

        let mut result = nonce.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn unwrap_material(&self, wrapped: &[u8]) -> KeyResult<Vec<u8>> {
        if wrapped.len() < NONCE_LEN {
            return Err(KeyError::Decryption("Wrapped key too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = wrapped.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = Aes256Gcm::new(&self.master_key.into());

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| KeyError::Decryption(format!("Key unwrapping failed: {}", e)))
    }

    /// Reference id without prefix; rejects anything we could not have issued
    fn parse_reference(reference: &str) -> KeyResult<Uuid> {
        reference
            .strip_prefix(LOCAL_HSM_REFERENCE_PREFIX)
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| {
                KeyError::ExternalProvider(format!("not a local HSM reference: {}", reference))
            })
    }

    fn key_path(&self, id: &Uuid) -> PathBuf {
        self.storage_path.join(format!("{}.key", id.simple()))
    }

    async fn write_new(&self, id: &Uuid, wrapped: &[u8]) -> KeyResult<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.key_path(id))
            .await?;
        file.write_all(wrapped).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl KmsClient for LocalHsmClient {
    fn provider(&self) -> KmsProvider {
        KmsProvider::LocalHsm
    }

    async fn mint_reference(&self, request: &MintRequest) -> KeyResult<String> {
        let id = Uuid::new_v4();

        let mut material = [0u8; KEY_MATERIAL_LEN];
        rand::thread_rng().fill_bytes(&mut material);
        let wrapped = self.wrap(&material);
        material.fill(0);
        let wrapped = wrapped?;

        self.write_new(&id, &wrapped)
            .await
            .map_err(|e| KeyError::ExternalProvider(format!("local HSM write failed: {}", e)))?;

        let reference = format!("{}{}", LOCAL_HSM_REFERENCE_PREFIX, id);
        info!(
            tenant_id = %request.tenant_id,
            key_name = %request.key_name,
            key_type = %request.key_type,
            reference = %reference,
            replaces = ?request.previous_reference,
            "Minted local HSM key"
        );
        Ok(reference)
    }

    async fn validate_reference(&self, reference: &str) -> KeyResult<()> {
        let id = Self::parse_reference(reference)?;
        let wrapped = fs::read(self.key_path(&id)).await.map_err(|e| {
            KeyError::ExternalProvider(format!("local HSM key {} unreadable: {}", reference, e))
        })?;

        let mut material = self
            .unwrap_material(&wrapped)
            .map_err(|e| KeyError::ExternalProvider(e.to_string()))?;
        let valid = material.len() == KEY_MATERIAL_LEN;
        material.fill(0);

        if !valid {
            return Err(KeyError::ExternalProvider(format!(
                "local HSM key {} has unexpected length",
                reference
            )));
        }
        debug!(reference = %reference, "Validated local HSM key");
        Ok(())
    }
}
