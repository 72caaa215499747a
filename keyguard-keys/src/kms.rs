//! KMS client interface
//!
//! The key lifecycle service never handles key material. It asks a provider
//! specific client to mint a new key and gets back an opaque reference:
//! - AWS KMS
//! - Azure Key Vault
//! - HashiCorp Vault
//! - Google Cloud KMS
//! - Local HSM (bundled, see `local_store`)
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
use async_trait::async_trait;
use keyguard_types::{EncryptionKey, KeyType, KmsProvider};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Request to mint a new key inside a provider
#[derive(Debug, Clone)]
pub struct MintRequest {
    pub tenant_id: Uuid,
    pub key_name: String,
    pub key_type: KeyType,
    pub algorithm: String,
    /// Reference being replaced, `None` for the first key of a chain
    pub previous_reference: Option<String>,
}

impl MintRequest {
    /// Request for the successor of an existing key
    pub fn successor_of(key: &EncryptionKey) -> Self {
        Self {
            tenant_id: key.tenant_id,
            key_name: key.key_name.clone(),
            key_type: key.key_type,
            algorithm: key.algorithm.clone(),
            previous_reference: Some(key.kms_key_id.clone()),
        }
    }
}

/// Trait for KMS provider clients
#[async_trait]
pub trait KmsClient: Send + Sync {
    /// Provider this client talks to
    fn provider(&self) -> KmsProvider;

    /// Create a new key in the provider and return its reference
    async fn mint_reference(&self, request: &MintRequest) -> KeyResult<String>;

    /// Confirm the provider still holds a usable key for `reference`
    async fn validate_reference(&self, reference: &str) -> KeyResult<()>;
}

/// KMS clients indexed by provider
#[derive(Default, Clone)]
pub struct KmsRegistry {
    clients: HashMap<KmsProvider, Arc<dyn KmsClient>>,
}

impl KmsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing any previous client for the same provider
    pub fn register(&mut self, client: Arc<dyn KmsClient>) {
        self.clients.insert(client.provider(), client);
    }

    pub fn with_client(mut self, client: Arc<dyn KmsClient>) -> Self {
        self.register(client);
        self
    }

    pub fn client_for(&self, provider: KmsProvider) -> KeyResult<Arc<dyn KmsClient>> {
        self.clients.get(&provider).cloned().ok_or_else(|| {
            KeyError::ExternalProvider(format!("no KMS client configured for {}", provider))
        })
    }

    pub fn providers(&self) -> Vec<KmsProvider> {
        self.clients.keys().copied().collect()
    }
}
