//! Wiring of the rotation services from configuration
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


use crate::admin::PolicyAdministration;
use crate::audit::{AuditSink, TracingAuditSink};
use crate::error::KeyResult;
use crate::key_store::KeyStore;
use crate::kms::KmsRegistry;
use crate::lifecycle::KeyLifecycleService;
use crate::local_store::LocalHsmClient;
use crate::repository::{KeyRepository, PolicyRepository};
use keyguard_config::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Services constructed once at process start and handed to the scheduler
/// and the administration layer
#[derive(Clone)]
pub struct RotationServices {
    pub policies: Arc<dyn PolicyRepository>,
    pub keys: Arc<dyn KeyRepository>,
    pub kms: Arc<KmsRegistry>,
    pub audit: Arc<dyn AuditSink>,
    pub lifecycle: Arc<KeyLifecycleService>,
    pub admin: Arc<PolicyAdministration>,
}

impl RotationServices {
    /// Assemble services around an existing store
    pub fn from_parts(
        store: Arc<KeyStore>,
        kms: KmsRegistry,
        audit: Arc<dyn AuditSink>,
        rollback_window_days: u32,
        kms_timeout: Duration,
    ) -> Self {
        let policies: Arc<dyn PolicyRepository> = store.clone();
        let keys: Arc<dyn KeyRepository> = store;
        let kms = Arc::new(kms);

        let lifecycle = Arc::new(KeyLifecycleService::new(
            keys.clone(),
            kms.clone(),
            audit.clone(),
            rollback_window_days,
            kms_timeout,
        ));
        let admin = Arc::new(PolicyAdministration::new(
            policies.clone(),
            keys.clone(),
            audit.clone(),
        ));

        Self {
            policies,
            keys,
            kms,
            audit,
            lifecycle,
            admin,
        }
    }
}

/// Initialize rotation services from application configuration
pub async fn init_rotation_services(config: &AppConfig) -> KeyResult<RotationServices> {
    let store = match config.store.path.as_deref() {
        Some(path) if config.store.is_persistent() => {
            info!(path = %path, "Initializing persistent key store");
            KeyStore::open(path).await?
        }
        _ => {
            warn!("No store path configured, policies and keys are kept in memory only");
            KeyStore::in_memory()
        }
    };

    info!(path = %config.kms.local_storage_path, "Initializing local HSM");
    let local_hsm = LocalHsmClient::from_secret(
        &config.kms.local_storage_path,
        config.kms.master_key.as_deref(),
    )
    .await?;
    let kms = KmsRegistry::new().with_client(Arc::new(local_hsm));

    Ok(RotationServices::from_parts(
        Arc::new(store),
        kms,
        Arc::new(TracingAuditSink),
        config.rotation.rollback_window_days,
        config.scheduler.rotation_timeout(),
    ))
}
