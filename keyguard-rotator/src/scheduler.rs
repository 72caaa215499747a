//! Background key rotation scheduler
//!
//! A single tokio task evaluates active policies on a fixed interval and
//! rotates the keys bound to every due policy. Cycles never overlap, a
//! failing key never stops its siblings, and a failing cycle only delays
//! the next one.
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


use crate::backoff::BackoffConfig;
use crate::report::{CycleReport, KeyRotationResult, PolicyRotationResult};
use chrono::{DateTime, Utc};
use keyguard_config::SchedulerConfig;
use keyguard_keys::audit::emit;
use keyguard_keys::{
    AuditSink, KeyError, KeyLifecycleService, KeyRepository, KeyResult, PolicyRepository,
    PolicyScope, RotationServices,
};
use keyguard_types::schemas::{KeyRotationPayload, RotationOutcome};
use keyguard_types::{AuditEventType, EncryptionKey, RotationPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const AUDIT_SOURCE: &str = "rotation-scheduler";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// State shared between the scheduler handle and its background task
struct Inner {
    policies: Arc<dyn PolicyRepository>,
    keys: Arc<dyn KeyRepository>,
    lifecycle: Arc<KeyLifecycleService>,
    audit: Arc<dyn AuditSink>,
    scope: PolicyScope,
    backoff: BackoffConfig,
    /// Held for the duration of a cycle
    cycle_lock: Mutex<()>,
}

/// Periodically rotates keys bound to due policies
pub struct RotationScheduler {
    inner: Arc<Inner>,
    running: Mutex<Option<RunningLoop>>,
}

impl RotationScheduler {
    pub fn new(services: &RotationServices, scope: PolicyScope, backoff: BackoffConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                policies: services.policies.clone(),
                keys: services.keys.clone(),
                lifecycle: services.lifecycle.clone(),
                audit: services.audit.clone(),
                scope,
                backoff,
                cycle_lock: Mutex::new(()),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn from_config(services: &RotationServices, config: &SchedulerConfig) -> Self {
        let scope = match config.tenant_id {
            Some(tenant_id) => PolicyScope::Tenant(tenant_id),
            None => PolicyScope::All,
        };
        Self::new(services, scope, BackoffConfig::from(config))
    }

    pub async fn state(&self) -> SchedulerState {
        match self.running.lock().await.as_ref() {
            Some(running) if !running.task.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Start the periodic loop. Fails if it is already running.
    pub async fn start(&self, check_interval: Duration) -> KeyResult<()> {
        if check_interval.is_zero() {
            return Err(KeyError::Scheduler(
                "check interval must be greater than zero".to_string(),
            ));
        }

        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if !current.task.is_finished() {
                return Err(KeyError::Scheduler("rotation scheduler already running".to_string()));
            }
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(self.inner.clone(), check_interval, shutdown_rx));
        *running = Some(RunningLoop { shutdown, task });

        info!(
            check_interval_secs = check_interval.as_secs(),
            scope = ?self.inner.scope,
            "Rotation scheduler started"
        );
        Ok(())
    }

    /// Signal the loop to stop and wait for an in-flight cycle to finish
    pub async fn stop(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        info!("Stopping rotation scheduler");
        let _ = running.shutdown.send(true);
        if let Err(e) = running.task.await {
            error!(error = %e, "Rotation scheduler task ended abnormally");
        }
        info!("Rotation scheduler stopped");
    }

    /// Run one evaluation cycle now
    pub async fn check_and_rotate_keys(&self) -> KeyResult<CycleReport> {
        self.inner.check_and_rotate_keys(Utc::now()).await
    }

    /// Run one evaluation cycle as of `now`
    pub async fn check_and_rotate_keys_at(&self, now: DateTime<Utc>) -> KeyResult<CycleReport> {
        self.inner.check_and_rotate_keys(now).await
    }
}

async fn run_loop(inner: Arc<Inner>, check_interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut consecutive_failures: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let delay = match inner.check_and_rotate_keys(Utc::now()).await {
            Ok(report) => {
                consecutive_failures = 0;
                info!(
                    policies_evaluated = report.policies_evaluated,
                    policies_rotated = report.policies.len(),
                    rotated_keys = report.rotated_keys(),
                    failed_keys = report.failed_keys(),
                    failed_policies = report.failed_policies(),
                    "Rotation cycle finished"
                );
                check_interval
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                let delay = inner.backoff.delay_for_attempt(consecutive_failures);
                error!(
                    error = %e,
                    consecutive_failures = consecutive_failures,
                    retry_in_secs = delay.as_secs(),
                    "Rotation cycle failed, backing off"
                );
                delay
            }
        };

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    debug!("Rotation scheduler loop exited");
}

impl Inner {
    async fn check_and_rotate_keys(&self, now: DateTime<Utc>) -> KeyResult<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;

        let policies = self.policies.list_active_policies(self.scope).await?;
        let mut report = CycleReport::new(now, policies.len());

        for policy in policies {
            if !policy.should_rotate_at(now) {
                debug!(policy_id = %policy.id, policy_name = %policy.policy_name, "Policy not due");
                continue;
            }
            if let Some(result) = self.rotate_policy(policy, now).await {
                report.policies.push(result);
            }
        }

        Ok(report)
    }

    /// Rotate every key bound to a due policy, then advance its schedule once
    async fn rotate_policy(
        &self,
        policy: RotationPolicy,
        now: DateTime<Utc>,
    ) -> Option<PolicyRotationResult> {
        let keys = match self.keys.list_active_keys_for_policy(&policy).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(policy_id = %policy.id, error = %e, "Failed to load keys for policy");
                return Some(PolicyRotationResult::failed(&policy, e.to_string()));
            }
        };
        if keys.is_empty() {
            debug!(policy_id = %policy.id, "No active keys bound to due policy");
            return None;
        }

        info!(
            policy_id = %policy.id,
            policy_name = %policy.policy_name,
            keys = keys.len(),
            "Rotating keys for due policy"
        );

        let mut results = Vec::with_capacity(keys.len());
        for key in &keys {
            results.push(self.rotate_key(&policy, key).await);
        }

        let mut result = PolicyRotationResult::completed(&policy, results);
        if let Err(e) = self.advance_schedule(&policy, now).await {
            error!(
                policy_id = %policy.id,
                error = %e,
                "Failed to persist rotation schedule"
            );
            result.mark_failed(format!("schedule not persisted: {}", e));
        }

        if result.failed_keys > 0 {
            warn!(
                policy_id = %policy.id,
                rotated_keys = result.rotated_keys,
                failed_keys = result.failed_keys,
                "Policy rotation finished with failures"
            );
        }
        Some(result)
    }

    async fn rotate_key(&self, policy: &RotationPolicy, key: &EncryptionKey) -> KeyRotationResult {
        let (result, payload, event_type) = match self.lifecycle.rotate_with_kms(key.id, None).await {
            Ok(rotated) => (
                KeyRotationResult::Success {
                    key_id: key.id,
                    new_key_id: rotated.successor.id,
                },
                KeyRotationPayload {
                    policy_id: Some(policy.id),
                    old_key_id: key.id,
                    new_key_id: Some(rotated.successor.id),
                    initiated_by: None,
                    outcome: RotationOutcome::Success,
                    error: None,
                },
                AuditEventType::KeyRotated,
            ),
            Err(e) => {
                warn!(
                    policy_id = %policy.id,
                    key_id = %key.id,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Key rotation failed"
                );
                (
                    KeyRotationResult::Error {
                        key_id: key.id,
                        error: e.to_string(),
                    },
                    KeyRotationPayload {
                        policy_id: Some(policy.id),
                        old_key_id: key.id,
                        new_key_id: None,
                        initiated_by: None,
                        outcome: RotationOutcome::Failure,
                        error: Some(e.to_string()),
                    },
                    AuditEventType::KeyRotationFailed,
                )
            }
        };

        emit(
            self.audit.as_ref(),
            event_type,
            AUDIT_SOURCE,
            key.tenant_id,
            Utc::now(),
            payload,
        )
        .await;
        result
    }

    /// Record the firing on the stored row so concurrent status changes are kept
    async fn advance_schedule(&self, policy: &RotationPolicy, now: DateTime<Utc>) -> KeyResult<()> {
        let recorded = self.policies.record_rotation(policy.id, now).await?;
        debug!(
            policy_id = %recorded.id,
            next_rotation_at = ?recorded.next_rotation_at,
            "Advanced rotation schedule"
        );
        Ok(())
    }
}
