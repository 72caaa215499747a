//! Integration tests for the rotation scheduler

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use keyguard_keys::{
    KeyError, KeyRepository, KeyResult, KeyStore, KmsClient, KmsRegistry, LocalHsmClient,
    MemoryAuditSink, MintRequest, NewKey, PolicyAdministration, PolicyRepository, PolicyScope,
    RotationServices,
};
use keyguard_rotator::{
    BackoffConfig, KeyRotationResult, PolicyCycleStatus, RotationScheduler, SchedulerState,
};
use keyguard_types::schemas::{KeyRotationPayload, RotationOutcome};
use keyguard_types::{
    AuditEventType, CreateRotationPolicy, EncryptionKey, KeyStatus, KeyType, KmsProvider,
    PolicyStatus, RotationPolicy, TriggerKind,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;
use uuid::Uuid;

/// Issues sequential references and fails for selected key names
#[derive(Default)]
struct FakeKms {
    minted: AtomicUsize,
    failing: Mutex<HashSet<String>>,
    hold_next: AtomicBool,
    held: Notify,
    release: Notify,
}

impl FakeKms {
    fn fail_for(&self, key_name: &str) {
        self.failing.lock().unwrap().insert(key_name.to_string());
    }

    /// Park the next mint until `release` is notified
    fn hold_next_mint(&self) {
        self.hold_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KmsClient for FakeKms {
    fn provider(&self) -> KmsProvider {
        KmsProvider::AwsKms
    }

    async fn mint_reference(&self, request: &MintRequest) -> KeyResult<String> {
        if self.hold_next.swap(false, Ordering::SeqCst) {
            self.held.notify_one();
            self.release.notified().await;
        }
        let refused = self.failing.lock().unwrap().contains(&request.key_name);
        if refused {
            return Err(KeyError::ExternalProvider(format!(
                "mint refused for {}",
                request.key_name
            )));
        }
        let n = self.minted.fetch_add(1, Ordering::SeqCst);
        Ok(format!("arn:aws:kms:test:{}", n))
    }

    async fn validate_reference(&self, _reference: &str) -> KeyResult<()> {
        Ok(())
    }
}

/// Policy repository that is always unreachable
#[derive(Default)]
struct UnreachablePolicies {
    calls: AtomicUsize,
}

#[async_trait]
impl PolicyRepository for UnreachablePolicies {
    async fn list_active_policies(&self, _scope: PolicyScope) -> KeyResult<Vec<RotationPolicy>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(KeyError::Persistence("connection refused".to_string()))
    }

    async fn list_policies(&self, _tenant_id: Uuid) -> KeyResult<Vec<RotationPolicy>> {
        Err(KeyError::Persistence("connection refused".to_string()))
    }

    async fn get_policy(&self, _policy_id: Uuid) -> KeyResult<RotationPolicy> {
        Err(KeyError::Persistence("connection refused".to_string()))
    }

    async fn find_policy_by_name(
        &self,
        _tenant_id: Uuid,
        _policy_name: &str,
    ) -> KeyResult<Option<RotationPolicy>> {
        Err(KeyError::Persistence("connection refused".to_string()))
    }

    async fn save_policy(&self, _policy: &RotationPolicy) -> KeyResult<()> {
        Err(KeyError::Persistence("connection refused".to_string()))
    }

    async fn record_rotation(
        &self,
        _policy_id: Uuid,
        _now: DateTime<Utc>,
    ) -> KeyResult<RotationPolicy> {
        Err(KeyError::Persistence("connection refused".to_string()))
    }

    async fn set_policy_status(
        &self,
        _policy_id: Uuid,
        _status: PolicyStatus,
        _modified_by: Option<Uuid>,
        _now: DateTime<Utc>,
    ) -> KeyResult<(PolicyStatus, RotationPolicy)> {
        Err(KeyError::Persistence("connection refused".to_string()))
    }
}

/// Store wrapper that lets an admin deactivate a policy the first time the
/// scheduler touches its row after the keys were rotated
struct DeactivatedMidCycle {
    inner: Arc<KeyStore>,
    admin: PolicyAdministration,
    pending: Mutex<Option<Uuid>>,
}

impl DeactivatedMidCycle {
    async fn deactivate_pending(&self) {
        let pending = self.pending.lock().unwrap().take();
        if let Some(policy_id) = pending {
            self.admin
                .update_policy_status(policy_id, PolicyStatus::Inactive, None)
                .await
                .unwrap();
        }
    }
}

#[async_trait]
impl PolicyRepository for DeactivatedMidCycle {
    async fn list_active_policies(&self, scope: PolicyScope) -> KeyResult<Vec<RotationPolicy>> {
        self.inner.list_active_policies(scope).await
    }

    async fn list_policies(&self, tenant_id: Uuid) -> KeyResult<Vec<RotationPolicy>> {
        self.inner.list_policies(tenant_id).await
    }

    async fn get_policy(&self, policy_id: Uuid) -> KeyResult<RotationPolicy> {
        let policy = self.inner.get_policy(policy_id).await;
        self.deactivate_pending().await;
        policy
    }

    async fn find_policy_by_name(
        &self,
        tenant_id: Uuid,
        policy_name: &str,
    ) -> KeyResult<Option<RotationPolicy>> {
        self.inner.find_policy_by_name(tenant_id, policy_name).await
    }

    async fn save_policy(&self, policy: &RotationPolicy) -> KeyResult<()> {
        self.inner.save_policy(policy).await
    }

    async fn record_rotation(
        &self,
        policy_id: Uuid,
        now: DateTime<Utc>,
    ) -> KeyResult<RotationPolicy> {
        self.deactivate_pending().await;
        self.inner.record_rotation(policy_id, now).await
    }

    async fn set_policy_status(
        &self,
        policy_id: Uuid,
        status: PolicyStatus,
        modified_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> KeyResult<(PolicyStatus, RotationPolicy)> {
        self.inner
            .set_policy_status(policy_id, status, modified_by, now)
            .await
    }
}

struct Harness {
    tenant_id: Uuid,
    store: Arc<KeyStore>,
    kms: Arc<FakeKms>,
    audit: Arc<MemoryAuditSink>,
    services: RotationServices,
}

fn harness() -> Harness {
    harness_with_rollback_window(30)
}

fn harness_with_rollback_window(rollback_window_days: u32) -> Harness {
    let store = Arc::new(KeyStore::in_memory());
    let kms = Arc::new(FakeKms::default());
    let audit = Arc::new(MemoryAuditSink::new());
    let services = RotationServices::from_parts(
        store.clone(),
        KmsRegistry::new().with_client(kms.clone()),
        audit.clone(),
        rollback_window_days,
        Duration::from_secs(5),
    );
    Harness {
        tenant_id: Uuid::new_v4(),
        store,
        kms,
        audit,
        services,
    }
}

fn scheduler(h: &Harness) -> RotationScheduler {
    RotationScheduler::new(&h.services, PolicyScope::All, BackoffConfig::default())
}

fn policy_input(tenant_id: Uuid, name: &str, status: PolicyStatus) -> CreateRotationPolicy {
    CreateRotationPolicy {
        tenant_id,
        policy_name: name.to_string(),
        key_type: KeyType::Financial,
        kms_provider: KmsProvider::AwsKms,
        rotation_trigger: TriggerKind::TimeBased,
        rotation_interval_days: Some(30),
        event_name: None,
        usage_threshold: None,
        status: Some(status),
        created_by_token_id: None,
        correlation_id: None,
    }
}

async fn active_policy(h: &Harness, name: &str) -> RotationPolicy {
    h.services
        .admin
        .create_rotation_policy(policy_input(h.tenant_id, name, PolicyStatus::Active))
        .await
        .unwrap()
}

async fn bound_key(h: &Harness, policy: &RotationPolicy, key_name: &str) -> EncryptionKey {
    h.services
        .lifecycle
        .register_key(NewKey {
            tenant_id: h.tenant_id,
            key_name: key_name.to_string(),
            key_type: KeyType::Financial,
            kms_provider: KmsProvider::AwsKms,
            algorithm: "AES_256_GCM".to_string(),
            rotation_policy_id: Some(policy.id),
            expires_at: None,
            created_by_token_id: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_due_policy_rotates_every_bound_key() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let first = bound_key(&h, &policy, "invoices").await;
    let second = bound_key(&h, &policy, "ledger").await;

    let report = scheduler(&h).check_and_rotate_keys().await.unwrap();
    let result = report.policy(policy.id).unwrap();
    assert_eq!(result.status, PolicyCycleStatus::Completed);
    assert_eq!(result.rotated_keys, 2);
    assert_eq!(result.failed_keys, 0);

    for original in [&first, &second] {
        let retired = h.store.get_key(original.id).await.unwrap();
        assert_eq!(retired.status, KeyStatus::Rotated);
        assert!(retired.rotated_at.is_some());
        assert_eq!(retired.kms_key_id, original.kms_key_id);

        let successor = h
            .store
            .find_active_key(h.tenant_id, &original.key_name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(successor.parent_key_id, Some(original.id));
        assert_eq!(successor.version, original.version + 1);
        assert_eq!(successor.rotation_policy_id, Some(policy.id));
    }

    let rotated = h.audit.events_of(AuditEventType::KeyRotated);
    assert_eq!(rotated.len(), 2);
    let payload: KeyRotationPayload = rotated[0].payload_as().unwrap();
    assert_eq!(payload.policy_id, Some(policy.id));
    assert_eq!(payload.outcome, RotationOutcome::Success);
}

#[tokio::test]
async fn test_single_key_failure_does_not_stop_siblings() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let a = bound_key(&h, &policy, "key-a").await;
    let b = bound_key(&h, &policy, "key-b").await;
    let c = bound_key(&h, &policy, "key-c").await;
    h.kms.fail_for("key-b");

    let now = Utc::now();
    let report = scheduler(&h).check_and_rotate_keys_at(now).await.unwrap();
    let result = report.policy(policy.id).unwrap();
    assert_eq!(result.status, PolicyCycleStatus::Completed);
    assert_eq!(result.rotated_keys, 2);
    assert_eq!(result.failed_keys, 1);

    for key in [&a, &c] {
        let outcome = result.results.iter().find(|r| r.key_id() == key.id).unwrap();
        assert!(outcome.is_success());
        assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Rotated);
    }
    match result.results.iter().find(|r| r.key_id() == b.id).unwrap() {
        KeyRotationResult::Error { error, .. } => assert!(error.contains("mint refused")),
        other => panic!("expected failure for key-b, got {:?}", other),
    }
    assert_eq!(h.store.get_key(b.id).await.unwrap().status, KeyStatus::Active);

    let stored = h.store.get_policy(policy.id).await.unwrap();
    assert_eq!(stored.last_rotation_at, Some(now));
    assert_eq!(stored.next_rotation_at, Some(now + ChronoDuration::days(30)));

    let failed = h.audit.events_of(AuditEventType::KeyRotationFailed);
    assert_eq!(failed.len(), 1);
    let payload: KeyRotationPayload = failed[0].payload_as().unwrap();
    assert_eq!(payload.old_key_id, b.id);
    assert_eq!(payload.outcome, RotationOutcome::Failure);
    assert!(payload.new_key_id.is_none());
}

#[tokio::test]
async fn test_second_cycle_is_noop() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    bound_key(&h, &policy, "invoices").await;
    let scheduler = scheduler(&h);

    let first = scheduler.check_and_rotate_keys().await.unwrap();
    assert_eq!(first.rotated_keys(), 1);
    let minted = h.kms.minted.load(Ordering::SeqCst);

    let second = scheduler.check_and_rotate_keys().await.unwrap();
    assert_eq!(second.policies_evaluated, 1);
    assert!(second.policies.is_empty());
    assert_eq!(h.audit.events_of(AuditEventType::KeyRotated).len(), 1);
    assert_eq!(h.kms.minted.load(Ordering::SeqCst), minted);
}

#[tokio::test]
async fn test_inactive_policy_never_rotates() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let key = bound_key(&h, &policy, "invoices").await;
    h.services
        .admin
        .update_policy_status(policy.id, PolicyStatus::Inactive, None)
        .await
        .unwrap();

    let far_future = Utc::now() + ChronoDuration::days(3650);
    let report = scheduler(&h)
        .check_and_rotate_keys_at(far_future)
        .await
        .unwrap();
    assert_eq!(report.policies_evaluated, 0);
    assert!(report.policies.is_empty());
    assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Active);
}

#[tokio::test]
async fn test_deactivation_during_cycle_is_kept() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let key = bound_key(&h, &policy, "invoices").await;

    let mut services = h.services.clone();
    services.policies = Arc::new(DeactivatedMidCycle {
        inner: h.store.clone(),
        admin: PolicyAdministration::new(h.store.clone(), h.store.clone(), h.audit.clone()),
        pending: Mutex::new(Some(policy.id)),
    });
    let scheduler = RotationScheduler::new(&services, PolicyScope::All, BackoffConfig::default());

    let now = Utc::now();
    let report = scheduler.check_and_rotate_keys_at(now).await.unwrap();
    assert_eq!(report.rotated_keys(), 1);
    assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Rotated);

    let stored = h.store.get_policy(policy.id).await.unwrap();
    assert_eq!(stored.status, PolicyStatus::Inactive);
    assert_eq!(stored.last_rotation_at, Some(now));

    // The deactivated policy stays out of every later sweep
    let later = scheduler
        .check_and_rotate_keys_at(now + ChronoDuration::days(365))
        .await
        .unwrap();
    assert_eq!(later.policies_evaluated, 0);
    assert_eq!(h.audit.events_of(AuditEventType::KeyRotated).len(), 1);
}

#[tokio::test]
async fn test_out_of_range_rollback_window_does_not_stop_loop() {
    let h = harness_with_rollback_window(200_000_000);
    let policy = active_policy(&h, "billing").await;
    let key = bound_key(&h, &policy, "invoices").await;
    let scheduler = scheduler(&h);

    scheduler.start(Duration::from_secs(3600)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(scheduler.state().await, SchedulerState::Running);

    assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Active);
    let failed = h.audit.events_of(AuditEventType::KeyRotationFailed);
    assert_eq!(failed.len(), 1);
    let payload: KeyRotationPayload = failed[0].payload_as().unwrap();
    assert!(payload.error.unwrap().contains("out of range"));

    scheduler.stop().await;
}

#[tokio::test]
async fn test_stop_drains_in_flight_cycle() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let first = bound_key(&h, &policy, "invoices").await;
    let second = bound_key(&h, &policy, "ledger").await;
    let scheduler = Arc::new(scheduler(&h));

    h.kms.hold_next_mint();
    scheduler.start(Duration::from_secs(3600)).await.unwrap();
    h.kms.held.notified().await;

    let stopping = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.stop().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!stopping.is_finished());

    h.kms.release.notify_one();
    stopping.await.unwrap();
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);

    for key in [&first, &second] {
        assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Rotated);
    }
    let stored = h.store.get_policy(policy.id).await.unwrap();
    assert!(stored.last_rotation_at.is_some());
    assert_eq!(h.audit.events_of(AuditEventType::KeyRotated).len(), 2);
}

#[tokio::test]
async fn test_due_policy_without_keys_keeps_schedule() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;

    let report = scheduler(&h).check_and_rotate_keys().await.unwrap();
    assert!(report.policies.is_empty());

    let stored = h.store.get_policy(policy.id).await.unwrap();
    assert!(stored.last_rotation_at.is_none());
}

#[tokio::test]
async fn test_first_rotation_then_quiet_until_due() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let k1 = bound_key(&h, &policy, "invoices").await;
    let scheduler = scheduler(&h);

    let t0 = Utc::now();
    assert!(h.store.get_policy(policy.id).await.unwrap().should_rotate_at(t0));
    let report = scheduler.check_and_rotate_keys_at(t0).await.unwrap();
    let new_key_id = match &report.policy(policy.id).unwrap().results[0] {
        KeyRotationResult::Success { new_key_id, .. } => *new_key_id,
        other => panic!("expected success, got {:?}", other),
    };

    let k2 = h.store.get_key(new_key_id).await.unwrap();
    assert_eq!(k2.status, KeyStatus::Active);
    assert_eq!(k2.parent_key_id, Some(k1.id));
    assert_eq!(h.store.get_key(k1.id).await.unwrap().status, KeyStatus::Rotated);

    let stored = h.store.get_policy(policy.id).await.unwrap();
    assert_eq!(stored.last_rotation_at, Some(t0));

    let t1 = t0 + ChronoDuration::minutes(1);
    assert!(!stored.should_rotate_at(t1));
    let quiet = scheduler.check_and_rotate_keys_at(t1).await.unwrap();
    assert!(quiet.policies.is_empty());
    assert_eq!(h.store.get_key(k2.id).await.unwrap().status, KeyStatus::Active);

    // Once the interval has elapsed the chain advances again
    let t2 = t0 + ChronoDuration::days(30);
    let report = scheduler.check_and_rotate_keys_at(t2).await.unwrap();
    assert_eq!(report.rotated_keys(), 1);
    let k3 = h
        .store
        .find_active_key(h.tenant_id, "invoices")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(k3.parent_key_id, Some(k2.id));
    assert_eq!(k3.version, 3);
}

#[tokio::test]
async fn test_tenant_scope_limits_sweep() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let key = bound_key(&h, &policy, "invoices").await;

    let other_tenant = RotationScheduler::new(
        &h.services,
        PolicyScope::Tenant(Uuid::new_v4()),
        BackoffConfig::default(),
    );
    let report = other_tenant.check_and_rotate_keys().await.unwrap();
    assert_eq!(report.policies_evaluated, 0);
    assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Active);

    let own_tenant = RotationScheduler::new(
        &h.services,
        PolicyScope::Tenant(h.tenant_id),
        BackoffConfig::default(),
    );
    let report = own_tenant.check_and_rotate_keys().await.unwrap();
    assert_eq!(report.rotated_keys(), 1);
}

#[tokio::test]
async fn test_cycle_error_surfaces_from_manual_run() {
    let h = harness();
    let mut services = h.services.clone();
    services.policies = Arc::new(UnreachablePolicies::default());

    let scheduler = RotationScheduler::new(&services, PolicyScope::All, BackoffConfig::default());
    let err = scheduler.check_and_rotate_keys().await.unwrap_err();
    assert!(matches!(err, KeyError::Persistence(_)));
}

#[tokio::test]
async fn test_loop_survives_repository_outage_with_backoff() {
    let h = harness();
    let policies = Arc::new(UnreachablePolicies::default());
    let mut services = h.services.clone();
    services.policies = policies.clone();

    let scheduler = RotationScheduler::new(&services, PolicyScope::All, BackoffConfig::new(1, 60, 2.0));
    scheduler.start(Duration::from_millis(20)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(scheduler.state().await, SchedulerState::Running);

    // Without backoff the 20ms interval would have produced dozens of attempts
    let calls = policies.calls.load(Ordering::SeqCst);
    assert!((2..=3).contains(&calls), "unexpected attempt count {}", calls);

    scheduler.stop().await;
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);
}

#[tokio::test]
async fn test_start_stop_lifecycle() {
    let h = harness();
    let policy = active_policy(&h, "billing").await;
    let key = bound_key(&h, &policy, "invoices").await;
    let scheduler = scheduler(&h);
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);

    scheduler.start(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(scheduler.state().await, SchedulerState::Running);

    let err = scheduler.start(Duration::from_secs(3600)).await.unwrap_err();
    assert!(matches!(err, KeyError::Scheduler(_)));

    // The first cycle runs immediately after start
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.store.get_key(key.id).await.unwrap().status, KeyStatus::Rotated);

    scheduler.stop().await;
    assert_eq!(scheduler.state().await, SchedulerState::Stopped);

    // Stopping twice is harmless and the scheduler can be restarted
    scheduler.stop().await;
    scheduler.start(Duration::from_secs(3600)).await.unwrap();
    assert_eq!(scheduler.state().await, SchedulerState::Running);
    scheduler.stop().await;
}

#[tokio::test]
async fn test_zero_interval_rejected() {
    let h = harness();
    let err = scheduler(&h).start(Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, KeyError::Scheduler(_)));
}

#[tokio::test]
async fn test_end_to_end_with_local_hsm_and_file_store() {
    let dir = TempDir::new().unwrap();
    let store_path = dir.path().join("store.json");
    let tenant_id = Uuid::new_v4();

    let (policy_id, original) = {
        let store = Arc::new(KeyStore::open(&store_path).await.unwrap());
        let hsm = LocalHsmClient::from_secret(dir.path().join("kms"), Some("integration secret"))
            .await
            .unwrap();
        let services = RotationServices::from_parts(
            store.clone(),
            KmsRegistry::new().with_client(Arc::new(hsm)),
            Arc::new(MemoryAuditSink::new()),
            30,
            Duration::from_secs(5),
        );

        let mut input = policy_input(tenant_id, "phi-at-rest", PolicyStatus::Active);
        input.key_type = KeyType::PhiData;
        input.kms_provider = KmsProvider::LocalHsm;
        let policy = services.admin.create_rotation_policy(input).await.unwrap();

        let original = services
            .lifecycle
            .register_key(NewKey {
                tenant_id,
                key_name: "patients".to_string(),
                key_type: KeyType::PhiData,
                kms_provider: KmsProvider::LocalHsm,
                algorithm: "AES_256_GCM".to_string(),
                rotation_policy_id: Some(policy.id),
                expires_at: None,
                created_by_token_id: None,
            })
            .await
            .unwrap();

        let scheduler =
            RotationScheduler::new(&services, PolicyScope::Tenant(tenant_id), BackoffConfig::default());
        let report = scheduler.check_and_rotate_keys().await.unwrap();
        assert_eq!(report.rotated_keys(), 1);
        (policy.id, original)
    };

    // State survives a restart
    let store = KeyStore::open(&store_path).await.unwrap();
    let retired = store.get_key(original.id).await.unwrap();
    assert_eq!(retired.status, KeyStatus::Rotated);
    assert!(retired.can_rollback);

    let successor = store
        .find_active_key(tenant_id, "patients")
        .await
        .unwrap()
        .unwrap();
    assert!(successor.kms_key_id.starts_with("local-hsm:"));
    assert_ne!(successor.kms_key_id, original.kms_key_id);
    assert_eq!(successor.parent_key_id, Some(original.id));

    let policy = store.get_policy(policy_id).await.unwrap();
    assert!(policy.last_rotation_at.is_some());
}
