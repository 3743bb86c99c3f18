use super::*;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use uuid::Uuid;

// =============================================================================
// MOCK PROVIDER
// =============================================================================

#[derive(Default)]
struct MockProvider {
    /// Accepted credentials: (email, password) -> session.
    accounts: Mutex<HashMap<(String, String), ProviderSession>>,
    restore: Mutex<Option<ProviderSession>>,
    fail_sign_out: AtomicBool,
    sign_in_calls: AtomicUsize,
}

impl MockProvider {
    fn with_account(email: &str, password: &str, user_id: Uuid) -> Self {
        let provider = Self::default();
        provider.add_account(email, password, user_id);
        provider
    }

    fn add_account(&self, email: &str, password: &str, user_id: Uuid) {
        let session = ProviderSession {
            access_token: format!("token-{user_id}"),
            identity: Identity { id: user_id, email: email.into(), first_name: None, last_name: None },
        };
        self.accounts
            .lock()
            .unwrap()
            .insert((email.into(), password.into()), session);
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<ProviderSession, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .lock()
            .unwrap()
            .get(&(email.to_owned(), password.to_owned()))
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn get_session(&self) -> Result<Option<ProviderSession>, AuthError> {
        Ok(self.restore.lock().unwrap().clone())
    }

    async fn get_current_user(&self, _access_token: &str) -> Result<Identity, AuthError> {
        Err(AuthError::Provider("not implemented".into()))
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Network("connection reset".into()));
        }
        Ok(())
    }
}

// =============================================================================
// MOCK RESOLVER
// =============================================================================

#[derive(Default)]
struct MockResolver {
    /// Role per user id; unknown ids resolve `Dentist`.
    roles: Mutex<HashMap<Uuid, Role>>,
    /// Optional gate per user id: resolution blocks until notified.
    gates: Mutex<HashMap<Uuid, Arc<Notify>>>,
    calls: AtomicUsize,
}

impl MockResolver {
    fn set_role(&self, user_id: Uuid, role: Role) {
        self.roles.lock().unwrap().insert(user_id, role);
    }

    fn gate(&self, user_id: Uuid) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(user_id, Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl RoleResolver for MockResolver {
    async fn resolve(&self, identity: &Identity) -> Role {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(&identity.id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.roles
            .lock()
            .unwrap()
            .get(&identity.id)
            .copied()
            .unwrap_or(Role::Dentist)
    }
}

fn build_store(provider: MockProvider, resolver: MockResolver) -> (Arc<AuthStore>, Arc<MockProvider>, Arc<MockResolver>) {
    let provider = Arc::new(provider);
    let resolver = Arc::new(resolver);
    let store = AuthStore::new(
        Arc::clone(&provider) as Arc<dyn IdentityProvider>,
        Arc::clone(&resolver) as Arc<dyn RoleResolver>,
    );
    (store, provider, resolver)
}

async fn settled(store: &Arc<AuthStore>) -> AuthSnapshot {
    let mut rx = store.subscribe();
    rx.wait_for(|snap| !snap.loading).await.unwrap().clone()
}

// =============================================================================
// SIGN-IN
// =============================================================================

#[tokio::test]
async fn sign_in_success_resolves_role_through_snapshot() {
    let user_id = Uuid::new_v4();
    let (store, _, _) = build_store(MockProvider::with_account("dr@example.com", "hunter2", user_id), MockResolver::default());

    store.sign_in("dr@example.com", "hunter2").await.unwrap();

    let snap = settled(&store).await;
    assert_eq!(snap.user.as_ref().map(|u| u.id), Some(user_id));
    assert_eq!(snap.role, Role::Dentist);
    assert!(!snap.loading);
}

#[tokio::test]
async fn sign_in_does_not_set_role_synchronously() {
    let user_id = Uuid::new_v4();
    let resolver = MockResolver::default();
    let gate = resolver.gate(user_id);
    let (store, _, _) = build_store(MockProvider::with_account("dr@example.com", "hunter2", user_id), resolver);

    store.sign_in("dr@example.com", "hunter2").await.unwrap();

    // Resolution is still in flight: identity published, role pending.
    let snap = store.snapshot();
    assert!(snap.user.is_some());
    assert_eq!(snap.role, Role::None);
    assert!(snap.loading);

    gate.notify_one();
    let snap = settled(&store).await;
    assert_eq!(snap.role, Role::Dentist);
}

#[tokio::test]
async fn credential_error_is_returned_and_state_untouched() {
    let (store, _, resolver) = build_store(MockProvider::default(), MockResolver::default());

    let err = store.sign_in("bad@x.com", "wrong").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(store.current_user().is_none());
    assert_eq!(store.current_role(), Role::None);
    assert!(!store.is_loading());
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0, "no resolution triggered");
}

#[tokio::test]
async fn failed_sign_in_preserves_existing_session() {
    let user_id = Uuid::new_v4();
    let (store, _, _) = build_store(MockProvider::with_account("dr@example.com", "hunter2", user_id), MockResolver::default());

    store.sign_in("dr@example.com", "hunter2").await.unwrap();
    settled(&store).await;

    let err = store.sign_in("dr@example.com", "typo").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    let snap = store.snapshot();
    assert_eq!(snap.user.as_ref().map(|u| u.id), Some(user_id));
    assert_eq!(snap.role, Role::Dentist);
    assert!(!snap.loading);
}

// =============================================================================
// SIGN-OUT
// =============================================================================

#[tokio::test]
async fn sign_out_clears_user_and_role() {
    let user_id = Uuid::new_v4();
    let (store, _, _) = build_store(MockProvider::with_account("dr@example.com", "hunter2", user_id), MockResolver::default());

    store.sign_in("dr@example.com", "hunter2").await.unwrap();
    settled(&store).await;

    store.sign_out().await;

    let snap = store.snapshot();
    assert!(snap.user.is_none());
    assert_eq!(snap.role, Role::None);
    assert!(!snap.loading);
}

#[tokio::test]
async fn sign_out_clears_locally_even_when_provider_fails() {
    let user_id = Uuid::new_v4();
    let provider = MockProvider::with_account("dr@example.com", "hunter2", user_id);
    provider.fail_sign_out.store(true, Ordering::SeqCst);
    let (store, _, _) = build_store(provider, MockResolver::default());

    store.sign_in("dr@example.com", "hunter2").await.unwrap();
    settled(&store).await;

    store.sign_out().await;

    assert!(store.current_user().is_none());
    assert_eq!(store.current_role(), Role::None);
}

#[tokio::test]
async fn sign_out_when_signed_out_is_a_no_op() {
    let (store, _, _) = build_store(MockProvider::default(), MockResolver::default());

    store.sign_out().await;

    assert!(store.current_user().is_none());
    assert!(!store.is_loading());
}

// =============================================================================
// STARTUP RESTORE
// =============================================================================

#[tokio::test]
async fn initialize_restores_session_and_resolves_role() {
    let user_id = Uuid::new_v4();
    let provider = MockProvider::default();
    *provider.restore.lock().unwrap() = Some(ProviderSession {
        access_token: "restored".into(),
        identity: Identity { id: user_id, email: "dr@example.com".into(), first_name: None, last_name: None },
    });
    let (store, _, _) = build_store(provider, MockResolver::default());

    store.initialize().await;

    let snap = settled(&store).await;
    assert_eq!(snap.user.as_ref().map(|u| u.id), Some(user_id));
    assert_eq!(snap.role, Role::Dentist);
}

#[tokio::test]
async fn initialize_without_session_finishes_loading_signed_out() {
    let (store, _, resolver) = build_store(MockProvider::default(), MockResolver::default());

    assert!(store.is_loading(), "loading until first resolution");
    store.initialize().await;

    let snap = store.snapshot();
    assert!(snap.user.is_none());
    assert_eq!(snap.role, Role::None);
    assert!(!snap.loading);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// STALE-RESOLUTION RACE
// =============================================================================

#[tokio::test]
async fn stale_resolution_for_superseded_session_is_discarded() {
    let u1 = Uuid::new_v4();
    let u2 = Uuid::new_v4();
    let provider = MockProvider::with_account("one@example.com", "pw", u1);
    provider.add_account("two@example.com", "pw", u2);

    let resolver = MockResolver::default();
    resolver.set_role(u1, Role::Dentist);
    resolver.set_role(u2, Role::None);
    let gate = resolver.gate(u1);

    let (store, _, _) = build_store(provider, resolver);

    // First sign-in: resolution for u1 blocks on the gate.
    store.sign_in("one@example.com", "pw").await.unwrap();

    // Second sign-in supersedes the first; u2 resolves immediately.
    store.sign_in("two@example.com", "pw").await.unwrap();
    let snap = settled(&store).await;
    assert_eq!(snap.user.as_ref().map(|u| u.id), Some(u2));
    assert_eq!(snap.role, Role::None);

    // Now let the stale u1 resolution finish; it must be discarded.
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snap = store.snapshot();
    assert_eq!(snap.user.as_ref().map(|u| u.id), Some(u2), "stale result must not clobber user");
    assert_eq!(snap.role, Role::None, "stale result must not clobber role");
    assert!(!snap.loading);
}

#[tokio::test]
async fn sign_out_then_sign_in_is_not_clobbered_by_old_resolution() {
    let u1 = Uuid::new_v4();
    let provider = MockProvider::with_account("one@example.com", "pw", u1);
    let resolver = MockResolver::default();
    resolver.set_role(u1, Role::Dentist);
    let gate = resolver.gate(u1);

    let (store, _, _) = build_store(provider, resolver);

    store.sign_in("one@example.com", "pw").await.unwrap();
    store.sign_out().await;

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let snap = store.snapshot();
    assert!(snap.user.is_none(), "old resolution must not resurrect a session");
    assert_eq!(snap.role, Role::None);
    assert!(!snap.loading);
}

// =============================================================================
// LOADING LIFECYCLE
// =============================================================================

#[tokio::test]
async fn loading_is_true_from_construction() {
    let (store, _, _) = build_store(MockProvider::default(), MockResolver::default());
    assert!(store.is_loading());
}

#[tokio::test]
async fn loading_stays_true_until_latest_resolution_applies() {
    let user_id = Uuid::new_v4();
    let resolver = MockResolver::default();
    let gate = resolver.gate(user_id);
    let (store, _, _) = build_store(MockProvider::with_account("dr@example.com", "pw", user_id), resolver);

    store.sign_in("dr@example.com", "pw").await.unwrap();
    assert!(store.is_loading());

    gate.notify_one();
    let snap = settled(&store).await;
    assert!(!snap.loading);
}
