use super::*;

use uuid::Uuid;

use crate::auth::provider::Identity;

// =============================================================================
// RECORDING NOTIFIER
// =============================================================================

#[derive(Default)]
struct RecordingNotifier {
    warnings: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_owned());
    }

    fn success(&self, _message: &str) {}
}

fn snapshot(user: Option<Identity>, role: Role, loading: bool) -> AuthSnapshot {
    AuthSnapshot { user, role, loading }
}

fn identity() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: "dr@example.com".into(),
        first_name: None,
        last_name: None,
    }
}

fn guard_with(
    initial: AuthSnapshot,
) -> (AuthGuard, watch::Sender<AuthSnapshot>, Arc<RecordingNotifier>) {
    let (tx, rx) = watch::channel(initial);
    let notifier = Arc::new(RecordingNotifier::default());
    let guard = AuthGuard::new(rx, Arc::clone(&notifier) as Arc<dyn Notifier>);
    (guard, tx, notifier)
}

// =============================================================================
// STATUS FLAGS
// =============================================================================

#[test]
fn loading_state_reports_all_false_flags() {
    let (guard, _tx, notifier) = guard_with(snapshot(None, Role::None, true));

    let status = guard.status();
    assert!(status.loading);
    assert!(!status.is_authenticated);
    assert!(!status.is_authorized);
    assert!(notifier.warnings.lock().unwrap().is_empty(), "no notice while loading");
}

#[test]
fn dentist_is_authenticated_and_authorized() {
    let (guard, _tx, notifier) = guard_with(snapshot(Some(identity()), Role::Dentist, false));

    let status = guard.status();
    assert!(status.is_authenticated);
    assert!(status.is_authorized);
    assert!(!status.loading);
    assert!(notifier.warnings.lock().unwrap().is_empty());
}

#[test]
fn signed_in_without_role_is_authenticated_not_authorized() {
    let (guard, _tx, _) = guard_with(snapshot(Some(identity()), Role::None, false));

    let status = guard.status();
    assert!(status.is_authenticated);
    assert!(!status.is_authorized);
}

#[test]
fn signed_out_reports_unauthenticated() {
    let (guard, _tx, _) = guard_with(snapshot(None, Role::None, false));

    let status = guard.status();
    assert!(!status.is_authenticated);
    assert!(!status.is_authorized);
}

// =============================================================================
// NOTICES — EDGE-TRIGGERED
// =============================================================================

#[test]
fn signed_out_denial_emits_login_notice_once() {
    let (guard, _tx, notifier) = guard_with(snapshot(None, Role::None, false));

    guard.status();
    guard.status();
    guard.status();

    let warnings = notifier.warnings.lock().unwrap();
    assert_eq!(*warnings, [LOGIN_REQUIRED_NOTICE]);
}

#[test]
fn wrong_role_denial_emits_distinct_notice() {
    let (guard, _tx, notifier) = guard_with(snapshot(Some(identity()), Role::None, false));

    guard.status();
    guard.status();

    let warnings = notifier.warnings.lock().unwrap();
    assert_eq!(*warnings, [UNAUTHORIZED_NOTICE]);
}

#[test]
fn notice_fires_on_loading_to_denied_transition() {
    let (guard, tx, notifier) = guard_with(snapshot(None, Role::None, true));

    guard.status();
    assert!(notifier.warnings.lock().unwrap().is_empty());

    tx.send(snapshot(None, Role::None, false)).unwrap();
    guard.status();
    guard.status();

    let warnings = notifier.warnings.lock().unwrap();
    assert_eq!(*warnings, [LOGIN_REQUIRED_NOTICE]);
}

#[test]
fn latch_rearms_when_denial_kind_changes() {
    let (guard, tx, notifier) = guard_with(snapshot(None, Role::None, false));

    guard.status();
    tx.send(snapshot(Some(identity()), Role::None, false)).unwrap();
    guard.status();

    let warnings = notifier.warnings.lock().unwrap();
    assert_eq!(*warnings, [LOGIN_REQUIRED_NOTICE, UNAUTHORIZED_NOTICE]);
}

#[test]
fn latch_rearms_after_successful_sign_in() {
    let (guard, tx, notifier) = guard_with(snapshot(None, Role::None, false));

    guard.status();
    tx.send(snapshot(Some(identity()), Role::Dentist, false)).unwrap();
    guard.status();
    tx.send(snapshot(None, Role::None, false)).unwrap();
    guard.status();

    let warnings = notifier.warnings.lock().unwrap();
    assert_eq!(*warnings, [LOGIN_REQUIRED_NOTICE, LOGIN_REQUIRED_NOTICE]);
}

#[test]
fn authorized_read_never_warns() {
    let (guard, tx, notifier) = guard_with(snapshot(Some(identity()), Role::Dentist, false));

    guard.status();
    tx.send(snapshot(Some(identity()), Role::Dentist, false)).unwrap();
    guard.status();

    assert!(notifier.warnings.lock().unwrap().is_empty());
}
