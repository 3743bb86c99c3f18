//! Session/role store — the single source of truth for "who is signed in
//! and what can they do".
//!
//! DESIGN
//! ======
//! State lives in a `watch` channel so screens subscribe to one
//! `(user, role, loading)` snapshot instead of reaching for ambient globals.
//! Session-change events (sign-in, sign-out, startup restore) update the
//! snapshot synchronously and schedule role resolution on a spawned task,
//! outside the caller's stack, so the store never re-enters the identity
//! provider while it is mid-notification.
//!
//! CONCURRENCY
//! ===========
//! Every session change bumps an epoch under the store lock. A resolution
//! task carries the epoch it was scheduled for and is discarded at apply
//! time if the store has moved on. A rapid sign-out-then-sign-in therefore
//! cannot end up wearing the old session's role, regardless of which
//! directory round-trip finishes first.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::auth::provider::{AuthError, Identity, IdentityProvider, ProviderSession};
use crate::auth::resolver::{Role, RoleResolver};

/// Subscribable store state. `loading` is true from construction until the
/// first resolution (restore or sign-in) has been applied.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub user: Option<Identity>,
    pub role: Role,
    pub loading: bool,
}

struct StoreInner {
    /// Bumped on every session change; resolutions apply only if they still
    /// match.
    epoch: u64,
    session: Option<ProviderSession>,
}

pub struct AuthStore {
    provider: Arc<dyn IdentityProvider>,
    resolver: Arc<dyn RoleResolver>,
    inner: Mutex<StoreInner>,
    tx: watch::Sender<AuthSnapshot>,
}

impl AuthStore {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, resolver: Arc<dyn RoleResolver>) -> Arc<Self> {
        let (tx, _rx) = watch::channel(AuthSnapshot { user: None, role: Role::None, loading: true });
        Arc::new(Self {
            provider,
            resolver,
            inner: Mutex::new(StoreInner { epoch: 0, session: None }),
            tx,
        })
    }

    /// Subscribe to `(user, role, loading)` snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot by value.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Identity> {
        self.tx.borrow().user.clone()
    }

    #[must_use]
    pub fn current_role(&self) -> Role {
        self.tx.borrow().role
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.tx.borrow().loading
    }

    /// Restore a previously issued session at startup, if any. Resolves the
    /// restored identity's role exactly like a fresh sign-in would.
    pub async fn initialize(self: &Arc<Self>) {
        match self.provider.get_session().await {
            Ok(Some(session)) => {
                info!(email = %session.identity.email, "restored existing session");
                self.apply_session_change(Some(session));
            }
            Ok(None) => {
                debug!("no session to restore");
                self.apply_session_change(None);
            }
            Err(e) => {
                warn!(error = %e, "session restore failed");
                self.apply_session_change(None);
            }
        }
    }

    /// Exchange credentials with the identity provider.
    ///
    /// On success the role is NOT set here; the session-change path schedules
    /// resolution and the caller observes completion through the snapshot.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unmodified. Local state is untouched on
    /// failure apart from `loading` returning to false.
    pub async fn sign_in(self: &Arc<Self>, email: &str, password: &str) -> Result<(), AuthError> {
        self.tx.send_modify(|snap| snap.loading = true);

        match self.provider.sign_in_with_password(email, password).await {
            Ok(session) => {
                info!(email = %session.identity.email, "signed in");
                self.apply_session_change(Some(session));
                Ok(())
            }
            Err(e) => {
                self.tx.send_modify(|snap| snap.loading = false);
                Err(e)
            }
        }
    }

    /// Clear local session, identity, and role unconditionally. The provider
    /// call is best-effort: a failure is logged and never leaves the store
    /// looking signed in.
    pub async fn sign_out(self: &Arc<Self>) {
        let token = {
            let inner = self.inner.lock().expect("auth store lock poisoned");
            inner.session.as_ref().map(|s| s.access_token.clone())
        };

        if let Some(token) = token {
            if let Err(e) = self.provider.sign_out(&token).await {
                warn!(error = %e, "provider sign-out failed; clearing local session anyway");
            }
        }

        self.apply_session_change(None);
    }

    /// Process one session-change event: refresh the borrowed session, bump
    /// the epoch, publish the identity immediately, and schedule role
    /// resolution for the new epoch.
    fn apply_session_change(self: &Arc<Self>, session: Option<ProviderSession>) {
        let epoch = {
            let mut inner = self.inner.lock().expect("auth store lock poisoned");
            inner.epoch += 1;
            inner.session = session.clone();
            inner.epoch
        };

        match session {
            Some(session) => {
                let identity = session.identity.clone();
                self.tx.send_modify(|snap| {
                    snap.user = Some(identity.clone());
                    snap.role = Role::None;
                    snap.loading = true;
                });

                let store = Arc::clone(self);
                tokio::spawn(async move {
                    let role = store.resolver.resolve(&identity).await;
                    store.apply_resolution(epoch, role);
                });
            }
            None => {
                // Signed out: no directory round-trip, the "resolution" is
                // immediate.
                self.tx.send_modify(|snap| {
                    snap.user = None;
                    snap.role = Role::None;
                    snap.loading = false;
                });
            }
        }
    }

    /// Apply a finished resolution, unless the session it targeted has been
    /// superseded.
    fn apply_resolution(&self, epoch: u64, role: Role) {
        let current = {
            let inner = self.inner.lock().expect("auth store lock poisoned");
            inner.epoch
        };
        if current != epoch {
            debug!(scheduled = epoch, current, "discarding stale role resolution");
            return;
        }

        self.tx.send_modify(|snap| {
            snap.role = role;
            snap.loading = false;
        });
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
