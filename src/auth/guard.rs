//! Authorization guard — derived read-only view for role-gated screens.
//!
//! DESIGN
//! ======
//! The guard never errors; a denied screen is a normal state. The only side
//! effect is a single user-facing notice per observed denial transition:
//! re-reading the same denied state stays silent, and the latch re-arms when
//! the underlying state changes.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::auth::resolver::Role;
use crate::auth::store::AuthSnapshot;

pub const LOGIN_REQUIRED_NOTICE: &str = "Please log in to access this feature";
pub const UNAUTHORIZED_NOTICE: &str = "Unauthorized access. Please log in as a dentist.";

/// Fire-and-forget user-facing notification sink (toasts in the UI).
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
    fn success(&self, message: &str);
}

/// Default sink: structured log lines picked up by the office UI feed.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn warn(&self, message: &str) {
        tracing::warn!(notice = message, "user notice");
    }

    fn success(&self, message: &str) {
        tracing::info!(notice = message, "user notice");
    }
}

/// Guard status consumed by protected screens.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct GuardStatus {
    pub is_authenticated: bool,
    pub is_authorized: bool,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Denial {
    SignedOut,
    WrongRole,
}

pub struct AuthGuard {
    rx: watch::Receiver<AuthSnapshot>,
    notifier: Arc<dyn Notifier>,
    required_role: Role,
    last_denial: Mutex<Option<Denial>>,
}

impl AuthGuard {
    #[must_use]
    pub fn new(rx: watch::Receiver<AuthSnapshot>, notifier: Arc<dyn Notifier>) -> Self {
        Self { rx, notifier, required_role: Role::Dentist, last_denial: Mutex::new(None) }
    }

    /// Read the current status, emitting a notice on a newly observed denial.
    pub fn status(&self) -> GuardStatus {
        let snap = self.rx.borrow().clone();
        let is_authenticated = snap.user.is_some();
        let is_authorized = is_authenticated && snap.role == self.required_role;
        let status = GuardStatus { is_authenticated, is_authorized, loading: snap.loading };

        // While loading nothing is known yet; leave the latch alone.
        if snap.loading {
            return status;
        }

        let denial = if !is_authenticated {
            Some(Denial::SignedOut)
        } else if !is_authorized {
            Some(Denial::WrongRole)
        } else {
            None
        };

        let mut last = self.last_denial.lock().expect("guard latch poisoned");
        if *last != denial {
            match denial {
                Some(Denial::SignedOut) => self.notifier.warn(LOGIN_REQUIRED_NOTICE),
                Some(Denial::WrongRole) => self.notifier.warn(UNAUTHORIZED_NOTICE),
                None => {}
            }
            *last = denial;
        }

        status
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
