//! Role resolution — turn an authenticated identity into a clinical role.
//!
//! DESIGN
//! ======
//! One policy behind one trait. Earlier revisions of this system carried
//! several divergent strategies (email-domain heuristics, separate patient
//! tables); `DirectoryResolver` is the single surviving strategy: a dentist
//! is whoever the directory says is a dentist, with self-healing of records
//! provisioned before the user id was known.
//!
//! ERROR HANDLING
//! ==============
//! Resolution never fails outward. Any directory error degrades to
//! `Role::None` and is logged; the caller only ever observes the role.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::auth::directory::{DentistDirectory, NewDirectoryRecord};
use crate::auth::provider::Identity;

/// Clinical role of the current operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Dentist,
    None,
}

impl Role {
    #[must_use]
    pub fn is_dentist(self) -> bool {
        matches!(self, Self::Dentist)
    }
}

#[async_trait]
pub trait RoleResolver: Send + Sync {
    async fn resolve(&self, identity: &Identity) -> Role;
}

// =============================================================================
// DIRECTORY STRATEGY
// =============================================================================

pub struct DirectoryResolver {
    directory: Arc<dyn DentistDirectory>,
    /// When set, an identity with no directory record at all gets one created
    /// and becomes a dentist. Preserved from the observed system; see
    /// DESIGN.md before changing the default.
    auto_provision: bool,
}

impl DirectoryResolver {
    #[must_use]
    pub fn new(directory: Arc<dyn DentistDirectory>, auto_provision: bool) -> Self {
        Self { directory, auto_provision }
    }
}

/// Best-effort name fields for an auto-provisioned record: profile metadata
/// when present, otherwise the local part of the email.
fn provision_names(identity: &Identity) -> (String, String) {
    let first = identity
        .first_name
        .clone()
        .unwrap_or_else(|| identity.email.split('@').next().unwrap_or("dentist").to_owned());
    let last = identity.last_name.clone().unwrap_or_default();
    (first, last)
}

#[async_trait]
impl RoleResolver for DirectoryResolver {
    async fn resolve(&self, identity: &Identity) -> Role {
        // Primary lookup: stable user id.
        match self.directory.find_by_user_id(identity.id).await {
            Ok(Some(_)) => return Role::Dentist,
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, user_id = %identity.id, "directory lookup by user id failed");
                return Role::None;
            }
        }

        // Fallback: records provisioned by email before the id was known.
        match self.directory.find_by_email(&identity.email).await {
            Ok(Some(record)) => {
                match self.directory.attach_user_id(record.id, identity.id).await {
                    Ok(_) => {
                        info!(record_id = %record.id, user_id = %identity.id, "attached user id to directory record");
                        Role::Dentist
                    }
                    Err(e) => {
                        warn!(error = %e, record_id = %record.id, "failed to attach user id to directory record");
                        Role::None
                    }
                }
            }
            Ok(None) => {
                if !self.auto_provision {
                    return Role::None;
                }
                let (first_name, last_name) = provision_names(identity);
                let record = NewDirectoryRecord {
                    user_id: identity.id,
                    email: identity.email.clone(),
                    first_name,
                    last_name,
                };
                match self.directory.insert(record).await {
                    Ok(created) => {
                        info!(record_id = %created.id, email = %created.email, "auto-provisioned directory record");
                        Role::Dentist
                    }
                    Err(e) => {
                        // EDGE: a concurrent insert for the same email loses
                        // here on the unique constraint; treated as no role,
                        // the next resolution will find the winner's record.
                        warn!(error = %e, email = %identity.email, "directory record insert failed");
                        Role::None
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, email = %identity.email, "directory lookup by email failed");
                Role::None
            }
        }
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
