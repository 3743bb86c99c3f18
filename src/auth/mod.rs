//! Authentication core — session/role store, role resolution, and the
//! authorization guard used to gate office screens.
//!
//! ARCHITECTURE
//! ============
//! The store owns the single operator session for the process. It reacts to
//! session-change events (sign-in, sign-out, startup restore) by updating a
//! `watch` snapshot and scheduling a role resolution against the dentist
//! directory. Resolutions are tagged with an epoch so a result for a
//! superseded session can never clobber a newer one.
//!
//! All collaborators sit behind traits (`IdentityProvider`, `DentistDirectory`,
//! `RoleResolver`, `Notifier`) so the store and guard are constructed
//! explicitly by the composition root and tested against in-memory mocks.

pub mod directory;
pub mod guard;
pub mod provider;
pub mod resolver;
pub mod store;

pub use directory::{DentistDirectory, DirectoryError, DirectoryRecord, NewDirectoryRecord, PgDentistDirectory};
pub use guard::{AuthGuard, GuardStatus, Notifier, TracingNotifier};
pub use provider::{AuthError, AuthProviderConfig, HttpIdentityProvider, Identity, IdentityProvider, ProviderSession};
pub use resolver::{DirectoryResolver, Role, RoleResolver};
pub use store::{AuthSnapshot, AuthStore};
