//! Auth domain - session establishment and role gating
//!
//! Architecture:
//!   provider stream + startup probe → SessionAuthority (merge, one owner)
//!   → watch channel → RouteGuard decisions (admit / deny / redirect)
//!
//! Responsibilities:
//! - Password login with role enforcement (mismatch tears the session down)
//! - Signup with the requested role as provider-side metadata
//! - Logout that never leaves the client stuck "logged in"
//! - Reconciling the session-change stream with the startup probe

pub mod errors;
pub mod events;
pub mod guard;
pub mod models;
pub mod session;

pub use errors::AuthError;
pub use events::{SessionChange, SessionChangeKind};
pub use guard::{evaluate, GuardCommand, GuardDecision, RouteGuard};
pub use models::{Identity, Profile, Role, SessionState};
pub use session::SessionAuthority;
