// Role-gated session authority for the relief platform web client
//
// Establishes and tracks an authenticated identity, resolves it to one of
// a fixed set of roles (donor / ngo / beneficiary), and exposes the single
// source of truth that route guards consult to admit or reject access to
// role-specific views. The remote identity provider and profile store are
// consumed through trait contracts; see kernel/traits.rs.

pub mod config;
pub mod domains;
pub mod kernel;

pub use config::Config;
pub use domains::auth::{
    evaluate, AuthError, GuardCommand, GuardDecision, Identity, Profile, Role, RouteGuard,
    SessionAuthority, SessionChange, SessionChangeKind, SessionState,
};
pub use kernel::{SessionDeps, SupabaseAdapter, TracingNotifier};
