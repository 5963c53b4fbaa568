use thiserror::Error;

use crate::domains::auth::models::Role;

/// Login/signup failures surfaced by the session authority.
///
/// All variants are reported through the notifier and rethrown to the
/// caller; none may leave the authority holding a half-authenticated
/// session.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Network or credential failure reported by the identity provider
    #[error("{0}")]
    Provider(String),

    /// Authenticated identity has no profile record; fatal for login,
    /// not recoverable by retry
    #[error("No profile found for this user")]
    NoProfile,

    /// The stored role differs from the role the user tried to log in
    /// as. The session is torn down rather than left logged in under the
    /// wrong role.
    #[error("This account is not registered as a {required}")]
    RoleMismatch { required: Role, actual: Option<Role> },

    /// Registration rejected by the provider (duplicate email, weak
    /// password, ...)
    #[error("{0}")]
    Signup(String),
}
