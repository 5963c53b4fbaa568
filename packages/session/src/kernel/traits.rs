// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no session logic. The session
// authority decides what happens; these capabilities execute it.
//
// Naming convention: Base* for trait names (e.g., BaseIdentityProvider)

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domains::auth::events::SessionChange;
use crate::domains::auth::models::{Identity, Profile};

// =============================================================================
// Identity Provider Trait (Infrastructure - remote auth capability)
// =============================================================================

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Register a new account. `metadata` is attached provider-side to
    /// the created user (the requested role travels there). Does not
    /// establish a session when the provider requires verification first.
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<Identity>;

    /// Exchange credentials for an authenticated identity
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    /// End the current provider-side session
    async fn sign_out(&self) -> Result<()>;

    /// One-shot probe for an already-established session. Needed because
    /// some providers deliver stream events only on *change*, not on
    /// existing-session restoration.
    async fn current_session(&self) -> Result<Option<Identity>>;

    /// Session lifecycle stream. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;
}

// =============================================================================
// Profile Store Trait (Infrastructure - remote role profile lookup)
// =============================================================================

#[async_trait]
pub trait BaseProfileStore: Send + Sync {
    /// Single-record lookup keyed by identity id. `Ok(None)` means no
    /// profile record exists; the caller decides whether that is fatal.
    async fn profile_by_id(&self, id: Uuid) -> Result<Option<Profile>>;
}

// =============================================================================
// Notifier Trait (Infrastructure - user-visible notification sink)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    async fn success(&self, message: &str);
    async fn error(&self, message: &str);
}

// =============================================================================
// Navigator Trait (Infrastructure - router redirect sink)
// =============================================================================

#[async_trait]
pub trait BaseNavigator: Send + Sync {
    /// Side-effecting navigation to an app path
    async fn redirect(&self, path: &str);
}
