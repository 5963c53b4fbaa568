//! Session dependencies (using traits for testability)
//!
//! This module provides the dependency container handed to the session
//! authority, plus the production adapter that wires both provider-facing
//! capabilities to one Supabase client.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use supabase::models::{AuthUser, ProfileRow, SignupOutcome, TokenResponse};
use supabase::{SupabaseClient, SupabaseError};

use crate::domains::auth::events::{SessionChange, SessionChangeKind};
use crate::domains::auth::models::{Identity, Profile, Role};
use crate::kernel::traits::{BaseIdentityProvider, BaseNotifier, BaseProfileStore};

// =============================================================================
// SessionDeps
// =============================================================================

/// Dependencies accessible to the session authority (traits for testability)
#[derive(Clone)]
pub struct SessionDeps {
    pub identity_provider: Arc<dyn BaseIdentityProvider>,
    pub profile_store: Arc<dyn BaseProfileStore>,
    pub notifier: Arc<dyn BaseNotifier>,
}

impl SessionDeps {
    pub fn new(
        identity_provider: Arc<dyn BaseIdentityProvider>,
        profile_store: Arc<dyn BaseProfileStore>,
        notifier: Arc<dyn BaseNotifier>,
    ) -> Self {
        Self {
            identity_provider,
            profile_store,
            notifier,
        }
    }

    /// Production wiring: one Supabase adapter backs both the identity
    /// provider and the profile store, notifications go to the log.
    pub fn supabase(client: SupabaseClient) -> Self {
        let adapter = Arc::new(SupabaseAdapter::new(client));
        Self {
            identity_provider: adapter.clone(),
            profile_store: adapter,
            notifier: Arc::new(TracingNotifier),
        }
    }
}

// =============================================================================
// TracingNotifier
// =============================================================================

/// Notifier that reports through structured logs. Stands in for the
/// client's toast layer when no UI is attached.
pub struct TracingNotifier;

#[async_trait]
impl BaseNotifier for TracingNotifier {
    async fn success(&self, message: &str) {
        info!("{}", message);
    }

    async fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

// =============================================================================
// SupabaseAdapter (implements BaseIdentityProvider + BaseProfileStore)
// =============================================================================

/// Access token held for the lifetime of a provider-side session.
/// No refresh loop: an expired token is simply dropped and the user is
/// treated as signed out.
#[derive(Debug, Clone)]
struct StoredSession {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Wrapper around `SupabaseClient` that owns token storage and emits
/// session-change events as its own operations complete
pub struct SupabaseAdapter {
    client: SupabaseClient,
    session: RwLock<Option<StoredSession>>,
    events: broadcast::Sender<SessionChange>,
}

impl SupabaseAdapter {
    pub fn new(client: SupabaseClient) -> Self {
        Self {
            client,
            session: RwLock::new(None),
            events: broadcast::channel(16).0,
        }
    }

    fn identity_of(user: &AuthUser) -> Identity {
        Identity {
            id: user.id,
            email: user.email.clone(),
        }
    }

    fn profile_of(row: ProfileRow) -> Profile {
        Profile {
            id: row.id,
            name: row.name,
            email: row.email,
            wallet_address: row.wallet_address,
            role: row.role.as_deref().and_then(Role::parse),
        }
    }

    async fn store(&self, token: &TokenResponse) {
        *self.session.write().await = Some(StoredSession {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });
    }

    fn emit(&self, kind: SessionChangeKind, identity: Option<Identity>) {
        // No subscribers is fine - the authority may not be listening yet
        let _ = self.events.send(SessionChange { kind, identity });
    }
}

#[async_trait]
impl BaseIdentityProvider for SupabaseAdapter {
    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<Identity> {
        let outcome = self.client.sign_up(email, password, metadata).await?;
        let identity = Self::identity_of(outcome.user());

        // Auto-confirm deployments hand back a session immediately
        if let SignupOutcome::Session(token) = &outcome {
            self.store(token).await;
            self.emit(SessionChangeKind::SignedIn, Some(identity.clone()));
        }

        Ok(identity)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let token = self.client.sign_in_with_password(email, password).await?;
        let identity = Self::identity_of(&token.user);
        self.store(&token).await;
        self.emit(SessionChangeKind::SignedIn, Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        let stored = self.session.write().await.take();
        let result = match &stored {
            Some(session) => self.client.sign_out(&session.access_token).await,
            None => Ok(()),
        };
        // The local session is gone either way
        self.emit(SessionChangeKind::SignedOut, None);
        Ok(result?)
    }

    async fn current_session(&self) -> Result<Option<Identity>> {
        let stored = { self.session.read().await.clone() };
        let Some(stored) = stored else {
            return Ok(None);
        };

        if stored.expires_at <= Utc::now() {
            debug!("stored session expired, dropping it");
            *self.session.write().await = None;
            return Ok(None);
        }

        match self.client.user(&stored.access_token).await {
            Ok(user) => Ok(Some(Self::identity_of(&user))),
            Err(SupabaseError::Api { status: 401, .. }) => {
                // Revoked elsewhere; the token is no longer good
                debug!("stored session rejected by provider, dropping it");
                *self.session.write().await = None;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

#[async_trait]
impl BaseProfileStore for SupabaseAdapter {
    async fn profile_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        let token = {
            self.session
                .read()
                .await
                .as_ref()
                .map(|s| s.access_token.clone())
        };
        let row = self.client.profile_by_id(id, token.as_deref()).await?;
        Ok(row.map(Self::profile_of))
    }
}
