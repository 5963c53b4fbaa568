//! Session authority - the canonical owner of `{identity, profile, loading}`.
//!
//! Two producers feed one consumer: the provider's session-change stream
//! and a one-shot startup probe (some providers only emit stream events on
//! *change*, never for an existing session). Both paths apply the same
//! deterministic merge - the last identity transition wins, and a profile
//! fetch only lands if the identity it was scheduled for is still the
//! identity in state - so they are idempotent and convergent no matter
//! which resolves first.
//!
//! State is published through a `tokio::sync::watch` channel. Observers
//! subscribe and re-evaluate on every change; only the authority mutates.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domains::auth::errors::AuthError;
use crate::domains::auth::events::SessionChange;
use crate::domains::auth::models::{Identity, Profile, Role, SessionState};
use crate::kernel::deps::SessionDeps;

pub struct SessionAuthority {
    deps: SessionDeps,
    state: watch::Sender<SessionState>,
    /// Bumped on every identity transition. A profile fetch carries the
    /// epoch it was scheduled under and is discarded on resolution if the
    /// epoch has moved - the stale-response guard.
    epoch: AtomicU64,
}

impl SessionAuthority {
    /// Create the authority and start its reconciliation tasks: the
    /// lifetime-of-process session listener and the one-shot startup probe.
    pub fn spawn(deps: SessionDeps) -> Arc<Self> {
        let authority = Arc::new(Self {
            deps,
            state: watch::channel(SessionState::initial()).0,
            epoch: AtomicU64::new(0),
        });

        // Subscribe before any task runs so no event can slip past startup
        let events = authority.deps.identity_provider.subscribe();
        let listener = Arc::clone(&authority);
        tokio::spawn(async move { listener.listen(events).await });

        let prober = Arc::clone(&authority);
        tokio::spawn(async move { prober.probe().await });

        authority
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state changes. Receivers are read-only; all mutation goes
    /// through the authority itself.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Authenticate and enforce that the stored profile role matches the
    /// role the user is logging in as. Any failure after authentication
    /// tears the provider session down - a half-authenticated state where
    /// the identity is set but the role is wrong must not survive.
    pub async fn login(&self, email: &str, password: &str, required: Role) -> Result<(), AuthError> {
        info!("logging in {} as {}", email, required);
        self.set_loading(true);

        let result = self.try_login(email, password, required).await;
        match &result {
            Ok(()) => {
                self.deps
                    .notifier
                    .success(&format!("Logged in successfully as {}", required))
                    .await;
            }
            Err(err) => {
                error!("login failed for {}: {}", email, err);
                self.deps.notifier.error(&err.to_string()).await;
            }
        }

        self.set_loading(false);
        result
    }

    async fn try_login(
        &self,
        email: &str,
        password: &str,
        required: Role,
    ) -> Result<(), AuthError> {
        let identity = self
            .deps
            .identity_provider
            .sign_in_with_password(email, password)
            .await
            .map_err(|err| AuthError::Provider(format!("{:#}", err)))?;

        let profile = match self.deps.profile_store.profile_by_id(identity.id).await {
            Ok(profile) => profile,
            Err(err) => {
                self.teardown().await;
                return Err(AuthError::Provider(format!("{:#}", err)));
            }
        };

        let Some(profile) = profile else {
            self.teardown().await;
            return Err(AuthError::NoProfile);
        };

        if profile.role != Some(required) {
            self.teardown().await;
            return Err(AuthError::RoleMismatch {
                required,
                actual: profile.role,
            });
        }

        let epoch = self.apply_identity(Some(identity.clone()));
        self.apply_profile(epoch, identity.id, Some(profile));
        Ok(())
    }

    /// Register a new account tagged with the requested role as provider
    /// metadata. Does not populate session state - the provider requires
    /// verification before a session exists.
    pub async fn signup(&self, email: &str, password: &str, role: Role) -> Result<(), AuthError> {
        info!("signing up {} as {}", email, role);
        self.set_loading(true);

        let result = self
            .deps
            .identity_provider
            .sign_up(email, password, json!({ "role": role }))
            .await;

        self.set_loading(false);
        match result {
            Ok(_) => {
                self.deps
                    .notifier
                    .success("Account created successfully! Please check your email for verification.")
                    .await;
                Ok(())
            }
            Err(err) => {
                error!("signup failed for {}: {:#}", email, err);
                let err = AuthError::Signup(format!("{:#}", err));
                self.deps.notifier.error(&err.to_string()).await;
                Err(err)
            }
        }
    }

    /// Sign out. Local state always clears, even when the remote call
    /// fails - the client must never stay stuck "logged in" after a
    /// user-initiated logout. Provider errors are reported, not returned.
    pub async fn logout(&self) {
        self.set_loading(true);

        match self.deps.identity_provider.sign_out().await {
            Ok(()) => self.deps.notifier.success("Logged out successfully").await,
            Err(err) => {
                error!("logout failed: {:#}", err);
                self.deps.notifier.error(&format!("{:#}", err)).await;
            }
        }

        self.apply_identity(None);
    }

    /// Compensating sign-out for a login that cannot complete: the
    /// provider-side session exists but must not be kept. Local state is
    /// cleared even if the remote call fails.
    async fn teardown(&self) {
        if let Err(err) = self.deps.identity_provider.sign_out().await {
            warn!("compensating sign-out failed: {:#}", err);
        }
        self.apply_identity(None);
    }

    // =========================================================================
    // Passive reconciliation
    // =========================================================================

    /// Apply session-change events as they arrive. The identity lands
    /// synchronously; the profile lookup runs as its own task so the
    /// provider is never re-entered from inside its own notification
    /// turn, and a slow store cannot stall event processing.
    async fn listen(self: Arc<Self>, mut events: broadcast::Receiver<SessionChange>) {
        loop {
            match events.recv().await {
                Ok(change) => {
                    debug!(
                        "session change: {:?} (user {:?})",
                        change.kind,
                        change.identity.as_ref().map(|i| i.id)
                    );

                    let epoch = self.apply_identity(change.identity.clone());
                    if let Some(identity) = change.identity {
                        let this = Arc::clone(&self);
                        tokio::spawn(async move { this.resolve_profile(epoch, identity.id).await });
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Safe to skip: each event carries full identity state,
                    // so the next one re-converges
                    warn!("session listener lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("session event stream closed");
                    break;
                }
            }
        }
    }

    /// Startup probe for an existing session. Races benignly with the
    /// stream's initial event: both apply the same merge.
    async fn probe(self: Arc<Self>) {
        match self.deps.identity_provider.current_session().await {
            Ok(identity) => {
                debug!(
                    "existing session check: {:?}",
                    identity.as_ref().map(|i| i.id)
                );
                let epoch = self.apply_identity(identity.clone());
                if let Some(identity) = identity {
                    self.resolve_profile(epoch, identity.id).await;
                }
            }
            Err(err) => {
                error!("session probe failed: {:#}", err);
                // A failed probe must still release the loading gate
                self.state.send_if_modified(|state| {
                    let changed = state.loading;
                    state.loading = false;
                    changed
                });
            }
        }
    }

    async fn resolve_profile(&self, epoch: u64, id: Uuid) {
        let profile = match self.deps.profile_store.profile_by_id(id).await {
            Ok(profile) => profile,
            Err(err) => {
                // Fetch failures resolve to "no profile"; the next
                // session-change event retries
                error!("error fetching profile for {}: {:#}", id, err);
                None
            }
        };
        self.apply_profile(epoch, id, profile);
    }

    // =========================================================================
    // State transitions
    // =========================================================================

    /// Set the identity, dropping any profile that does not belong to it.
    /// Returns the new epoch for stale-fetch guarding. Every resolution
    /// path releases `loading`.
    fn apply_identity(&self, identity: Option<Identity>) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            let keep_profile = match (&identity, &state.profile) {
                (Some(identity), Some(profile)) => profile.id == identity.id,
                (_, None) => true,
                (None, Some(_)) => false,
            };
            if !keep_profile {
                state.profile = None;
            }
            state.identity = identity;
            state.loading = false;
        });
        epoch
    }

    /// Land a resolved profile unless a newer identity transition
    /// superseded the fetch while it was in flight.
    fn apply_profile(&self, epoch: u64, id: Uuid, profile: Option<Profile>) {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                debug!("discarding stale profile fetch for {}", id);
                return false;
            }
            if state.identity.as_ref().map(|i| i.id) != Some(id) {
                debug!("discarding profile for {}: identity moved on", id);
                return false;
            }
            state.profile = profile;
            true
        });
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|state| {
            if state.loading == loading {
                false
            } else {
                state.loading = loading;
                true
            }
        });
    }
}
