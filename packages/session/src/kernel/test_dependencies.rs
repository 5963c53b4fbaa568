// TestDependencies - mock implementations for testing
//
// Provides mock capabilities that can be injected into SessionDeps for
// tests. Mocks record their calls so tests can assert on side effects
// (sign-out invoked, redirect fired once, ...).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};
use uuid::Uuid;

use crate::domains::auth::events::{SessionChange, SessionChangeKind};
use crate::domains::auth::models::{Identity, Profile};
use crate::kernel::deps::SessionDeps;
use crate::kernel::traits::{
    BaseIdentityProvider, BaseNavigator, BaseNotifier, BaseProfileStore,
};

// =============================================================================
// Mock Identity Provider
// =============================================================================

pub struct MockIdentityProvider {
    events: broadcast::Sender<SessionChange>,
    current: Mutex<Option<Identity>>,
    accounts: Mutex<HashMap<String, Identity>>,
    sign_up_error: Mutex<Option<String>>,
    sign_out_error: Mutex<Option<String>>,
    probe_error: Mutex<Option<String>>,
    sign_up_calls: Mutex<Vec<(String, Value)>>,
    sign_out_calls: Mutex<u32>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self {
            events: broadcast::channel(16).0,
            current: Mutex::new(None),
            accounts: Mutex::new(HashMap::new()),
            sign_up_error: Mutex::new(None),
            sign_out_error: Mutex::new(None),
            probe_error: Mutex::new(None),
            sign_up_calls: Mutex::new(Vec::new()),
            sign_out_calls: Mutex::new(0),
        }
    }

    /// Pretend a session already exists when the startup probe runs
    pub fn set_current_session(&self, identity: Identity) {
        *self.current.lock().unwrap() = Some(identity);
    }

    /// Accept this email/identity pair for password sign-in
    pub fn register_account(&self, email: &str, identity: Identity) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), identity);
    }

    pub fn fail_sign_up(&self, message: &str) {
        *self.sign_up_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_sign_out(&self, message: &str) {
        *self.sign_out_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_probe(&self, message: &str) {
        *self.probe_error.lock().unwrap() = Some(message.to_string());
    }

    /// Push a session-change event, as the real provider does for sign-in,
    /// sign-out in another tab, token refresh, ...
    pub fn emit(&self, kind: SessionChangeKind, identity: Option<Identity>) {
        *self.current.lock().unwrap() = identity.clone();
        let _ = self.events.send(SessionChange { kind, identity });
    }

    pub fn sign_out_count(&self) -> u32 {
        *self.sign_out_calls.lock().unwrap()
    }

    /// All (email, metadata) pairs passed to sign_up
    pub fn sign_up_calls(&self) -> Vec<(String, Value)> {
        self.sign_up_calls.lock().unwrap().clone()
    }
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityProvider for MockIdentityProvider {
    async fn sign_up(&self, email: &str, _password: &str, metadata: Value) -> Result<Identity> {
        self.sign_up_calls
            .lock()
            .unwrap()
            .push((email.to_string(), metadata));

        if let Some(message) = self.sign_up_error.lock().unwrap().clone() {
            return Err(anyhow!(message));
        }

        // Verification pending: an identity exists but no session starts
        Ok(Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        })
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> Result<Identity> {
        let identity = self.accounts.lock().unwrap().get(email).cloned();
        match identity {
            Some(identity) => {
                self.emit(SessionChangeKind::SignedIn, Some(identity.clone()));
                Ok(identity)
            }
            None => Err(anyhow!("Invalid login credentials")),
        }
    }

    async fn sign_out(&self) -> Result<()> {
        *self.sign_out_calls.lock().unwrap() += 1;
        self.emit(SessionChangeKind::SignedOut, None);

        match self.sign_out_error.lock().unwrap().clone() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }

    async fn current_session(&self) -> Result<Option<Identity>> {
        if let Some(message) = self.probe_error.lock().unwrap().clone() {
            return Err(anyhow!(message));
        }
        Ok(self.current.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.events.subscribe()
    }
}

// =============================================================================
// Mock Profile Store
// =============================================================================

pub struct MockProfileStore {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    error: Mutex<Option<String>>,
    gates: Mutex<HashMap<Uuid, Arc<Notify>>>,
    calls: Mutex<Vec<Uuid>>,
}

impl MockProfileStore {
    pub fn new() -> Self {
        Self {
            profiles: Mutex::new(HashMap::new()),
            error: Mutex::new(None),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn add_profile(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    pub fn fail(&self, message: &str) {
        *self.error.lock().unwrap() = Some(message.to_string());
    }

    /// Block lookups for `id` until the returned handle is notified.
    /// Lets tests hold a fetch in flight while newer events land.
    pub fn gate_profile(&self, id: Uuid) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(id, gate.clone());
        gate
    }

    /// All ids that were looked up, in call order
    pub fn calls(&self) -> Vec<Uuid> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseProfileStore for MockProfileStore {
    async fn profile_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        self.calls.lock().unwrap().push(id);

        let gate = self.gates.lock().unwrap().get(&id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(message) = self.error.lock().unwrap().clone() {
            return Err(anyhow!(message));
        }
        Ok(self.profiles.lock().unwrap().get(&id).cloned())
    }
}

// =============================================================================
// Mock Notifier
// =============================================================================

pub struct MockNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            successes: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    async fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

// =============================================================================
// Mock Navigator
// =============================================================================

pub struct MockNavigator {
    redirects: Mutex<Vec<String>>,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self {
            redirects: Mutex::new(Vec::new()),
        }
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl Default for MockNavigator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseNavigator for MockNavigator {
    async fn redirect(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of mocks wired into a `SessionDeps`, with the concrete types
/// kept accessible for configuration and assertions
pub struct TestDependencies {
    pub identity_provider: Arc<MockIdentityProvider>,
    pub profile_store: Arc<MockProfileStore>,
    pub notifier: Arc<MockNotifier>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            identity_provider: Arc::new(MockIdentityProvider::new()),
            profile_store: Arc::new(MockProfileStore::new()),
            notifier: Arc::new(MockNotifier::new()),
        }
    }

    pub fn deps(&self) -> SessionDeps {
        SessionDeps::new(
            self.identity_provider.clone(),
            self.profile_store.clone(),
            self.notifier.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
