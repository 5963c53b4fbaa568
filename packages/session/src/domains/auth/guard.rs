//! Route gating - admit/deny decisions derived from session state.
//!
//! The decision rule itself is pure; `RouteGuard` adds just enough state
//! (the previous decision) to make the login redirect fire exactly once
//! per transition into Deny instead of on every re-evaluation.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::domains::auth::models::{Role, SessionState};
use crate::kernel::traits::BaseNavigator;

/// What a protected route should do right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Resolution still in flight - show a waiting indicator, navigate
    /// nowhere, render nothing protected
    Pending,
    /// Identity present and the profile role matches
    Admit,
    /// No identity, or the role does not match
    Deny,
}

/// Side effect requested by the guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardCommand {
    RedirectToLogin,
}

/// Pure decision rule: Pending while loading (regardless of what identity
/// and profile currently hold), Admit only while an identity is present
/// with the matching profile role, Deny otherwise.
pub fn evaluate(state: &SessionState, required: Role) -> GuardDecision {
    if state.loading {
        return GuardDecision::Pending;
    }
    if state.authorized_for(required) {
        GuardDecision::Admit
    } else {
        GuardDecision::Deny
    }
}

/// Decision machine for one protected route.
///
/// There is no transition out of Deny except a full navigation away and
/// re-entry with a fresh guard, which is why a guard instance is cheap,
/// short-lived state rather than anything shared.
pub struct RouteGuard {
    required: Role,
    last: Option<GuardDecision>,
}

impl RouteGuard {
    pub fn new(required: Role) -> Self {
        Self {
            required,
            last: None,
        }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    /// Latest decision, if any state has been evaluated yet
    pub fn decision(&self) -> Option<GuardDecision> {
        self.last
    }

    /// Evaluate the state; the redirect command is emitted only on a
    /// transition into Deny
    pub fn decide(&mut self, state: &SessionState) -> (GuardDecision, Option<GuardCommand>) {
        let next = evaluate(state, self.required);
        let command = (next == GuardDecision::Deny && self.last != Some(GuardDecision::Deny))
            .then_some(GuardCommand::RedirectToLogin);
        self.last = Some(next);
        (next, command)
    }

    /// Drive the guard against live session state, redirecting to
    /// `login_path` once per Deny transition, until the authority goes away
    pub async fn drive(
        mut self,
        mut states: watch::Receiver<SessionState>,
        navigator: Arc<dyn BaseNavigator>,
        login_path: String,
    ) {
        loop {
            let (decision, command) = {
                let state = states.borrow_and_update();
                self.decide(&state)
            };
            debug!("route guard for {}: {:?}", self.required, decision);

            if command.is_some() {
                navigator.redirect(&login_path).await;
            }

            if states.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::models::{Identity, Profile};
    use crate::kernel::test_dependencies::MockNavigator;
    use std::time::Duration;
    use tokio::time::sleep;
    use uuid::Uuid;

    fn resolved(identity: Option<Identity>, profile: Option<Profile>) -> SessionState {
        SessionState {
            identity,
            profile,
            loading: false,
        }
    }

    fn donor(n: u128) -> (Identity, Profile) {
        let id = Uuid::from_u128(n);
        (
            Identity {
                id,
                email: Some("a@x.com".to_string()),
            },
            Profile {
                id,
                name: None,
                email: None,
                wallet_address: None,
                role: Some(Role::Donor),
            },
        )
    }

    #[test]
    fn test_pending_while_loading_regardless_of_contents() {
        let (identity, profile) = donor(1);
        let mut state = SessionState::initial();
        assert_eq!(evaluate(&state, Role::Donor), GuardDecision::Pending);

        // Even a fully authorized pair stays Pending until loading drops
        state.identity = Some(identity);
        state.profile = Some(profile);
        assert_eq!(evaluate(&state, Role::Donor), GuardDecision::Pending);
    }

    #[test]
    fn test_admit_requires_identity_and_matching_role() {
        let (identity, profile) = donor(1);

        let state = resolved(Some(identity.clone()), Some(profile.clone()));
        assert_eq!(evaluate(&state, Role::Donor), GuardDecision::Admit);
        assert_eq!(evaluate(&state, Role::Ngo), GuardDecision::Deny);

        // Profile still in flight: identity alone never admits
        let state = resolved(Some(identity), None);
        assert_eq!(evaluate(&state, Role::Donor), GuardDecision::Deny);

        let state = resolved(None, Some(profile));
        assert_eq!(evaluate(&state, Role::Donor), GuardDecision::Deny);
    }

    #[test]
    fn test_redirect_fires_once_per_deny_transition() {
        let (identity, profile) = donor(1);
        let mut guard = RouteGuard::new(Role::Donor);

        // Pending: no decision committed, no redirect
        assert_eq!(guard.decide(&SessionState::initial()), (GuardDecision::Pending, None));

        // Resolves unauthenticated: redirect exactly once
        let denied = resolved(None, None);
        assert_eq!(
            guard.decide(&denied),
            (GuardDecision::Deny, Some(GuardCommand::RedirectToLogin))
        );
        assert_eq!(guard.decide(&denied), (GuardDecision::Deny, None));
        assert_eq!(guard.decide(&denied), (GuardDecision::Deny, None));

        // A later Admit -> Deny transition redirects again
        let admitted = resolved(Some(identity), Some(profile));
        assert_eq!(guard.decide(&admitted), (GuardDecision::Admit, None));
        assert_eq!(
            guard.decide(&denied),
            (GuardDecision::Deny, Some(GuardCommand::RedirectToLogin))
        );
    }

    #[tokio::test]
    async fn test_drive_redirects_to_login_path_once() {
        let (tx, rx) = watch::channel(SessionState::initial());
        let navigator = Arc::new(MockNavigator::new());

        let guard = RouteGuard::new(Role::Donor);
        let driver = tokio::spawn(guard.drive(rx, navigator.clone(), "/login".to_string()));

        // Still loading: no navigation
        sleep(Duration::from_millis(20)).await;
        assert!(navigator.redirects().is_empty());

        // Resolves signed-out: one redirect
        tx.send(resolved(None, None)).unwrap();
        sleep(Duration::from_millis(20)).await;
        assert_eq!(navigator.redirects(), vec!["/login".to_string()]);

        // Further Deny states do not redirect again
        tx.send(resolved(None, None)).unwrap();
        sleep(Duration::from_millis(20)).await;
        assert_eq!(navigator.redirects().len(), 1);

        drop(tx);
        driver.await.unwrap();
    }
}
