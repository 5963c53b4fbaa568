use crate::domains::auth::models::Identity;

/// Session lifecycle transitions reported by the identity provider.
///
/// Events are facts about provider-side state; errors go in `Result::Err`
/// on the operation that failed, not in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChangeKind {
    /// An existing session was restored at startup
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// One session-change notification. `identity` is the full identity state
/// after the transition, so a consumer that misses intermediate events
/// still converges on the next one.
#[derive(Debug, Clone)]
pub struct SessionChange {
    pub kind: SessionChangeKind,
    pub identity: Option<Identity>,
}
