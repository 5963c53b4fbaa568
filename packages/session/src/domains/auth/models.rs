use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed set of roles an account can be registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Ngo,
    Beneficiary,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Donor, Role::Ngo, Role::Beneficiary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Ngo => "ngo",
            Role::Beneficiary => "beneficiary",
        }
    }

    /// Parse a stored role name; unknown values resolve to no role
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "donor" => Some(Role::Donor),
            "ngo" => Some(Role::Ngo),
            "beneficiary" => Some(Role::Beneficiary),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity as reported by the provider.
/// Lives only for the process session; never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Role-bearing profile record, keyed 1:1 with an identity by id.
///
/// `id` is a foreign reference to `Identity::id`, not an ownership link:
/// the profile may lag the identity while a fetch is in flight, but must
/// never be attributed to a different identity than the one in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub role: Option<Role>,
}

/// Canonical session state owned by the authority.
/// All other components are read-only observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    /// True from startup until the first resolution (event or probe) lands
    pub loading: bool,
}

impl SessionState {
    pub fn initial() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: true,
        }
    }

    /// A session is authorized for a role only when an identity is
    /// present and the profile stores that exact role
    pub fn authorized_for(&self, role: Role) -> bool {
        self.identity.is_some() && self.profile.as_ref().is_some_and(|p| p.role == Some(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            assert_eq!(role.to_string(), role.as_str());
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Beneficiary).unwrap(), "beneficiary");
    }

    #[test]
    fn test_authorized_requires_identity_and_matching_role() {
        let id = Uuid::from_u128(1);
        let mut state = SessionState::initial();
        state.loading = false;
        state.profile = Some(Profile {
            id,
            name: None,
            email: None,
            wallet_address: None,
            role: Some(Role::Donor),
        });

        // Profile alone is not enough
        assert!(!state.authorized_for(Role::Donor));

        state.identity = Some(Identity {
            id,
            email: Some("a@x.com".to_string()),
        });
        assert!(state.authorized_for(Role::Donor));
        assert!(!state.authorized_for(Role::Ngo));
    }
}
