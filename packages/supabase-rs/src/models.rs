use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Authenticated user as returned by the GoTrue endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Arbitrary metadata attached at signup (`data` field), e.g. the requested role
    #[serde(default)]
    pub user_metadata: Value,
}

/// Successful password grant response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub user: AuthUser,
}

/// Signup result - a full session when auto-confirm is on, or just the
/// created user when email verification is still pending
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SignupOutcome {
    Session(TokenResponse),
    User(AuthUser),
}

impl SignupOutcome {
    pub fn user(&self) -> &AuthUser {
        match self {
            SignupOutcome::Session(token) => &token.user,
            SignupOutcome::User(user) => user,
        }
    }
}

/// Single row from the `profiles` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Stored role name ("donor" | "ngo" | "beneficiary"); absent until assigned
    #[serde(default)]
    pub role: Option<String>,
}

/// Error body shape varies across GoTrue/PostgREST versions, so every
/// known message field is optional and `message()` picks the first present
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let body = r#"{
            "access_token": "jwt-abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-xyz",
            "user": {"id": "a7c43f1e-8b7e-4c2e-b2cf-16a9c93e2c01", "email": "a@x.com"}
        }"#;

        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.access_token, "jwt-abc");
        assert_eq!(token.user.email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn test_signup_outcome_pending_verification() {
        // No session yet: GoTrue returns just the created user
        let body = r#"{"id": "a7c43f1e-8b7e-4c2e-b2cf-16a9c93e2c01", "email": "a@x.com", "user_metadata": {"role": "donor"}}"#;

        let outcome: SignupOutcome = serde_json::from_str(body).unwrap();
        assert!(matches!(outcome, SignupOutcome::User(_)));
        assert_eq!(outcome.user().user_metadata["role"], "donor");
    }

    #[test]
    fn test_profile_row_with_missing_optionals() {
        let body = r#"{"id": "a7c43f1e-8b7e-4c2e-b2cf-16a9c93e2c01", "role": "ngo"}"#;

        let row: ProfileRow = serde_json::from_str(body).unwrap();
        assert_eq!(row.role.as_deref(), Some("ngo"));
        assert!(row.name.is_none());
        assert!(row.wallet_address.is_none());
    }

    #[test]
    fn test_error_body_field_priority() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "invalid_grant", "error_description": "Invalid login credentials"}"#)
                .unwrap();
        assert_eq!(body.message(), Some("Invalid login credentials"));

        let body: ErrorBody = serde_json::from_str(r#"{"msg": "User already registered"}"#).unwrap();
        assert_eq!(body.message(), Some("User already registered"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.message().is_none());
    }
}
