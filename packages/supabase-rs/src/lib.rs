// Thin REST client for a Supabase-compatible backend: GoTrue password auth
// plus a PostgREST lookup against the `profiles` table. No session state
// lives here - callers own tokens and decide when to refresh or drop them.

pub mod models;

use reqwest::{header, Client, Response};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AuthUser, ErrorBody, ProfileRow, SignupOutcome, TokenResponse};

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone)]
pub struct SupabaseOptions {
    /// Project base URL, e.g. https://abc.supabase.co
    pub url: String,
    /// Anon (publishable) API key, sent as the `apikey` header
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    options: SupabaseOptions,
}

impl SupabaseClient {
    pub fn new(options: SupabaseOptions) -> Self {
        Self {
            http: Client::new(),
            options,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.options.url.trim_end_matches('/'), path)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1{}", self.options.url.trim_end_matches('/'), path)
    }

    fn headers(&self, access_token: Option<&str>) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Ok(value) = self.options.anon_key.parse() {
            headers.insert("apikey", value);
        }
        // Fall back to the anon key as bearer when no user token is available
        let bearer = access_token.unwrap_or(&self.options.anon_key);
        if let Ok(value) = format!("Bearer {}", bearer).parse() {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    /// Decode an error response into `SupabaseError::Api`
    async fn check(response: Response) -> Result<Response, SupabaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        Err(SupabaseError::Api {
            status: status.as_u16(),
            message: body
                .message()
                .unwrap_or("unexpected provider error")
                .to_string(),
        })
    }

    /// Register a new user. `metadata` lands in `user_metadata` on the
    /// created account (the caller puts the requested role there).
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: Value,
    ) -> Result<SignupOutcome, SupabaseError> {
        let response = self
            .http
            .post(self.auth_url("/signup"))
            .headers(self.headers(None))
            .json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await?;

        Ok(Self::check(response).await?.json::<SignupOutcome>().await?)
    }

    /// Password grant - exchanges credentials for a token pair
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TokenResponse, SupabaseError> {
        let response = self
            .http
            .post(self.auth_url("/token?grant_type=password"))
            .headers(self.headers(None))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        Ok(Self::check(response).await?.json::<TokenResponse>().await?)
    }

    /// Revoke the session behind `access_token`
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let response = self
            .http
            .post(self.auth_url("/logout"))
            .headers(self.headers(Some(access_token)))
            .send()
            .await?;

        Self::check(response).await.map(|_| ())
    }

    /// Fetch the user behind `access_token`; a 401 means the token is no
    /// longer valid and the stored session should be dropped
    pub async fn user(&self, access_token: &str) -> Result<AuthUser, SupabaseError> {
        let response = self
            .http
            .get(self.auth_url("/user"))
            .headers(self.headers(Some(access_token)))
            .send()
            .await?;

        Ok(Self::check(response).await?.json::<AuthUser>().await?)
    }

    /// Single-record lookup in the `profiles` table, keyed by user id.
    /// Returns `None` when no row exists (not an error - the caller
    /// decides whether a missing profile is fatal).
    pub async fn profile_by_id(
        &self,
        id: Uuid,
        access_token: Option<&str>,
    ) -> Result<Option<ProfileRow>, SupabaseError> {
        let response = self
            .http
            .get(self.rest_url(&format!("/profiles?id=eq.{}&select=*", id)))
            .headers(self.headers(access_token))
            .send()
            .await?;

        let mut rows = Self::check(response).await?.json::<Vec<ProfileRow>>().await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_strips_trailing_slash() {
        let client = SupabaseClient::new(SupabaseOptions {
            url: "https://abc.supabase.co/".to_string(),
            anon_key: "anon".to_string(),
        });

        assert_eq!(
            client.auth_url("/token?grant_type=password"),
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            client.rest_url("/profiles?id=eq.1&select=*"),
            "https://abc.supabase.co/rest/v1/profiles?id=eq.1&select=*"
        );
    }

    #[test]
    fn test_headers_fall_back_to_anon_bearer() {
        let client = SupabaseClient::new(SupabaseOptions {
            url: "https://abc.supabase.co".to_string(),
            anon_key: "anon-key".to_string(),
        });

        let headers = client.headers(None);
        assert_eq!(headers.get("apikey").unwrap(), "anon-key");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer anon-key");

        let headers = client.headers(Some("user-jwt"));
        assert_eq!(headers.get("authorization").unwrap(), "Bearer user-jwt");
    }
}
