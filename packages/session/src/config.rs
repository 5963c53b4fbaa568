use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Where the route guard sends denied visitors
    pub login_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .context("SUPABASE_ANON_KEY must be set")?,
            login_path: env::var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_path_defaults() {
        env::set_var("SUPABASE_URL", "https://abc.supabase.co");
        env::set_var("SUPABASE_ANON_KEY", "anon");
        env::remove_var("LOGIN_PATH");

        let config = Config::from_env().unwrap();
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.supabase_url, "https://abc.supabase.co");
    }
}
