// Manual end-to-end check for the session subsystem.
//
// Usage:
//   session_cli probe
//   session_cli login <email> <password> <donor|ngo|beneficiary>
//
// Wires the real Supabase adapter, runs the startup probe (and optionally
// a login), then prints the resolved state and the guard decision.

use anyhow::{Context, Result};
use session_core::{evaluate, Config, Role, SessionAuthority, SessionDeps};
use std::time::Duration;
use supabase::{SupabaseClient, SupabaseOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,session_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let client = SupabaseClient::new(SupabaseOptions {
        url: config.supabase_url.clone(),
        anon_key: config.supabase_anon_key.clone(),
    });

    let authority = SessionAuthority::spawn(SessionDeps::supabase(client));

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("probe") | None => {
            let mut states = authority.subscribe();
            let settled = tokio::time::timeout(
                Duration::from_secs(10),
                states.wait_for(|state| !state.loading),
            )
            .await;
            match settled {
                Ok(Ok(state)) => print_state(&state),
                _ => anyhow::bail!("session probe did not resolve within 10s"),
            }
        }
        Some("login") => {
            let usage = "usage: session_cli login <email> <password> <donor|ngo|beneficiary>";
            let email = args.next().context(usage)?;
            let password = args.next().context(usage)?;
            let role = args
                .next()
                .as_deref()
                .and_then(Role::parse)
                .context(usage)?;

            authority.login(&email, &password, role).await?;
            let state = authority.state();
            print_state(&state);
            println!("guard({}) -> {:?}", role, evaluate(&state, role));
        }
        Some(other) => anyhow::bail!("unknown command: {}", other),
    }

    Ok(())
}

fn print_state(state: &session_core::SessionState) {
    match (&state.identity, &state.profile) {
        (Some(identity), Some(profile)) => println!(
            "signed in: {} ({}) role={}",
            identity.id,
            identity.email.as_deref().unwrap_or("-"),
            profile
                .role
                .map(|r| r.to_string())
                .unwrap_or_else(|| "unresolved".to_string()),
        ),
        (Some(identity), None) => println!("signed in: {} (profile pending)", identity.id),
        _ => println!("signed out"),
    }
}
