#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Autra Provisioning Tool
//!
//! Creates or resets a student principal:
//!
//! ```text
//! echo "$PASSWORD" | autra-provision AB123
//! ```
//!
//! The password is read from the first line of stdin so it never appears in
//! the process list. The code is stored uppercase.

use std::io::BufRead;

use anyhow::{bail, Context};
use autra_api::auth::{hash_password, normalize_identity_code};
use autra_api::store::{PgStore, Principal};
use autra_api::Config;
use autra_shared::{close_pool, create_pool, run_migrations};
use tracing::info;

/// Parse the single positional argument
fn parse_identity_code(args: &[String]) -> anyhow::Result<String> {
    let [code] = args else {
        bail!("usage: autra-provision <STUDENT_CODE>  (password on stdin)");
    };
    let code = normalize_identity_code(code);
    if code.is_empty() {
        bail!("student code must not be empty");
    }
    Ok(code)
}

/// Take the first line of input, without its line terminator
fn read_password(input: impl BufRead) -> anyhow::Result<String> {
    let line = input
        .lines()
        .next()
        .transpose()
        .context("failed to read password from stdin")?
        .unwrap_or_default();
    let password = line.trim_end_matches('\r').to_string();
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let identity_code = parse_identity_code(&args)?;

    let password = tokio::task::spawn_blocking(|| read_password(std::io::stdin().lock())).await??;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let config = Config::from_env()?;
    let pool = create_pool(&config.database_url, 1).await?;
    run_migrations(&pool).await?;

    let store = PgStore::new(pool.clone());
    let created = store
        .upsert_principal(&Principal {
            identity_code: identity_code.clone(),
            password_hash,
        })
        .await?;

    if created {
        info!(identity_code = %identity_code, "Principal created");
    } else {
        info!(identity_code = %identity_code, "Principal password reset");
    }

    close_pool(pool).await;
    Ok(())
}
