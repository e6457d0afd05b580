//! Authenticate as a pool user and print the resulting tokens.
//!
//! ```bash
//! USERPOOL_PASSWORD='S3cret!pw' userpool login-as my-pool alice --use-cache
//! ```

use super::ConnectionOptions;
use crate::login::{login_as, LoginRequest};
use crate::token_cache::TokenCache;
use crate::userpool::UserPool;
use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Environment fallback for `--password`
pub const PASSWORD_ENV: &str = "USERPOOL_PASSWORD";

#[derive(Debug, Clone, Default)]
pub struct LoginAsOptions {
    pub password: Option<String>,
    pub client: Option<String>,
    /// `KEY=VALUE` pairs
    pub client_metadata: Vec<String>,
    pub use_cache: bool,
}

/// Parse `KEY=VALUE` pairs. Values may contain `=`.
pub fn parse_client_metadata(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut metadata = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid client metadata '{}': expected KEY=VALUE", pair);
        };
        if key.is_empty() {
            bail!("Invalid client metadata '{}': key is empty", pair);
        }
        metadata.insert(key.to_string(), value.to_string());
    }
    Ok(metadata)
}

/// Run the login-as command
pub async fn run(
    connection: &ConnectionOptions,
    pool: &str,
    username: &str,
    options: &LoginAsOptions,
) -> Result<()> {
    let client_metadata = parse_client_metadata(&options.client_metadata)?;
    let password = options
        .password
        .clone()
        .or_else(|| std::env::var(PASSWORD_ENV).ok());
    let cache = options.use_cache.then(TokenCache::from_env);

    let client = connection.client().await?;
    let pool = UserPool::connect(Arc::new(client), pool)
        .await
        .with_context(|| format!("Failed to resolve user pool '{}'", pool))?;

    let response = login_as(
        &pool,
        cache.as_ref(),
        LoginRequest {
            username: username.to_string(),
            password,
            client: options.client.clone(),
            client_metadata,
        },
    )
    .await
    .with_context(|| format!("Failed to log in as {}", username))?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
