//! Login as a pool user and obtain session tokens.

use crate::error::{Result, UserPoolError};
use crate::token_cache::{CacheError, TokenCache};
use crate::userpool::auth::AuthResponse;
use crate::userpool::{UserPool, UserPoolApi};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    pub username: String,
    /// Only required when no fresh cache entry exists
    pub password: Option<String>,
    /// App client id or name; may be omitted when the pool has a single client
    pub client: Option<String>,
    pub client_metadata: HashMap<String, String>,
}

/// Authenticate `request.username` against `pool`, consulting `cache` first
/// when one is given.
pub async fn login_as<A: UserPoolApi>(
    pool: &UserPool<A>,
    cache: Option<&TokenCache>,
    request: LoginRequest,
) -> Result<AuthResponse> {
    if request.username.is_empty() {
        return Err(UserPoolError::Validation("username is required".to_string()));
    }

    let key = TokenCache::key(pool.id(), &request.username);
    if let Some(cache) = cache {
        match cache.load(&key) {
            Ok(response) => {
                debug!(key = %key, "token cache hit");
                return Ok(response);
            }
            Err(CacheError::Missing) => debug!(key = %key, "token cache miss"),
            Err(CacheError::Expired) => debug!(key = %key, "token cache entry expired"),
            Err(e) => warn!(key = %key, error = %e, "ignoring unreadable token cache entry"),
        }
    }

    let password = request
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| UserPoolError::Validation("password is required".to_string()))?;

    let client = pool.resolve_app_client(request.client.as_deref()).await?;
    let response = pool
        .authenticate(
            &request.username,
            &password,
            &client.client_id,
            client.client_secret.as_deref(),
            request.client_metadata,
        )
        .await?;

    if let Some(cache) = cache {
        if response.authentication_result.is_some() {
            cache.save(&key, &response)?;
        } else {
            debug!(challenge = ?response.challenge_name, "challenge response is not cached");
        }
    }

    Ok(response)
}
