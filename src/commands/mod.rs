//! Command implementations.
//!
//! - [`apply_users`] - Reconcile a file of user records into a user pool
//! - [`login_as`] - Authenticate as a pool user and print the session tokens
//!
//! Both commands talk to Cognito through a client built from
//! [`ConnectionOptions`], print their result as JSON on stdout, and log
//! progress to stderr.

pub mod apply_users;
pub mod login_as;

use crate::cognito_api::CognitoClient;
use anyhow::{Context, Result};
use std::time::Duration;

/// Connection flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptions {
    /// Cognito endpoint (default: `$AWS_ENDPOINT_URL_COGNITO_IDENTITY_PROVIDER`,
    /// `$AWS_ENDPOINT_URL`, or the regional endpoint)
    pub endpoint: Option<String>,
    /// AWS region (default: `$AWS_REGION`, `$AWS_DEFAULT_REGION`, or the active profile)
    pub region: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl ConnectionOptions {
    pub async fn client(&self) -> Result<CognitoClient> {
        CognitoClient::from_options(
            self.endpoint.as_deref(),
            self.region.as_deref(),
            self.timeout_secs.map(Duration::from_secs),
        )
        .await
        .context("Failed to create Cognito client")
    }
}
