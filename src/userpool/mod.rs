//! User pool session and the operations performed against it.
//!
//! [`UserPoolApi`] is the transport seam: one method per directory round
//! trip. [`crate::cognito_api::CognitoClient`] implements it over the AWS SDK;
//! tests substitute in-memory doubles.
//!
//! [`UserPool`] is the session shared by every reconciliation task. It owns
//! the resolved pool id (fixed at construction) and a handle to the
//! transport, and exposes the idempotent user-state operations plus
//! [`UserPool::apply_user`], the per-record reconciliation sequence.

pub mod auth;
pub mod options;
pub mod password;
pub mod resolve;

use crate::error::{Result, UserPoolError};
use crate::records::UserRecord;
use async_trait::async_trait;
use auth::{secret_hash, AuthRequest, AuthResponse};
use options::{ApplyOption, ApplyOptions};
use password::{generate_password, PasswordPolicy};
use resolve::{resolve_pool_id, AppClientSummary, PoolSummary};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// App client details from `DescribeUserPoolClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppClient {
    pub client_id: String,
    pub client_name: String,
    pub client_secret: Option<String>,
}

/// Directory round trips used by this crate.
#[async_trait]
pub trait UserPoolApi: Send + Sync {
    async fn list_user_pools(&self, next_token: Option<String>) -> Result<Page<PoolSummary>>;

    /// Succeeds when the user exists; a missing user surfaces as
    /// `UserNotFoundException`.
    async fn admin_get_user(&self, pool_id: &str, username: &str) -> Result<()>;

    async fn admin_create_user(
        &self,
        pool_id: &str,
        username: &str,
        client_metadata: &HashMap<String, String>,
    ) -> Result<()>;

    async fn admin_update_user_attributes(
        &self,
        pool_id: &str,
        username: &str,
        attributes: &[(String, String)],
        client_metadata: &HashMap<String, String>,
    ) -> Result<()>;

    async fn admin_set_user_password(
        &self,
        pool_id: &str,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<()>;

    async fn admin_reset_user_password(
        &self,
        pool_id: &str,
        username: &str,
        client_metadata: &HashMap<String, String>,
    ) -> Result<()>;

    async fn describe_password_policy(&self, pool_id: &str) -> Result<PasswordPolicy>;

    async fn list_user_pool_clients(
        &self,
        pool_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<AppClientSummary>>;

    async fn describe_user_pool_client(&self, pool_id: &str, client_id: &str) -> Result<AppClient>;

    async fn initiate_auth(&self, request: &AuthRequest) -> Result<AuthResponse>;
}

/// Follow `next_token` until the listing is exhausted.
async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut next_token = None;
    loop {
        let page = fetch(next_token).await?;
        items.extend(page.items);
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => return Ok(items),
        }
    }
}

/// An authenticated session bound to one resolved user pool.
#[derive(Debug)]
pub struct UserPool<A> {
    id: String,
    api: Arc<A>,
}

impl<A: UserPoolApi> UserPool<A> {
    /// Resolve `id_or_name` to a pool id by listing every pool.
    pub async fn connect(api: Arc<A>, id_or_name: &str) -> Result<Self> {
        let pools = collect_pages(|token| api.list_user_pools(token)).await?;
        let id = resolve_pool_id(&pools, id_or_name)?;
        debug!(pool_id = %id, pools = pools.len(), "resolved user pool");
        Ok(Self { id, api })
    }

    /// Session for an already known pool id.
    pub fn with_id(api: Arc<A>, id: impl Into<String>) -> Self {
        Self { id: id.into(), api }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether `username` exists. A directory "not found" maps to `false`.
    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        match self.api.admin_get_user(&self.id, username).await {
            Ok(()) => Ok(true),
            Err(UserPoolError::Api(e)) if e.is_user_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create a bare user. The caller must have checked that it does not exist.
    pub async fn create_user(&self, record: &UserRecord) -> Result<()> {
        self.api
            .admin_create_user(&self.id, &record.username, &record.client_metadata)
            .await
    }

    /// Upsert every attribute of `record`. Nothing to send is a no-op.
    pub async fn set_attributes(&self, record: &UserRecord) -> Result<()> {
        let attributes = record.attribute_strings();
        if attributes.is_empty() {
            return Ok(());
        }
        self.api
            .admin_update_user_attributes(
                &self.id,
                &record.username,
                &attributes,
                &record.client_metadata,
            )
            .await
    }

    /// Set a permanent or temporary password. An empty password is a no-op.
    pub async fn set_password(&self, username: &str, password: &str, permanent: bool) -> Result<()> {
        if password.is_empty() {
            return Ok(());
        }
        self.api
            .admin_set_user_password(&self.id, username, password, permanent)
            .await
    }

    /// Ask the directory to notify the user with a reset code.
    pub async fn trigger_password_reset(
        &self,
        username: &str,
        client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.api
            .admin_reset_user_password(&self.id, username, client_metadata)
            .await
    }

    pub async fn fetch_password_policy(&self) -> Result<PasswordPolicy> {
        self.api.describe_password_policy(&self.id).await
    }

    /// Pick an app client of this pool and fetch its details.
    pub async fn resolve_app_client(&self, id_or_name: Option<&str>) -> Result<AppClient> {
        let clients =
            collect_pages(|token| self.api.list_user_pool_clients(&self.id, token)).await?;
        let summary = resolve::resolve_app_client(&clients, id_or_name)?;
        debug!(client_id = %summary.client_id, "resolved app client");
        self.api
            .describe_user_pool_client(&self.id, &summary.client_id)
            .await
    }

    /// Perform one username/password authentication exchange.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
        client_secret: Option<&str>,
        client_metadata: HashMap<String, String>,
    ) -> Result<AuthResponse> {
        let request = AuthRequest {
            client_id: client_id.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            secret_hash: client_secret
                .filter(|s| !s.is_empty())
                .map(|secret| secret_hash(client_id, secret, username)),
            client_metadata,
        };
        self.api.initiate_auth(&request).await
    }

    /// Reconcile one record: create if missing, upsert attributes, then
    /// apply password and reset options.
    ///
    /// A failed step stops the sequence. Earlier steps are not rolled back.
    pub async fn apply_user(&self, record: UserRecord, modifiers: &[ApplyOption]) -> Result<()> {
        if record.username.is_empty() {
            return Err(UserPoolError::Validation("username is required".to_string()));
        }
        let options = ApplyOptions::resolve(modifiers)?;
        let username = record.username.as_str();
        let fail = |step, e| UserPoolError::step(username, step, e);

        let exists = self
            .user_exists(username)
            .await
            .map_err(|e| fail("look up user", e))?;
        if !exists {
            self.create_user(&record)
                .await
                .map_err(|e| fail("create user", e))?;
        }

        self.set_attributes(&record)
            .await
            .map_err(|e| fail("update attributes", e))?;

        let password = if !options.password.is_empty() {
            Some(options.password.clone())
        } else if options.random_password {
            let policy = self
                .fetch_password_policy()
                .await
                .map_err(|e| fail("fetch password policy", e))?;
            Some(generate_password(&policy).map_err(|e| fail("generate password", e))?)
        } else {
            record.password.clone()
        };

        if let Some(password) = password {
            self.set_password(username, &password, options.permanent_password)
                .await
                .map_err(|e| fail("set password", e))?;
        }

        if options.send_password_reset_code {
            self.trigger_password_reset(username, &record.client_metadata)
                .await
                .map_err(|e| fail("send password reset code", e))?;
        }

        Ok(())
    }
}
