//! Shared fixtures for integration tests: an in-memory user pool API that
//! records every call it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use userpool_tools::error::{ApiError, Result, UserPoolError};
use userpool_tools::userpool::auth::{AuthRequest, AuthResponse, AuthenticationResult};
use userpool_tools::userpool::password::PasswordPolicy;
use userpool_tools::userpool::resolve::{AppClientSummary, PoolSummary};
use userpool_tools::userpool::{AppClient, Page, UserPool, UserPoolApi};

pub const POOL_ID: &str = "ap-northeast-1_test";
pub const POOL_NAME: &str = "test-pool";

/// A directory call observed by [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListUserPools(Option<String>),
    GetUser(String),
    CreateUser(String),
    UpdateAttributes(String, Vec<(String, String)>),
    SetPassword {
        username: String,
        password: String,
        permanent: bool,
    },
    ResetPassword(String),
    DescribePasswordPolicy,
    ListClients(Option<String>),
    DescribeClient(String),
    InitiateAuth(AuthRequest),
}

impl Call {
    /// Username the call acts on, if any.
    pub fn username(&self) -> Option<&str> {
        match self {
            Call::GetUser(u)
            | Call::CreateUser(u)
            | Call::UpdateAttributes(u, _)
            | Call::ResetPassword(u) => Some(u),
            Call::SetPassword { username, .. } => Some(username),
            Call::InitiateAuth(request) => Some(&request.username),
            _ => None,
        }
    }
}

/// In-memory stand-in for the Cognito API.
#[derive(Debug)]
pub struct MockApi {
    /// Pool listing, one inner vector per page
    pub pool_pages: Vec<Vec<PoolSummary>>,
    /// App clients, listed one per page
    pub clients: Vec<AppClient>,
    pub existing: HashSet<String>,
    /// Users whose lookup fails with a directory error
    pub failing: HashSet<String>,
    /// Users whose password update fails after the earlier steps succeeded
    pub failing_password: HashSet<String>,
    /// Per-user latency applied to the lookup call
    pub delays: HashMap<String, Duration>,
    pub policy: PasswordPolicy,
    pub auth_response: AuthResponse,
    calls: Mutex<Vec<Call>>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self {
            pool_pages: vec![vec![pool(POOL_ID, POOL_NAME)]],
            clients: vec![app_client("client-1", "web", None)],
            existing: HashSet::new(),
            failing: HashSet::new(),
            failing_password: HashSet::new(),
            delays: HashMap::new(),
            policy: PasswordPolicy::default(),
            auth_response: tokens("access-token", 3600),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(mut self, usernames: &[&str]) -> Self {
        self.existing.extend(usernames.iter().map(|u| u.to_string()));
        self
    }

    pub fn with_failing(mut self, usernames: &[&str]) -> Self {
        self.failing.extend(usernames.iter().map(|u| u.to_string()));
        self
    }

    pub fn with_failing_password(mut self, usernames: &[&str]) -> Self {
        self.failing_password
            .extend(usernames.iter().map(|u| u.to_string()));
        self
    }

    pub fn with_delay(mut self, username: &str, delay: Duration) -> Self {
        self.delays.insert(username.to_string(), delay);
        self
    }

    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clients(mut self, clients: Vec<AppClient>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_pool_pages(mut self, pages: Vec<Vec<PoolSummary>>) -> Self {
        self.pool_pages = pages;
        self
    }

    pub fn with_auth_response(mut self, response: AuthResponse) -> Self {
        self.auth_response = response;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, username: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.username() == Some(username))
            .collect()
    }

    /// Usernames that reached the directory, in call order, without repeats.
    pub fn touched_users(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for call in self.calls() {
            if let Some(username) = call.username() {
                if !seen.iter().any(|s| s == username) {
                    seen.push(username.to_string());
                }
            }
        }
        seen
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn next_page_token(index: usize, pages: usize) -> Option<String> {
    (index + 1 < pages).then(|| (index + 1).to_string())
}

fn page_index(token: &Option<String>) -> usize {
    token.as_deref().and_then(|t| t.parse().ok()).unwrap_or(0)
}

#[async_trait]
impl UserPoolApi for MockApi {
    async fn list_user_pools(&self, next_token: Option<String>) -> Result<Page<PoolSummary>> {
        self.record(Call::ListUserPools(next_token.clone()));
        let index = page_index(&next_token);
        Ok(Page {
            items: self.pool_pages.get(index).cloned().unwrap_or_default(),
            next_token: next_page_token(index, self.pool_pages.len()),
        })
    }

    async fn admin_get_user(&self, _pool_id: &str, username: &str) -> Result<()> {
        self.record(Call::GetUser(username.to_string()));
        if let Some(delay) = self.delays.get(username) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(username) {
            return Err(ApiError::new(500, "InternalErrorException", format!("lookup of {} failed", username)).into());
        }
        if self.existing.contains(username) {
            Ok(())
        } else {
            Err(ApiError::new(400, "UserNotFoundException", "User does not exist.").into())
        }
    }

    async fn admin_create_user(
        &self,
        _pool_id: &str,
        username: &str,
        _client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.record(Call::CreateUser(username.to_string()));
        Ok(())
    }

    async fn admin_update_user_attributes(
        &self,
        _pool_id: &str,
        username: &str,
        attributes: &[(String, String)],
        _client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.record(Call::UpdateAttributes(username.to_string(), attributes.to_vec()));
        Ok(())
    }

    async fn admin_set_user_password(
        &self,
        _pool_id: &str,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<()> {
        self.record(Call::SetPassword {
            username: username.to_string(),
            password: password.to_string(),
            permanent,
        });
        if self.failing_password.contains(username) {
            return Err(ApiError::new(
                400,
                "InvalidPasswordException",
                "Password does not conform to policy",
            )
            .into());
        }
        Ok(())
    }

    async fn admin_reset_user_password(
        &self,
        _pool_id: &str,
        username: &str,
        _client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.record(Call::ResetPassword(username.to_string()));
        Ok(())
    }

    async fn describe_password_policy(&self, _pool_id: &str) -> Result<PasswordPolicy> {
        self.record(Call::DescribePasswordPolicy);
        Ok(self.policy)
    }

    async fn list_user_pool_clients(
        &self,
        _pool_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<AppClientSummary>> {
        self.record(Call::ListClients(next_token.clone()));
        let index = page_index(&next_token);
        let items = self
            .clients
            .get(index)
            .map(|c| AppClientSummary {
                client_id: c.client_id.clone(),
                client_name: c.client_name.clone(),
            })
            .into_iter()
            .collect();
        Ok(Page {
            items,
            next_token: next_page_token(index, self.clients.len()),
        })
    }

    async fn describe_user_pool_client(&self, _pool_id: &str, client_id: &str) -> Result<AppClient> {
        self.record(Call::DescribeClient(client_id.to_string()));
        self.clients
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned()
            .ok_or_else(|| {
                UserPoolError::Api(ApiError::new(
                    400,
                    "ResourceNotFoundException",
                    "User pool client does not exist.",
                ))
            })
    }

    async fn initiate_auth(&self, request: &AuthRequest) -> Result<AuthResponse> {
        self.record(Call::InitiateAuth(request.clone()));
        Ok(self.auth_response.clone())
    }
}

pub fn pool(id: &str, name: &str) -> PoolSummary {
    PoolSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn app_client(id: &str, name: &str, secret: Option<&str>) -> AppClient {
    AppClient {
        client_id: id.to_string(),
        client_name: name.to_string(),
        client_secret: secret.map(str::to_string),
    }
}

pub fn tokens(access_token: &str, expires_in: i64) -> AuthResponse {
    AuthResponse {
        authentication_result: Some(AuthenticationResult {
            access_token: Some(access_token.to_string()),
            expires_in,
            id_token: Some("id-token".to_string()),
            refresh_token: Some("refresh-token".to_string()),
            token_type: Some("Bearer".to_string()),
        }),
        ..AuthResponse::default()
    }
}

/// A session on the default pool backed by `api`.
pub fn session(api: MockApi) -> (Arc<MockApi>, Arc<UserPool<MockApi>>) {
    let api = Arc::new(api);
    let pool = Arc::new(UserPool::with_id(Arc::clone(&api), POOL_ID));
    (api, pool)
}
