//! Client for the Cognito Identity Provider API.
//!
//! A thin wrapper over `aws-sdk-cognitoidentityprovider`. Configuration is
//! loaded through the standard AWS chain (environment, shared config and
//! credential files, `AWS_PROFILE`, SSO, container and instance roles), with
//! `--region` and `--endpoint` taking precedence when given.
//!
//! Service errors are flattened into [`ApiError`] with the code and message
//! the directory returned, so callers never see SDK types.

use crate::error::{ApiError, Result, UserPoolError};
use crate::userpool::auth::{AuthRequest, AuthResponse, AuthenticationResult};
use crate::userpool::password::PasswordPolicy;
use crate::userpool::resolve::{AppClientSummary, PoolSummary};
use crate::userpool::{AppClient, Page, UserPoolApi};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cognitoidentityprovider as cognito;
use cognito::config::http::HttpResponse;
use cognito::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use cognito::operation::admin_get_user::AdminGetUserError;
use cognito::types::{AttributeType, AuthFlowType};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Maximum page size accepted by the listing operations.
pub const MAX_RESULTS: i32 = 60;
/// Default per-operation deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_NOT_FOUND: &str = "UserNotFoundException";

/// Cognito API client bound to one region.
#[derive(Debug, Clone)]
pub struct CognitoClient {
    client: cognito::Client,
    region: String,
}

impl CognitoClient {
    /// Create a client from optional CLI values on top of the AWS default chain.
    ///
    /// - region: `--region`, then `AWS_REGION`, `AWS_DEFAULT_REGION`, the
    ///   active profile, and instance metadata
    /// - endpoint: `--endpoint`, then `AWS_ENDPOINT_URL_COGNITO_IDENTITY_PROVIDER`,
    ///   `AWS_ENDPOINT_URL`, then the public regional endpoint
    pub async fn from_options(
        endpoint: Option<&str>,
        region: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeouts = TimeoutConfig::builder()
            .operation_timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let region = sdk_config.region().map(|r| r.to_string()).ok_or_else(|| {
            UserPoolError::Config(
                "AWS region is not set. Provide it via:\n\
                 - Command-line: --region ap-northeast-1\n\
                 - Environment variable: export AWS_REGION=ap-northeast-1\n\
                 - Shared config: region = ap-northeast-1 in ~/.aws/config"
                    .to_string(),
            )
        })?;

        debug!(region = %region, endpoint = ?endpoint, "Cognito client initialized");

        Ok(Self {
            client: cognito::Client::new(&sdk_config),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Directory error with the SDK's code and message, or a generic code when
/// the response carried none.
pub fn service_error(status: u16, code: Option<&str>, message: Option<&str>) -> ApiError {
    ApiError::new(
        status,
        code.unwrap_or("UnknownError"),
        message.unwrap_or_default(),
    )
}

fn sdk_error<E>(err: SdkError<E, HttpResponse>) -> UserPoolError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map_or(0, |r| r.status().as_u16());
    match err.as_service_error() {
        Some(service) => service_error(status, service.code(), service.message()).into(),
        None => UserPoolError::Sdk(DisplayErrorContext(&err).to_string()),
    }
}

fn user_lookup_error(err: SdkError<AdminGetUserError, HttpResponse>) -> UserPoolError {
    let not_found = err
        .as_service_error()
        .is_some_and(AdminGetUserError::is_user_not_found_exception);
    match sdk_error(err) {
        UserPoolError::Api(mut api) if not_found => {
            api.code = USER_NOT_FOUND.to_string();
            api.into()
        }
        other => other,
    }
}

fn metadata(client_metadata: &HashMap<String, String>) -> Option<HashMap<String, String>> {
    (!client_metadata.is_empty()).then(|| client_metadata.clone())
}

#[async_trait]
impl UserPoolApi for CognitoClient {
    async fn list_user_pools(&self, next_token: Option<String>) -> Result<Page<PoolSummary>> {
        let output = self
            .client
            .list_user_pools()
            .max_results(MAX_RESULTS)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(sdk_error)?;

        let items = output
            .user_pools()
            .iter()
            .map(|pool| PoolSummary {
                id: pool.id().unwrap_or_default().to_string(),
                name: pool.name().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn admin_get_user(&self, pool_id: &str, username: &str) -> Result<()> {
        self.client
            .admin_get_user()
            .user_pool_id(pool_id)
            .username(username)
            .send()
            .await
            .map_err(user_lookup_error)?;
        Ok(())
    }

    async fn admin_create_user(
        &self,
        pool_id: &str,
        username: &str,
        client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.client
            .admin_create_user()
            .user_pool_id(pool_id)
            .username(username)
            .set_client_metadata(metadata(client_metadata))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn admin_update_user_attributes(
        &self,
        pool_id: &str,
        username: &str,
        attributes: &[(String, String)],
        client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        let user_attributes = attributes
            .iter()
            .map(|(name, value)| {
                AttributeType::builder()
                    .name(name)
                    .value(value)
                    .build()
                    .map_err(|e| UserPoolError::Sdk(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .admin_update_user_attributes()
            .user_pool_id(pool_id)
            .username(username)
            .set_user_attributes(Some(user_attributes))
            .set_client_metadata(metadata(client_metadata))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn admin_set_user_password(
        &self,
        pool_id: &str,
        username: &str,
        password: &str,
        permanent: bool,
    ) -> Result<()> {
        self.client
            .admin_set_user_password()
            .user_pool_id(pool_id)
            .username(username)
            .password(password)
            .permanent(permanent)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn admin_reset_user_password(
        &self,
        pool_id: &str,
        username: &str,
        client_metadata: &HashMap<String, String>,
    ) -> Result<()> {
        self.client
            .admin_reset_user_password()
            .user_pool_id(pool_id)
            .username(username)
            .set_client_metadata(metadata(client_metadata))
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn describe_password_policy(&self, pool_id: &str) -> Result<PasswordPolicy> {
        let output = self
            .client
            .describe_user_pool()
            .user_pool_id(pool_id)
            .send()
            .await
            .map_err(sdk_error)?;

        let policy = output
            .user_pool()
            .and_then(|pool| pool.policies())
            .and_then(|policies| policies.password_policy());
        let Some(policy) = policy else {
            return Ok(PasswordPolicy::default());
        };

        let default = PasswordPolicy::default();
        Ok(PasswordPolicy {
            minimum_length: policy
                .minimum_length()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(default.minimum_length),
            require_lowercase: policy.require_lowercase(),
            require_uppercase: policy.require_uppercase(),
            require_numbers: policy.require_numbers(),
            require_symbols: policy.require_symbols(),
        })
    }

    async fn list_user_pool_clients(
        &self,
        pool_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<AppClientSummary>> {
        let output = self
            .client
            .list_user_pool_clients()
            .user_pool_id(pool_id)
            .max_results(MAX_RESULTS)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(sdk_error)?;

        let items = output
            .user_pool_clients()
            .iter()
            .map(|client| AppClientSummary {
                client_id: client.client_id().unwrap_or_default().to_string(),
                client_name: client.client_name().unwrap_or_default().to_string(),
            })
            .collect();
        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_user_pool_client(&self, pool_id: &str, client_id: &str) -> Result<AppClient> {
        let output = self
            .client
            .describe_user_pool_client()
            .user_pool_id(pool_id)
            .client_id(client_id)
            .send()
            .await
            .map_err(sdk_error)?;

        let client = output
            .user_pool_client()
            .ok_or_else(|| UserPoolError::NotFound {
                kind: "app client",
                name: client_id.to_string(),
            })?;
        Ok(AppClient {
            client_id: client.client_id().unwrap_or(client_id).to_string(),
            client_name: client.client_name().unwrap_or_default().to_string(),
            client_secret: client.client_secret().map(str::to_string),
        })
    }

    async fn initiate_auth(&self, request: &AuthRequest) -> Result<AuthResponse> {
        let mut call = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&request.client_id)
            .auth_parameters("USERNAME", &request.username)
            .auth_parameters("PASSWORD", &request.password)
            .set_client_metadata(metadata(&request.client_metadata));
        if let Some(hash) = &request.secret_hash {
            call = call.auth_parameters("SECRET_HASH", hash);
        }

        let output = call.send().await.map_err(sdk_error)?;

        Ok(AuthResponse {
            authentication_result: output.authentication_result().map(|result| {
                AuthenticationResult {
                    access_token: result.access_token().map(str::to_string),
                    expires_in: i64::from(result.expires_in()),
                    id_token: result.id_token().map(str::to_string),
                    refresh_token: result.refresh_token().map(str::to_string),
                    token_type: result.token_type().map(str::to_string),
                }
            }),
            challenge_name: output.challenge_name().map(|c| c.as_str().to_string()),
            challenge_parameters: output.challenge_parameters().cloned().unwrap_or_default(),
            session: output.session().map(str::to_string),
        })
    }
}
