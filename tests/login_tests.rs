// Integration tests for pool resolution and the login-as flow

mod common;

use chrono::{Duration, Utc};
use common::{app_client, pool, session, tokens, Call, MockApi, POOL_ID};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use userpool_tools::error::UserPoolError;
use userpool_tools::login::{login_as, LoginRequest};
use userpool_tools::token_cache::TokenCache;
use userpool_tools::userpool::auth::{secret_hash, AuthResponse};
use userpool_tools::userpool::UserPool;

fn request(username: &str, password: Option<&str>) -> LoginRequest {
    LoginRequest {
        username: username.to_string(),
        password: password.map(str::to_string),
        ..LoginRequest::default()
    }
}

fn initiate_auth_calls(api: &MockApi) -> Vec<Call> {
    api.calls()
        .into_iter()
        .filter(|c| matches!(c, Call::InitiateAuth(_)))
        .collect()
}

#[tokio::test]
async fn test_connect_resolves_pools_across_pages() {
    let pages = vec![
        vec![pool("1", "a"), pool("2", "a")],
        vec![pool("3", "b")],
    ];
    let api = Arc::new(MockApi::new().with_pool_pages(pages));

    let by_id = UserPool::connect(Arc::clone(&api), "2").await.unwrap();
    assert_eq!(by_id.id(), "2");

    let by_name = UserPool::connect(Arc::clone(&api), "b").await.unwrap();
    assert_eq!(by_name.id(), "3");

    let err = UserPool::connect(Arc::clone(&api), "a").await.unwrap_err();
    assert!(matches!(err, UserPoolError::AmbiguousName { .. }));

    let err = UserPool::connect(Arc::clone(&api), "c").await.unwrap_err();
    assert!(matches!(err, UserPoolError::NotFound { .. }));

    assert!(api.calls().contains(&Call::ListUserPools(Some("1".into()))));
}

#[tokio::test]
async fn test_login_with_client_secret_sends_secret_hash() {
    let api = MockApi::new().with_clients(vec![app_client("client-1", "web", Some("s3cr3t"))]);
    let (api, pool) = session(api);
    let mut req = request("alice", Some("Passw0rd!"));
    req.client_metadata = HashMap::from([("tenant".to_string(), "acme".to_string())]);

    let response = login_as(&pool, None, req).await.unwrap();

    assert_eq!(response, tokens("access-token", 3600));
    let Call::InitiateAuth(sent) = initiate_auth_calls(&api).remove(0) else {
        unreachable!()
    };
    assert_eq!(sent.client_id, "client-1");
    assert_eq!(sent.password, "Passw0rd!");
    assert_eq!(
        sent.secret_hash.as_deref(),
        Some(secret_hash("client-1", "s3cr3t", "alice").as_str())
    );
    assert_eq!(sent.client_metadata["tenant"], "acme");
}

#[tokio::test]
async fn test_login_without_client_secret_omits_hash() {
    let (api, pool) = session(MockApi::new());

    login_as(&pool, None, request("alice", Some("Passw0rd!")))
        .await
        .unwrap();

    let Call::InitiateAuth(sent) = initiate_auth_calls(&api).remove(0) else {
        unreachable!()
    };
    assert!(sent.secret_hash.is_none());
}

#[tokio::test]
async fn test_several_clients_require_a_choice() {
    let clients = vec![
        app_client("client-1", "web", None),
        app_client("client-2", "mobile", None),
    ];
    let (api, pool) = session(MockApi::new().with_clients(clients));

    let err = login_as(&pool, None, request("alice", Some("pw")))
        .await
        .unwrap_err();
    assert!(matches!(err, UserPoolError::AmbiguousName { .. }));
    assert!(initiate_auth_calls(&api).is_empty());

    let mut req = request("alice", Some("pw"));
    req.client = Some("mobile".into());
    login_as(&pool, None, req).await.unwrap();
    assert!(api.calls().contains(&Call::DescribeClient("client-2".into())));
}

#[tokio::test]
async fn test_single_client_rejects_mismatched_name() {
    let (_api, pool) = session(MockApi::new());
    let mut req = request("alice", Some("pw"));
    req.client = Some("other".into());

    let err = login_as(&pool, None, req).await.unwrap_err();
    assert!(matches!(err, UserPoolError::NotFound { .. }));
}

#[tokio::test]
async fn test_missing_password_on_cache_miss() {
    let (api, pool) = session(MockApi::new());

    let err = login_as(&pool, None, request("alice", None)).await.unwrap_err();

    assert!(matches!(err, UserPoolError::Validation(_)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_cached_tokens_skip_the_directory() {
    let dir = TempDir::new().unwrap();
    let cache = TokenCache::new(dir.path());
    let (api, pool) = session(MockApi::new());

    let first = login_as(&pool, Some(&cache), request("alice", Some("pw")))
        .await
        .unwrap();
    assert!(cache.path_for(&TokenCache::key(POOL_ID, "alice")).exists());

    // No password needed while the cached entry is fresh
    let second = login_as(&pool, Some(&cache), request("alice", None))
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(initiate_auth_calls(&api).len(), 1);
}

#[tokio::test]
async fn test_expired_cache_entry_is_replaced() {
    let dir = TempDir::new().unwrap();
    let cache = TokenCache::new(dir.path());
    let key = TokenCache::key(POOL_ID, "alice");
    cache
        .save_at(&key, &tokens("stale", 3600), Utc::now() - Duration::hours(2))
        .unwrap();
    let (api, pool) = session(MockApi::new());

    let response = login_as(&pool, Some(&cache), request("alice", Some("pw")))
        .await
        .unwrap();

    assert_eq!(response, tokens("access-token", 3600));
    assert_eq!(initiate_auth_calls(&api).len(), 1);
    assert_eq!(cache.load(&key).unwrap(), response);
}

#[tokio::test]
async fn test_challenge_response_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let cache = TokenCache::new(dir.path());
    let challenge = AuthResponse {
        challenge_name: Some("NEW_PASSWORD_REQUIRED".into()),
        session: Some("session-token".into()),
        ..AuthResponse::default()
    };
    let (_api, pool) = session(MockApi::new().with_auth_response(challenge.clone()));

    let response = login_as(&pool, Some(&cache), request("alice", Some("pw")))
        .await
        .unwrap();

    assert_eq!(response, challenge);
    assert!(!cache.path_for(&TokenCache::key(POOL_ID, "alice")).exists());
}
