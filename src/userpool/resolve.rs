//! Resolution of human-supplied pool and app client identifiers.
//!
//! An exact identifier match always wins. Otherwise the value is treated as a
//! name, which must match exactly one entry.

use crate::error::{Result, UserPoolError};

/// Entry of `ListUserPools`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSummary {
    pub id: String,
    pub name: String,
}

/// Entry of `ListUserPoolClients`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppClientSummary {
    pub client_id: String,
    pub client_name: String,
}

/// Resolve `id_or_name` against the full list of pools.
pub fn resolve_pool_id(pools: &[PoolSummary], id_or_name: &str) -> Result<String> {
    if let Some(pool) = pools.iter().find(|p| p.id == id_or_name) {
        return Ok(pool.id.clone());
    }

    let mut by_name = pools.iter().filter(|p| p.name == id_or_name);
    match (by_name.next(), by_name.next()) {
        (Some(pool), None) => Ok(pool.id.clone()),
        (Some(_), Some(_)) => Err(UserPoolError::AmbiguousName {
            kind: "user pool",
            name: id_or_name.to_string(),
        }),
        (None, _) => Err(UserPoolError::NotFound {
            kind: "user pool",
            name: id_or_name.to_string(),
        }),
    }
}

/// Pick the app client to authenticate against.
///
/// A pool with a single app client uses it unless the caller named a
/// different one. With several app clients the caller must name one, and
/// the name must be unambiguous.
pub fn resolve_app_client<'a>(
    clients: &'a [AppClientSummary],
    id_or_name: Option<&str>,
) -> Result<&'a AppClientSummary> {
    let wanted = id_or_name.filter(|s| !s.is_empty());
    let not_found = |name: &str| UserPoolError::NotFound {
        kind: "app client",
        name: name.to_string(),
    };

    match clients {
        [] => Err(UserPoolError::NotFound {
            kind: "app client",
            name: "no app clients in user pool".to_string(),
        }),
        [only] => match wanted {
            Some(w) if only.client_id != w && only.client_name != w => Err(not_found(w)),
            _ => Ok(only),
        },
        _ => {
            let Some(wanted) = wanted else {
                return Err(UserPoolError::AmbiguousName {
                    kind: "app client",
                    name: format!(
                        "user pool has {} app clients, specify one by id or name",
                        clients.len()
                    ),
                });
            };

            if let Some(client) = clients.iter().find(|c| c.client_id == wanted) {
                return Ok(client);
            }

            let mut by_name = clients.iter().filter(|c| c.client_name == wanted);
            match (by_name.next(), by_name.next()) {
                (Some(client), None) => Ok(client),
                (Some(_), Some(_)) => Err(UserPoolError::AmbiguousName {
                    kind: "app client",
                    name: wanted.to_string(),
                }),
                (None, _) => Err(not_found(wanted)),
            }
        }
    }
}
