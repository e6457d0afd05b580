//! # Userpool Tools
//!
//! Command-line tools for managing users of Amazon Cognito user pools.
//!
//! ## Overview
//!
//! - **apply-users** reconciles a declarative list of users into a pool:
//!   missing users are created, attributes are upserted, and passwords are
//!   set or generated from the pool's password policy. Every record is
//!   applied concurrently; the run ends with a summary of applied, skipped
//!   and failed records.
//! - **login-as** authenticates as a pool user through an app client and
//!   prints the issued tokens, optionally caching them until shortly before
//!   they expire.
//!
//! ## Architecture
//!
//! - [`records`] - Input decoding (JSON lines, column-mapped CSV) and username filtering
//! - [`userpool`] - The pool session, per-user reconciliation, password generation,
//!   pool and app client resolution
//! - [`cognito_api`] - Cognito Identity Provider client on the AWS SDK
//! - [`reconcile`] - Concurrent bulk reconciliation engine
//! - [`login`] and [`token_cache`] - The login flow and its local token cache
//! - [`commands`] - Command entry points used by the `userpool` binary
//! - [`utils`] - Shared helpers (compressed input, progress, formatting, time)
//!
//! ## Example Usage
//!
//! ```bash
//! # Create or update every user in users.jsonl
//! userpool apply-users my-pool users.jsonl
//!
//! # CSV input with generated permanent passwords, continuing past failures
//! userpool apply-users my-pool users.csv -c 'username,email,name' -r -P --fail-soft
//!
//! # Log in through the pool's only app client, reusing cached tokens
//! userpool login-as my-pool alice --use-cache
//! ```

pub mod cognito_api;
pub mod commands;
pub mod error;
pub mod login;
pub mod reconcile;
pub mod records;
pub mod token_cache;
pub mod userpool;
pub mod utils;

pub use error::{Result, UserPoolError};
