//! Bulk create-or-update of users from a JSON-lines or CSV file.
//!
//! ```bash
//! # JSON lines, one user per line
//! userpool apply-users my-pool users.jsonl
//!
//! # Headerless CSV with an explicit column list; the second field is dropped
//! userpool apply-users my-pool users.csv --columns 'username,,email' --random-password
//!
//! # Count what would be applied without touching the pool
//! userpool apply-users my-pool users.jsonl.gz --filter '@example\.com$' --dry-run
//! ```

use super::ConnectionOptions;
use crate::reconcile::{FailurePolicy, ReconcileSettings, Reconciler};
use crate::records::decoder::RecordDecoder;
use crate::records::filter::UsernameFilter;
use crate::userpool::options::{ApplyOption, ApplyOptions};
use crate::userpool::UserPool;
use crate::utils::reader::open_lines;
use anyhow::{Context, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ApplyUsersOptions {
    pub password: Option<String>,
    pub random_password: bool,
    pub permanent_password: bool,
    pub send_password_reset_code: bool,
    pub filter: Option<String>,
    pub columns: Option<String>,
    pub dry_run: bool,
    pub verbose: bool,
    pub fail_soft: bool,
}

impl ApplyUsersOptions {
    fn modifiers(&self) -> Vec<ApplyOption> {
        ApplyOption::from_flags(
            self.password.as_deref(),
            self.random_password,
            self.permanent_password,
            self.send_password_reset_code,
        )
    }

    fn settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            dry_run: self.dry_run,
            policy: if self.fail_soft {
                FailurePolicy::FailSoft
            } else {
                FailurePolicy::FailFast
            },
            show_progress: !self.verbose,
        }
    }
}

/// Run the apply-users command
pub async fn run(
    connection: &ConnectionOptions,
    pool: &str,
    file: &str,
    options: &ApplyUsersOptions,
) -> Result<()> {
    let modifiers = options.modifiers();
    ApplyOptions::resolve(&modifiers).context("Invalid password options")?;
    let filter = UsernameFilter::compile(options.filter.as_deref())?;
    let decoder = RecordDecoder::from_columns(options.columns.as_deref());
    let reader = open_lines(file)?;

    let client = connection.client().await?;
    let pool = UserPool::connect(Arc::new(client), pool)
        .await
        .with_context(|| format!("Failed to resolve user pool '{}'", pool))?;

    let reconciler = Reconciler::new(
        Arc::new(pool),
        modifiers,
        decoder,
        filter,
        options.settings(),
    )?;
    let report = reconciler.run(reader).await;

    println!("{}", serde_json::to_string(&report.summary)?);

    report
        .into_result()
        .map(|_| ())
        .with_context(|| format!("Failed to apply users from {}", file))
}
