use chrono::{DateTime, Local};
use getset::Getters;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{
    api::{FetchError, RankingSource},
    boss_catalog::BossCatalog,
    extractor::{extract, ExtractError},
    schema::{AccountType, CaptureBatch, UserSnapshot, Username},
};

/// What to do when a single user cannot be captured.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Give up on the whole batch.
    #[default]
    Abort,
    /// Leave the user out, and keep going with the others.
    Isolate,
}

#[derive(Clone, Copy, Debug, TypedBuilder)]
pub struct BatchOptions {
    #[builder(default)]
    pub account_type: AccountType,
    #[builder(default)]
    pub failure_policy: FailurePolicy,
    #[builder(default)]
    pub strict_layout: bool,
    #[builder(default)]
    pub catalog: BossCatalog,
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[derive(Debug, Error)]
#[error("Failed to capture {username}")]
pub struct BatchError {
    pub username: Username,
    #[source]
    pub source: UserError,
}

#[derive(Debug, Getters)]
#[getset(get = "pub")]
pub struct BatchReport {
    batch: CaptureBatch,
    captured_at: DateTime<Local>,
    /// Users left out of `batch`; always empty under [`FailurePolicy::Abort`].
    failures: Vec<(Username, UserError)>,
}

impl BatchReport {
    pub fn into_parts(self) -> (CaptureBatch, DateTime<Local>, Vec<(Username, UserError)>) {
        (self.batch, self.captured_at, self.failures)
    }

    pub fn log_summary(&self) {
        let captured = self.batch.users().len();
        let total = captured + self.failures.len();
        if self.failures.is_empty() {
            info!("Captured all {total} users.");
            return;
        }
        error!("Captured {captured} of {total} users.");
        for (username, e) in &self.failures {
            error!("  {username}: {e}");
        }
    }
}

/// Captures every user in `usernames`, one after another, in the given order.
///
/// The capture instant is taken once before the first request and shared by all users.
pub async fn assemble<S: RankingSource>(
    source: &S,
    usernames: &[Username],
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    let captured_at = Local::now();
    let mut users = vec![];
    let mut failures = vec![];
    for username in usernames {
        match capture_user(source, username, options).await {
            Ok(snapshot) => users.push(snapshot),
            Err(e) => match options.failure_policy {
                FailurePolicy::Abort => {
                    return Err(BatchError {
                        username: username.clone(),
                        source: e,
                    })
                }
                FailurePolicy::Isolate => {
                    warn!("Skipping {username}: {e}");
                    failures.push((username.clone(), e));
                }
            },
        }
    }

    let batch = CaptureBatch::builder()
        .timestamp(captured_at.timestamp_micros() as f64 / 1e6)
        .users(users)
        .build();
    Ok(BatchReport {
        batch,
        captured_at,
        failures,
    })
}

async fn capture_user<S: RankingSource>(
    source: &S,
    username: &Username,
    options: &BatchOptions,
) -> Result<UserSnapshot, UserError> {
    let hiscore = source.fetch(username, options.account_type).await?;
    let snapshot = extract(
        username.clone(),
        &hiscore.skills,
        &hiscore.feed,
        &options.catalog,
        options.strict_layout,
    )?;
    Ok(snapshot)
}
