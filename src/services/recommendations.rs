use std::time::Duration;

use reqwest::Client as HttpClient;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::db::{JobHandleStore, RecommendationStore};
use crate::error::TaskResult;
use crate::models::Recommendation;

/// Terminal outcome of one polling invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No job handle on record; expected steady state before any submission
    NothingToPoll,
    /// Cancellation was requested while waiting for results
    Cancelled,
    /// Results arrived and the stored set was replaced
    Updated { count: usize },
}

/// Polls the training service for results of the persisted job
///
/// Each failed completion check is a transient "not ready yet"; the loop is
/// unbounded except for the cancellation token, which is observed between
/// iterations so a cancel takes effect within one retry interval.
pub struct RecommendationPoller {
    http_client: HttpClient,
    base_url: String,
    poll_interval: Duration,
}

impl RecommendationPoller {
    pub fn new(base_url: String, poll_interval: Duration) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            poll_interval,
        }
    }

    pub fn recommendations_url(&self, job: Uuid) -> String {
        format!("{}/api/smartinbox/recommendations?id={}", self.base_url, job)
    }

    /// Runs the poll loop to a terminal outcome.
    pub async fn poll(
        &self,
        handles: &JobHandleStore,
        store: &RecommendationStore,
        cancel: &CancellationToken,
    ) -> TaskResult<PollOutcome> {
        let Some(job) = handles.load().await? else {
            tracing::warn!("No training job handle on record; run model training first");
            return Ok(PollOutcome::NothingToPoll);
        };

        store.create_if_absent().await?;

        tracing::info!(job_id = %job, "Getting recommendations");

        loop {
            if cancel.is_cancelled() {
                tracing::info!(job_id = %job, "Polling cancelled");
                return Ok(PollOutcome::Cancelled);
            }

            match self.try_fetch(job).await {
                Ok(recommendations) => {
                    let count = store.replace_all(&recommendations).await?;
                    if count == 0 {
                        tracing::info!(
                            job_id = %job,
                            "No recommendations available for this training job"
                        );
                    } else {
                        tracing::info!(job_id = %job, count, "Saved recommendations");
                    }
                    return Ok(PollOutcome::Updated { count });
                }
                Err(reason) => {
                    tracing::debug!(
                        job_id = %job,
                        reason = %reason,
                        "Recommendations are not available yet"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(job_id = %job, "Polling cancelled");
                    return Ok(PollOutcome::Cancelled);
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// One completion check. Any failure, transport or status or parse, is
    /// reported as a transient reason string and retried by the caller.
    async fn try_fetch(&self, job: Uuid) -> Result<Vec<Recommendation>, String> {
        let response = self
            .http_client
            .get(self.recommendations_url(job))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }

        response
            .json::<Vec<Recommendation>>()
            .await
            .map_err(|e| format!("unparsable response: {}", e))
    }
}
