use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db::{JobHandleStore, RecommendationStore, SnapshotStore};
use crate::error::{TaskError, TaskResult};
use crate::models::GenreColumns;
use crate::services::providers::CatalogSource;
use crate::services::recommendations::{PollOutcome, RecommendationPoller};
use crate::services::schema::evolve_schema;
use crate::services::sync::{run_stamp, synchronize};
use crate::services::training::TrainingClient;

/// Progress checkpoint reported right after a successful submission.
const SUBMITTED_PROGRESS: f64 = 75.0;

/// Fractional run progress in `[0, 100]`, published over a watch channel.
#[derive(Clone)]
pub struct Progress {
    sender: watch::Sender<f64>,
}

impl Progress {
    /// Creates a progress handle together with its receiver side.
    pub fn channel() -> (Self, watch::Receiver<f64>) {
        let (sender, receiver) = watch::channel(0.0);
        (Self { sender }, receiver)
    }

    /// A handle nobody listens to, for callers that do not track progress.
    pub fn sink() -> Self {
        Self::channel().0
    }

    pub fn report(&self, percent: f64) {
        self.sender.send_replace(percent.clamp(0.0, 100.0));
    }
}

/// Orchestrator states, in run order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    EvolvingSchema,
    Synchronizing,
    Submitting,
    Polling,
    Done,
    Cancelled,
    Failed,
}

impl RunState {
    fn name(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::EvolvingSchema => "evolving_schema",
            RunState::Synchronizing => "synchronizing",
            RunState::Submitting => "submitting",
            RunState::Polling => "polling",
            RunState::Done => "done",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        }
    }
}

/// Terminal result of a pipeline run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { recommendations: usize },
    Cancelled,
    NothingToPoll,
}

/// Sequences one full run: evolve schema → synchronize → submit → poll.
///
/// All collaborators are supplied at construction; there is no ambient
/// state. Runs must be serialized by the invoking scheduler — the snapshot
/// store is exclusively owned by one run at a time.
pub struct Pipeline {
    config: Config,
    catalog: Arc<dyn CatalogSource>,
    handles: JobHandleStore,
    training: TrainingClient,
    poller: RecommendationPoller,
}

impl Pipeline {
    pub fn new(config: Config, catalog: Arc<dyn CatalogSource>) -> Self {
        let handles = JobHandleStore::new(&config.smart_inbox_job_handle_path);
        let training = TrainingClient::new(config.smart_inbox_server_url.clone());
        let poller = RecommendationPoller::new(
            config.smart_inbox_server_url.clone(),
            Duration::from_secs(config.smart_inbox_poll_interval_secs),
        );

        Self {
            config,
            catalog,
            handles,
            training,
            poller,
        }
    }

    fn transition(state: &mut RunState, next: RunState) {
        tracing::info!(from = state.name(), to = next.name(), "Pipeline state");
        *state = next;
    }

    /// One full training run.
    ///
    /// Schema-evolution issues for individual columns and transient poll
    /// failures are absorbed; synchronization and submission failures are
    /// returned as run failures.
    pub async fn run_training(
        &self,
        progress: &Progress,
        cancel: &CancellationToken,
    ) -> TaskResult<RunOutcome> {
        let mut state = RunState::Idle;

        let result = self.run_training_inner(&mut state, progress, cancel).await;
        match &result {
            Ok(outcome) => {
                let terminal = match outcome {
                    RunOutcome::Cancelled => RunState::Cancelled,
                    _ => RunState::Done,
                };
                Self::transition(&mut state, terminal);
            }
            Err(e) => {
                tracing::error!(state = state.name(), error = %e, "Pipeline run failed");
                Self::transition(&mut state, RunState::Failed);
            }
        }

        result
    }

    async fn run_training_inner(
        &self,
        state: &mut RunState,
        progress: &Progress,
        cancel: &CancellationToken,
    ) -> TaskResult<RunOutcome> {
        Self::transition(state, RunState::EvolvingSchema);
        tracing::info!(
            database = %self.config.smart_inbox_snapshot_path,
            "Opening snapshot database"
        );
        let store = SnapshotStore::open(&self.config.smart_inbox_snapshot_path)
            .await
            .map_err(|e| TaskError::Synchronization(e.to_string()))?;

        let items = self
            .catalog
            .movies()
            .await
            .map_err(|e| TaskError::Synchronization(e.to_string()))?;
        let genres = GenreColumns::from_items(items.iter());
        evolve_schema(&store, &genres)
            .await
            .map_err(|e| TaskError::Synchronization(e.to_string()))?;

        Self::transition(state, RunState::Synchronizing);
        let stamp = run_stamp(Utc::now());
        synchronize(&store, &items, &genres, &stamp, progress).await?;

        Self::transition(state, RunState::Submitting);
        self.training
            .submit(
                &self.config.smart_inbox_snapshot_path,
                &self.config.hyperparameters(),
                &self.handles,
            )
            .await?;
        progress.report(SUBMITTED_PROGRESS);

        Self::transition(state, RunState::Polling);
        let rec_store = RecommendationStore::open(&self.config.smart_inbox_recommendations_path)
            .await?;
        match self.poller.poll(&self.handles, &rec_store, cancel).await? {
            PollOutcome::Updated { count } => {
                progress.report(100.0);
                Ok(RunOutcome::Completed {
                    recommendations: count,
                })
            }
            PollOutcome::Cancelled => Ok(RunOutcome::Cancelled),
            // The handle was written by the submission step above, so this
            // only happens if the file vanished out from under the run.
            PollOutcome::NothingToPoll => Ok(RunOutcome::NothingToPoll),
        }
    }

    /// Poll-only entry point: fetch results for the persisted job handle
    /// without rebuilding or resubmitting the snapshot.
    pub async fn refresh_recommendations(
        &self,
        cancel: &CancellationToken,
    ) -> TaskResult<RunOutcome> {
        let rec_store = RecommendationStore::open(&self.config.smart_inbox_recommendations_path)
            .await?;

        match self.poller.poll(&self.handles, &rec_store, cancel).await? {
            PollOutcome::Updated { count } => Ok(RunOutcome::Completed {
                recommendations: count,
            }),
            PollOutcome::Cancelled => Ok(RunOutcome::Cancelled),
            PollOutcome::NothingToPoll => Ok(RunOutcome::NothingToPoll),
        }
    }
}
