use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use smart_inbox::{Config, EmbyCatalog, Pipeline, Progress, RunOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "smart_inbox=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let catalog = Arc::new(EmbyCatalog::new(
        config.smart_inbox_emby_url.clone(),
        config.smart_inbox_emby_api_key.clone(),
        config.smart_inbox_emby_user_id.clone(),
    ));
    let pipeline = Pipeline::new(config, catalog);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Cancellation requested");
            signal_token.cancel();
        }
    });

    let (progress, mut progress_rx) = Progress::channel();
    tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            tracing::debug!(progress = *progress_rx.borrow(), "Run progress");
        }
    });

    match pipeline.run_training(&progress, &cancel).await {
        Ok(RunOutcome::Completed { recommendations }) => {
            tracing::info!(recommendations, "Run completed");
            Ok(())
        }
        Ok(RunOutcome::Cancelled) => {
            tracing::info!("Run cancelled");
            Ok(())
        }
        Ok(RunOutcome::NothingToPoll) => {
            tracing::warn!("Run finished with no job to poll");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
