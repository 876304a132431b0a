use std::path::Path;

use reqwest::multipart;
use reqwest::Client as HttpClient;
use uuid::Uuid;

use crate::config::Hyperparameters;
use crate::db::JobHandleStore;
use crate::error::{TaskError, TaskResult};

/// Client for the external training service
///
/// Packages the snapshot file as a multipart upload, submits it with the
/// tunable hyperparameters, and persists the returned job handle. Any
/// failure before the response parses leaves the previous handle untouched.
pub struct TrainingClient {
    http_client: HttpClient,
    base_url: String,
}

impl TrainingClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
        }
    }

    /// Full submission URL including the hyperparameter query string.
    pub fn train_url(&self, params: &Hyperparameters) -> String {
        format!(
            "{}/api/smartinbox/train?maxEpochs={}&maxEpochsWithNoImprovement={}&newMoviesCount={}",
            self.base_url,
            params.max_epochs,
            params.max_epochs_with_no_improvement,
            params.new_movies_count
        )
    }

    /// Uploads the snapshot and persists the returned job id.
    pub async fn submit(
        &self,
        snapshot_path: &str,
        params: &Hyperparameters,
        handles: &JobHandleStore,
    ) -> TaskResult<Uuid> {
        let bytes = tokio::fs::read(snapshot_path)
            .await
            .map_err(|e| TaskError::Submission(format!("reading snapshot file: {}", e)))?;
        let file_name = Path::new(snapshot_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.db".to_string());

        let url = self.train_url(params);
        tracing::info!(
            url = %url,
            snapshot_bytes = bytes.len(),
            "Uploading snapshot to training service"
        );

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(|e| TaskError::Submission(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TaskError::Submission(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TaskError::Submission(format!(
                "training endpoint returned status {}: {}",
                status, body
            )));
        }

        // The body is the job id as a quoted scalar.
        let body = response
            .text()
            .await
            .map_err(|e| TaskError::Submission(e.to_string()))?;
        let job: Uuid = serde_json::from_str(body.trim())
            .map_err(|e| TaskError::Submission(format!("unparsable job id '{}': {}", body, e)))?;

        handles
            .save(job)
            .await
            .map_err(|e| TaskError::Submission(format!("persisting job handle: {}", e)))?;

        tracing::info!(job_id = %job, "Saved training job handle");

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_train_url_with_defaults() {
        let config = envy::from_iter::<_, Config>(Vec::<(String, String)>::new()).unwrap();
        let client = TrainingClient::new("http://trainer:5000".to_string());

        assert_eq!(
            client.train_url(&config.hyperparameters()),
            "http://trainer:5000/api/smartinbox/train?maxEpochs=500&maxEpochsWithNoImprovement=20&newMoviesCount=50"
        );
    }

    #[test]
    fn test_train_url_with_overrides() {
        let client = TrainingClient::new("http://trainer:5000".to_string());
        let params = Hyperparameters {
            max_epochs: 100,
            max_epochs_with_no_improvement: 5,
            new_movies_count: 10,
        };

        assert_eq!(
            client.train_url(&params),
            "http://trainer:5000/api/smartinbox/train?maxEpochs=100&maxEpochsWithNoImprovement=5&newMoviesCount=10"
        );
    }

    #[tokio::test]
    async fn test_failed_submission_preserves_prior_handle() {
        let dir = tempfile::tempdir().unwrap();
        let handles = JobHandleStore::new(dir.path().join("job.tid"));
        let prior = Uuid::new_v4();
        handles.save(prior).await.unwrap();

        let snapshot = dir.path().join("snapshot.db");
        tokio::fs::write(&snapshot, b"not a real db").await.unwrap();

        // Nothing listens on this port; the submission must fail without
        // touching the handle file.
        let client = TrainingClient::new("http://127.0.0.1:9".to_string());
        let params = Hyperparameters {
            max_epochs: 1,
            max_epochs_with_no_improvement: 1,
            new_movies_count: 1,
        };

        let err = client
            .submit(snapshot.to_str().unwrap(), &params, &handles)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Submission(_)));
        assert_eq!(handles.load().await.unwrap(), Some(prior));
    }

    #[tokio::test]
    async fn test_missing_snapshot_file_is_a_submission_error() {
        let dir = tempfile::tempdir().unwrap();
        let handles = JobHandleStore::new(dir.path().join("job.tid"));
        let client = TrainingClient::new("http://127.0.0.1:9".to_string());
        let params = Hyperparameters {
            max_epochs: 1,
            max_epochs_with_no_improvement: 1,
            new_movies_count: 1,
        };

        let missing = dir.path().join("nope.db");
        let err = client
            .submit(missing.to_str().unwrap(), &params, &handles)
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Submission(_)));
        assert_eq!(handles.load().await.unwrap(), None);
    }
}
