use serde::Deserialize;

/// Application configuration loaded from environment variables
///
/// Training hyperparameters are kept as raw strings so that a malformed
/// override falls back to its default instead of failing the run; see
/// [`Config::hyperparameters`].
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the external training service
    #[serde(default = "default_server_url")]
    pub smart_inbox_server_url: String,

    /// Maximum training epochs (default 500)
    #[serde(default)]
    pub smart_inbox_max_epochs: Option<String>,

    /// Maximum epochs without improvement before early stop (default 20)
    #[serde(default)]
    pub smart_inbox_max_epochs_with_no_improvement: Option<String>,

    /// Minimum count of new items to emphasize during training (default 50)
    #[serde(default)]
    pub smart_inbox_new_movies_count: Option<String>,

    /// Path of the snapshot database file
    #[serde(default = "default_snapshot_path")]
    pub smart_inbox_snapshot_path: String,

    /// Path of the recommendations database file
    #[serde(default = "default_recommendations_path")]
    pub smart_inbox_recommendations_path: String,

    /// Path of the persisted training job handle
    #[serde(default = "default_job_handle_path")]
    pub smart_inbox_job_handle_path: String,

    /// Seconds to wait between recommendation completion checks
    #[serde(default = "default_poll_interval_secs")]
    pub smart_inbox_poll_interval_secs: u64,

    /// Media server base URL for catalog queries
    #[serde(default = "default_emby_url")]
    pub smart_inbox_emby_url: String,

    /// Media server API key
    #[serde(default)]
    pub smart_inbox_emby_api_key: Option<String>,

    /// User whose played state is captured in the snapshot
    #[serde(default)]
    pub smart_inbox_emby_user_id: Option<String>,
}

/// Effective training hyperparameters after defaulting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperparameters {
    pub max_epochs: u32,
    pub max_epochs_with_no_improvement: u32,
    pub new_movies_count: u32,
}

pub const DEFAULT_MAX_EPOCHS: u32 = 500;
pub const DEFAULT_MAX_EPOCHS_WITH_NO_IMPROVEMENT: u32 = 20;
pub const DEFAULT_NEW_MOVIES_COUNT: u32 = 50;

fn default_server_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_snapshot_path() -> String {
    "/config/data/smart-inbox.db".to_string()
}

fn default_recommendations_path() -> String {
    "/config/data/smart-inbox-recommendations.db".to_string()
}

fn default_job_handle_path() -> String {
    "/config/plugins/smart-inbox.tid".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_emby_url() -> String {
    "http://localhost:8096".to_string()
}

/// Parses a numeric override, falling back to the default when the variable
/// is absent or not a number.
fn lenient_u32(raw: &Option<String>, default: u32) -> u32 {
    raw.as_deref()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Training hyperparameters with per-variable lenient defaulting
    pub fn hyperparameters(&self) -> Hyperparameters {
        Hyperparameters {
            max_epochs: lenient_u32(&self.smart_inbox_max_epochs, DEFAULT_MAX_EPOCHS),
            max_epochs_with_no_improvement: lenient_u32(
                &self.smart_inbox_max_epochs_with_no_improvement,
                DEFAULT_MAX_EPOCHS_WITH_NO_IMPROVEMENT,
            ),
            new_movies_count: lenient_u32(
                &self.smart_inbox_new_movies_count,
                DEFAULT_NEW_MOVIES_COUNT,
            ),
        }
    }
}
