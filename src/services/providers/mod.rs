//! Catalog provider abstraction
//!
//! The media library is owned by an external server; the pipeline only ever
//! reads it through this seam. Implementations must be safe to share across
//! the orchestrator and the display-surface accessor.

use async_trait::async_trait;

use crate::error::TaskResult;
use crate::models::CatalogItem;

mod emby;

pub use emby::EmbyCatalog;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All video-type items under the configured library scope.
    async fn movies(&self) -> TaskResult<Vec<CatalogItem>>;
}
