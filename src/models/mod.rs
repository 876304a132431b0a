pub mod catalog;
pub mod genres;
pub mod recommendation;

pub use catalog::{CatalogItem, MediaRef, ProviderKey};
pub use genres::GenreColumns;
pub use recommendation::{Recommendation, RecommendationKind};
