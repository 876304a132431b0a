//! Emby/Jellyfin catalog provider
//!
//! Queries the media server's items API for every movie in the library and
//! maps the response into [`CatalogItem`]s. When a user id is configured the
//! per-user endpoint is used so played state reflects that user.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::{TaskError, TaskResult};
use crate::models::CatalogItem;
use crate::services::providers::CatalogSource;

#[derive(Clone)]
pub struct EmbyCatalog {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    user_id: Option<String>,
}

impl EmbyCatalog {
    pub fn new(base_url: String, api_key: Option<String>, user_id: Option<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            api_key,
            user_id,
        }
    }

    fn items_url(&self) -> String {
        match &self.user_id {
            Some(user_id) => format!("{}/Users/{}/Items", self.base_url, user_id),
            None => format!("{}/Items", self.base_url),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(rename = "Items", default)]
    items: Vec<EmbyItem>,
}

#[derive(Debug, Deserialize)]
struct EmbyItem {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "Path", default)]
    path: Option<String>,
    #[serde(rename = "ProviderIds", default)]
    provider_ids: HashMap<String, String>,
    #[serde(rename = "CommunityRating", default)]
    community_rating: Option<f32>,
    #[serde(rename = "Genres", default)]
    genres: Vec<String>,
    #[serde(rename = "UserData", default)]
    user_data: Option<EmbyUserData>,
    #[serde(rename = "DateCreated", default)]
    date_created: Option<DateTime<Utc>>,
    #[serde(rename = "DateModified", default)]
    date_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct EmbyUserData {
    #[serde(rename = "Played", default)]
    played: bool,
}

impl From<EmbyItem> for CatalogItem {
    fn from(item: EmbyItem) -> Self {
        let date_created = item
            .date_created
            .or(item.date_modified)
            .unwrap_or_else(Utc::now);
        let date_modified = item.date_modified.unwrap_or(date_created);

        CatalogItem {
            item_id: item.id,
            name: item.name,
            path: item.path,
            provider_ids: item.provider_ids.into_iter().collect(),
            community_rating: item.community_rating,
            is_played: item.user_data.map(|u| u.played).unwrap_or(false),
            genres: item.genres,
            date_created,
            date_modified,
        }
    }
}

#[async_trait]
impl CatalogSource for EmbyCatalog {
    async fn movies(&self) -> TaskResult<Vec<CatalogItem>> {
        let mut request = self.http_client.get(self.items_url()).query(&[
            ("IncludeItemTypes", "Movie"),
            ("MediaTypes", "Video"),
            ("Recursive", "true"),
            (
                "Fields",
                "ProviderIds,Genres,Path,DateCreated,DateModified,CommunityRating",
            ),
        ]);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("api_key", api_key.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TaskError::Synchronization(format!(
                "catalog query returned status {}: {}",
                status, body
            )));
        }

        let items: ItemsResponse = response.json().await?;

        tracing::info!(
            items = items.items.len(),
            provider = "emby",
            "Catalog query completed"
        );

        Ok(items.items.into_iter().map(CatalogItem::from).collect())
    }
}
