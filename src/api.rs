use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::config::Settings;
use crate::error::{ApiError, CatalogError};
use crate::state::EntityRef;
use crate::stats::StatsRecord;

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    stats: Vec<PokemonStatSlot>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

/// PokeAPI client. Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct PokeApi {
    client: reqwest::Client,
    base_url: String,
    cache_dir: Option<PathBuf>,
}

impl PokeApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_dir: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_base.clone()).with_cache_dir(settings.http_cache_dir())
    }

    /// Enables the on-disk cache for the catalog listing.
    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    /// The first `limit` catalog entries. Position (1-based) becomes the id.
    pub async fn fetch_catalog(&self, limit: usize) -> Result<Vec<EntityRef>, CatalogError> {
        let url = format!("{}/pokemon?limit={limit}", self.base_url);
        match self.fetch_json_cached::<ListResponse>(&url).await {
            Ok(response) => Ok(catalog_entries(response.results)),
            Err(err) => {
                tracing::error!(error = %err, "catalog fetch failed");
                Err(CatalogError::from(err))
            }
        }
    }

    /// Base stats for one entity, flattened to name → value.
    pub async fn fetch_stats(&self, id: u16) -> Result<StatsRecord, ApiError> {
        let url = format!("{}/pokemon/{id}", self.base_url);
        let bytes = self.fetch_bytes(&url).await?;
        let response: PokemonResponse = serde_json::from_slice(&bytes)
            .map_err(|source| ApiError::Decode { url, source })?;
        Ok(response
            .stats
            .into_iter()
            .map(|slot| (slot.stat.name, slot.base_stat))
            .collect())
    }

    async fn fetch_json_cached<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ApiError> {
        let cache_path = self.cache_path(url);
        if let Some(path) = cache_path.as_deref() {
            if let Some(bytes) = read_cache(path).await {
                match serde_json::from_slice(&bytes) {
                    Ok(value) => {
                        tracing::debug!(url, "served from response cache");
                        return Ok(value);
                    }
                    Err(err) => {
                        tracing::warn!(url, error = %err, "dropping unreadable cache entry");
                        let _ = fs::remove_file(path).await;
                    }
                }
            }
        }

        let bytes = self.fetch_bytes(url).await?;
        let value = serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })?;
        if let Some(path) = cache_path.as_deref() {
            write_cache(path, &bytes).await;
        }
        Ok(value)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(|source| ApiError::Request {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let root = self.cache_dir.as_ref()?;
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        Some(root.join(hex::encode(hasher.finalize())))
    }
}

/// Ids are 1-based listing positions; entries past the id range are dropped.
fn catalog_entries(results: Vec<NamedResource>) -> Vec<EntityRef> {
    results
        .into_iter()
        .enumerate()
        .map_while(|(index, entry)| {
            let id = u16::try_from(index + 1).ok()?;
            Some(EntityRef::from_catalog(id, entry.name))
        })
        .collect()
}

async fn read_cache(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).await.ok()
}

async fn write_cache(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent).await;
    }
    if let Err(err) = fs::write(path, bytes).await {
        tracing::warn!(path = %path.display(), error = %err, "could not write response cache");
    }
}
