use crate::error::ClientError;
use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// A successful API response as kept in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub data: Value,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
}

/// Query options of a request; their JSON form is part of the cache key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    pub params: IndexMap<String, Value>,
}

impl RequestOptions {
    pub fn page(per_page: u32, page: u32) -> Self {
        let mut params = IndexMap::new();
        params.insert("per_page".to_string(), Value::from(per_page));
        params.insert("page".to_string(), Value::from(page));
        Self { params }
    }

    pub fn query(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key.clone(), text.clone()),
                other => (key.clone(), other.to_string()),
            })
            .collect()
    }
}

pub fn cache_key(endpoint: &str, options: Option<&RequestOptions>) -> String {
    match options.and_then(|options| serde_json::to_string(options).ok()) {
        Some(serialized) => format!("{endpoint}--qps--{serialized}"),
        None => endpoint.to_string(),
    }
}

/// Cache of API responses backed by one immutable JSON fragment per entry.
pub struct ResponseCache {
    dir: PathBuf,
    entries: RwLock<HashMap<String, CachedResponse>>,
}

impl ResponseCache {
    /// Loads every fragment found in `dir`. Fragments are read in file-name
    /// order, so on a key collision the most recently written one wins.
    pub fn load(dir: &Path) -> Self {
        let mut entries = HashMap::new();
        let mut files = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok().map(|entry| entry.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect::<Vec<_>>(),
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "No response cache loaded");
                Vec::new()
            }
        };
        files.sort();

        for path in files {
            let fragment = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json_str| {
                    serde_json::from_str::<HashMap<String, CachedResponse>>(&json_str)
                        .map_err(|e| e.to_string())
                });
            match fragment {
                Ok(fragment) => entries.extend(fragment),
                Err(e) => warn!(file = %path.display(), error = %e, "Skipping unreadable cache fragment"),
            }
        }
        debug!(dir = %dir.display(), entries = entries.len(), "Response cache loaded");

        Self {
            dir: dir.to_path_buf(),
            entries: RwLock::new(entries),
        }
    }

    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.entries.read().await.get(key).cloned()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Records a response under `key` and persists it as a new fragment.
    /// An entry already present in memory is kept.
    pub async fn store(&self, key: &str, response: CachedResponse) -> Result<PathBuf, ClientError> {
        let filename = format!("cache_{}_{}.json", Utc::now().timestamp_millis(), Uuid::new_v4());
        let path = self.dir.join(filename);

        let mut fragment = HashMap::with_capacity(1);
        fragment.insert(key.to_string(), response.clone());
        let json_str = serde_json::to_string_pretty(&fragment).map_err(|source| ClientError::Decode {
            endpoint: key.to_string(),
            source,
        })?;

        self.entries
            .write()
            .await
            .entry(key.to_string())
            .or_insert(response);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ClientError::Cache {
                path: self.dir.clone(),
                source,
            })?;
        tokio::fs::write(&path, json_str)
            .await
            .map_err(|source| ClientError::Cache {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
