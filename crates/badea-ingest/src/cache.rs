//! On-disk cache of raw query responses.
//!
//! Responses are stored verbatim at `<root>/<activity>/<query_id>.json` the
//! first time they are fetched and reused afterwards.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use badea_model::{QueryId, QueryResponse};

use crate::api::BadeaApi;
use crate::error::{IngestError, Result};
use crate::io::{read_json, write_json};

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    /// Read from the local cache.
    Hit(T),
    /// Fetched from the API after a cache miss.
    Fetched(T),
}

impl<T> Sourced<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Sourced::Hit(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Hit(value) | Sourced::Fetched(value) => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    root: PathBuf,
}

impl ResponseCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn query_path(&self, activity: &str, id: &QueryId) -> PathBuf {
        self.root.join(activity).join(format!("{id}.json"))
    }

    /// Cached response for a query. A missing file is `None`; a file that
    /// cannot be decoded is an error.
    pub fn cached_query(&self, activity: &str, id: &QueryId) -> Result<Option<QueryResponse>> {
        let path = self.query_path(activity, id);
        if !path.is_file() {
            return Ok(None);
        }
        let raw: Value = read_json(&path)?;
        let response = serde_json::from_value(raw)
            .map_err(|source| IngestError::CorruptCache { path, source })?;
        Ok(Some(response))
    }

    /// Cached response for a query, fetching and storing it on a miss.
    pub fn query(
        &self,
        activity: &str,
        id: &QueryId,
        api: &dyn BadeaApi,
    ) -> Result<Sourced<QueryResponse>> {
        if let Some(response) = self.cached_query(activity, id)? {
            debug!(query_id = %id, "Query response read from cache");
            return Ok(Sourced::Hit(response));
        }

        let path = self.query_path(activity, id);
        info!(query_id = %id, path = %path.display(), "Query not cached, requesting from API");
        let raw = api.query(id)?;
        let response: QueryResponse =
            serde_json::from_value(raw.clone()).map_err(|err| IngestError::InvalidResponse {
                url: id.to_string(),
                message: err.to_string(),
            })?;
        write_json(&raw, &path)?;
        if !response.has_data() {
            warn!(query_id = %id, "Query response has no data");
        }
        Ok(Sourced::Fetched(response))
    }
}
