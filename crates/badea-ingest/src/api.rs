//! Client for the BADEA query and hierarchy endpoints.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use badea_model::{ApiConfig, QueryId};

use crate::error::{IngestError, Result};

/// Source of raw BADEA responses.
///
/// Responses are returned undecoded so callers can cache them verbatim.
pub trait BadeaApi {
    fn query(&self, id: &QueryId) -> Result<Value>;

    /// Fetch a hierarchy tree from the URL listed in a query response.
    fn hierarchy(&self, url: &str) -> Result<Value>;
}

/// Blocking HTTP implementation of [`BadeaApi`].
pub struct HttpApi {
    client: Client,
    query_url: String,
}

impl HttpApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| IngestError::Fetch {
                url: config.query_url.clone(),
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            query_url: config.query_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn query_url(&self, id: &QueryId) -> String {
        format!("{}/{id}", self.query_url)
    }

    fn get_json(&self, url: &str) -> Result<Value> {
        debug!(url, "Requesting BADEA resource");
        let fetch_error = |err: reqwest::Error| IngestError::Fetch {
            url: url.to_string(),
            message: err.to_string(),
        };
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, format!("badea/{}", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/json")
            .send()
            .map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .map_err(|err| IngestError::InvalidResponse {
                url: url.to_string(),
                message: err.to_string(),
            })
    }
}

impl BadeaApi for HttpApi {
    fn query(&self, id: &QueryId) -> Result<Value> {
        self.get_json(&self.query_url(id))
    }

    fn hierarchy(&self, url: &str) -> Result<Value> {
        self.get_json(url)
    }
}
