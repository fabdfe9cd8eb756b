//! Pure Clado REST API client.
//!
//! A minimal client for Clado's asynchronous deep-research search. A search is
//! started with [`CladoClient::initiate_deep_research`] and then observed with
//! [`CladoClient::deep_research_status`] until it reports a terminal status.
//!
//! # Example
//!
//! ```rust,ignore
//! use clado_client::CladoClient;
//!
//! let client = CladoClient::new("your-api-key".into());
//!
//! let job_id = client.initiate_deep_research("rust compiler engineers", 30).await?;
//! let snapshot = client.deep_research_status(&job_id).await?;
//! println!("{:?}", snapshot.status);
//! ```

pub mod error;
pub mod types;

pub use error::{CladoError, Result};
pub use types::{DeepResearchRequest, DeepResearchStatus, InitiateResponse};

const DEFAULT_BASE_URL: &str = "https://search.clado.ai";

/// Default number of profiles requested per search.
pub const DEFAULT_RESULT_LIMIT: u32 = 30;

pub struct CladoClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl CladoClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    /// Start a deep-research search. Returns the remote job id.
    pub async fn initiate_deep_research(&self, query: &str, limit: u32) -> Result<String> {
        let body = DeepResearchRequest {
            query: query.to_string(),
            limit,
        };

        let url = format!("{}/api/search/deep_research", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CladoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let initiated: InitiateResponse = resp.json().await?;
        match initiated.job_id {
            Some(job_id) if !job_id.is_empty() => {
                tracing::debug!(job_id = %job_id, "Deep research initiated");
                Ok(job_id)
            }
            _ => Err(CladoError::MissingJobId),
        }
    }

    /// Fetch the current state of a deep-research job.
    ///
    /// Does not wait: a single request, whatever the job's status.
    pub async fn deep_research_status(&self, job_id: &str) -> Result<DeepResearchStatus> {
        let url = format!("{}/api/search/deep_research/{}", self.base_url, job_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(CladoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = resp.json().await?;
        Ok(DeepResearchStatus::from_payload(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = CladoClient::with_base_url("key".into(), "http://localhost:9000/");
        assert_eq!(client.base_url, "http://localhost:9000");
    }
}
