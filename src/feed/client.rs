// Feed HTTP client.
// Wraps reqwest with default headers, a per-request timeout and status checking.

use std::future::Future;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};

use crate::config::Config;
use crate::error::{Result, SuncacheError};

/// Anything that can hand back the body behind a URL.
/// The populator only talks to the network through this trait.
pub trait ImageSource {
    /// Fetch the full body at `url`. An empty body is an error.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// HTTP client for the manifest and image hosts.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    /// Create a client using the user agent and timeout from the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| SuncacheError::Config(format!("user_agent: {}", e)))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SuncacheError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Make a GET request, failing on transport errors and non-success statuses.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| SuncacheError::Request {
                url: url.to_string(),
                source,
            })?;

        self.check_response(url, response)
    }

    /// Check response status and convert errors.
    fn check_response(&self, url: &str, response: Response) -> Result<Response> {
        match response.status() {
            status if status.is_success() && status != StatusCode::NO_CONTENT => Ok(response),
            StatusCode::NO_CONTENT => Err(SuncacheError::EmptyBody(url.to_string())),
            status => Err(SuncacheError::Status {
                url: url.to_string(),
                status,
            }),
        }
    }
}
