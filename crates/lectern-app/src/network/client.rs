//! Shared HTTP client wrapper
//!
//! Thin wrapper around `reqwest::blocking::Client` that centralizes
//! USER_AGENT and timeout configuration.

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::Result;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the API credential on Gemini requests
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Shared HTTP client with standard configuration
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a new client with default Lectern settings
    pub fn new() -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { inner })
    }

    /// POST a JSON body with the API key header and deserialize the JSON
    /// response. Non-2xx responses surface as errors before decoding.
    pub fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        let resp = self
            .inner
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(body)
            .send()?
            .error_for_status()?;
        let data = resp.json::<T>()?;
        Ok(data)
    }

    /// Access the underlying reqwest client
    pub fn inner(&self) -> &reqwest::blocking::Client {
        &self.inner
    }
}
