//! Configuration for the courseware client

use std::time::Duration;

use courseware_storage::S3Options;

use crate::error::{Error, Result};

/// Base URL used when `API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Configuration options for the client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Key the session token is persisted under
    pub token_key: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            token_key: "token".to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the token key
    pub fn with_token_key(mut self, value: &str) -> Self {
        self.token_key = value.to_string();
        self
    }

    /// HTTP client honoring these options, shared by the API client and the uploader
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

/// Everything the client needs to reach its collaborators
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api`
    pub api_url: String,

    /// Object storage settings, if uploads are wanted
    pub storage: Option<S3Options>,

    /// Client options
    pub options: ClientOptions,
}

impl Config {
    /// Create a configuration for an API base URL
    pub fn new(api_url: &str) -> Result<Self> {
        let api_url = api_url.trim_end_matches('/');
        url::Url::parse(api_url)?;
        Ok(Self {
            api_url: api_url.to_string(),
            storage: None,
            options: ClientOptions::default(),
        })
    }

    /// Read `API_URL` and, when `STORAGE_ENDPOINT` is set, the storage variables
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&api_url)?;

        if std::env::var("STORAGE_ENDPOINT").is_ok() {
            config.storage = Some(S3Options::from_env().map_err(Error::config)?);
        }

        Ok(config)
    }

    /// Attach object storage settings
    pub fn with_storage(mut self, storage: S3Options) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_trims_trailing_slash() {
        let config = Config::new("http://localhost:8000/api/").unwrap();
        assert_eq!(config.api_url, "http://localhost:8000/api");
        assert!(config.storage.is_none());
        assert_eq!(config.options.token_key, "token");
        assert_eq!(config.options.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_rejects_invalid_url() {
        assert!(matches!(Config::new("not a url"), Err(Error::Url(_))));
    }
}
