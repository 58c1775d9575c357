//! Configuration for the backend connection

use rust_decimal::Decimal;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the backend base URL
pub const URL_ENV: &str = "SALON_BACKEND_URL";

/// Environment variable holding the anonymous API key
pub const ANON_KEY_ENV: &str = "SALON_BACKEND_ANON_KEY";

/// Connection settings for the backend.
/// Load these from the environment or a secure config source.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
}

impl BackendConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(url_str)?;
        let anon_key = anon_key.into();
        if anon_key.is_empty() {
            return Err(Error::config("anon_key cannot be empty"));
        }
        Ok(Self { url, anon_key })
    }

    /// Reads `SALON_BACKEND_URL` and `SALON_BACKEND_ANON_KEY`.
    pub fn from_env() -> Result<Self> {
        let url_str = std::env::var(URL_ENV)
            .map_err(|_| Error::config(format!("{} environment variable not found", URL_ENV)))?;
        let anon_key = std::env::var(ANON_KEY_ENV).map_err(|_| {
            Error::config(format!("{} environment variable not found", ANON_KEY_ENV))
        })?;
        Self::new(&url_str, anon_key)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}

/// Configuration options for the backend client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,

    /// The database schema
    pub db_schema: String,

    /// Signed-in user's access token, sent instead of the anon key
    pub access_token: Option<String>,

    /// Page size used when a client list filter does not set one
    pub default_page_size: u32,

    /// Currency symbol used by the formatting helpers
    pub currency_symbol: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: None,
            db_schema: "public".to_string(),
            access_token: None,
            default_page_size: crate::models::DEFAULT_PAGE_SIZE,
            currency_symbol: "£".to_string(),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the database schema
    pub fn with_db_schema(mut self, value: &str) -> Self {
        self.db_schema = value.to_string();
        self
    }

    /// Set the user access token
    pub fn with_access_token(mut self, value: &str) -> Self {
        self.access_token = Some(value.to_string());
        self
    }

    /// Set the default page size (0 is ignored)
    pub fn with_default_page_size(mut self, value: u32) -> Self {
        if value > 0 {
            self.default_page_size = value;
        }
        self
    }

    /// Set the currency symbol
    pub fn with_currency_symbol(mut self, value: &str) -> Self {
        self.currency_symbol = value.to_string();
        self
    }

    /// Format an amount with the configured currency symbol
    pub fn format_money(&self, amount: Decimal) -> String {
        crate::format::format_money(amount, &self.currency_symbol)
    }
}
