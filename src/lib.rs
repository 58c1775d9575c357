//! Salon client data layer
//!
//! Typed access to the client-management data of a salon point-of-sale
//! backend: paginated client lists, per-client sales, products, memberships
//! and vouchers, the voucher sales report and transaction details, plus the
//! derived figures screens show for them.
//!
//! Data is read through a PostgREST endpoint. [`Repository`] turns domain
//! requests into queries and normalizes the nested rows; [`ClientListStore`]
//! keeps a shared, paginated client list; [`derived`] holds the pure
//! functions for balances, ratios and line listings.

pub mod config;
pub mod derived;
pub mod error;
pub mod format;
pub mod models;
pub mod normalize;
pub mod numeric;
pub mod pagination;
pub mod repository;
pub mod store;

use reqwest::Client;
use salon_postgrest::PostgrestClient;

use crate::config::{BackendConfig, ClientOptions};
use crate::error::Result;

pub use crate::repository::Repository;
pub use crate::store::{ClientListState, ClientListStore, ClientSource};
pub use salon_postgrest::SortOrder;

/// Connection to the salon backend
#[derive(Debug, Clone)]
pub struct Backend {
    /// The base URL of the backend
    url: String,
    /// The anonymous API key
    key: String,
    /// HTTP client used for requests
    http_client: Client,
    /// Client options
    options: ClientOptions,
}

impl Backend {
    /// Create a backend handle with default options
    ///
    /// # Example
    ///
    /// ```
    /// use salon_clients::Backend;
    ///
    /// let backend = Backend::new("https://your-project.example.com", "your-anon-key");
    /// let repository = backend.repository();
    /// ```
    pub fn new(url: &str, key: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client: Client::new(),
            options: ClientOptions::default(),
        }
    }

    /// Create a backend handle with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use salon_clients::{Backend, config::ClientOptions};
    ///
    /// let options = ClientOptions::default().with_request_timeout(Some(Duration::from_secs(15)));
    /// let backend = Backend::new_with_options("https://your-project.example.com", "your-anon-key", options)
    ///     .unwrap();
    /// ```
    pub fn new_with_options(url: &str, key: &str, options: ClientOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            options,
        })
    }

    /// Create a backend handle from validated configuration
    pub fn from_config(config: &BackendConfig, options: ClientOptions) -> Result<Self> {
        Self::new_with_options(&config.base_url(), &config.anon_key, options)
    }

    /// Create a backend handle from `SALON_BACKEND_URL` / `SALON_BACKEND_ANON_KEY`
    pub fn from_env() -> Result<Self> {
        let config = BackendConfig::from_env()?;
        Self::from_config(&config, ClientOptions::default())
    }

    /// Start a query on a table or view
    pub fn from(&self, table: &str) -> Result<PostgrestClient> {
        let mut client =
            PostgrestClient::new(&self.url, &self.key, table, self.http_client.clone());
        if let Some(token) = &self.options.access_token {
            client = client.with_auth(token)?;
        }
        if self.options.db_schema != "public" {
            client = client.schema(&self.options.db_schema)?;
        }
        Ok(client)
    }

    /// Client options
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Base URL of the backend
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Repository over this backend
    pub fn repository(&self) -> Repository {
        Repository::new(self.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::{BackendConfig, ClientOptions};
    pub use crate::derived::*;
    pub use crate::error::{Error, Result};
    pub use crate::models::*;
    pub use crate::store::{ClientListState, ClientListStore, ClientSource};
    pub use crate::{Backend, Repository, SortOrder};
}
