//! Entity repository
//!
//! Each operation builds one PostgREST query (or a few) and normalizes the
//! nested rows into domain records. Listing operations that back a screen are
//! fail-soft: errors are logged and an empty result is returned. Report and
//! detail lookups propagate errors so the caller can show them.

mod clients;
mod memberships;
mod overview;
mod products;
mod rows;
mod sales;
mod vouchers;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ClientFilter, ClientPage};
use crate::store::ClientSource;
use crate::Backend;

pub use products::DEFAULT_PRODUCT_LIMIT;

/// Query surface over the salon backend
#[derive(Debug, Clone)]
pub struct Repository {
    backend: Backend,
}

impl Repository {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// The backend this repository queries
    pub fn backend(&self) -> &Backend {
        &self.backend
    }
}

/// Backend errors reach the store instead of arriving as an empty page
#[async_trait]
impl ClientSource for Repository {
    async fn list_clients(&self, filter: &ClientFilter) -> Result<ClientPage> {
        self.try_list_clients(filter).await
    }
}

/// Trimmed id, `None` when blank
fn non_blank_id(id: &str) -> Option<&str> {
    crate::normalize::non_blank(Some(id))
}
