//! Domain records returned by the repository

mod client;
mod membership;
mod sale;
mod voucher;

pub use client::*;
pub use membership::*;
pub use sale::*;
pub use voucher::*;

use serde::{Deserialize, Serialize};

/// Everything the client detail screen shows, loaded in one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientOverview {
    pub client: Client,
    pub memberships: Vec<ClientMembership>,
    pub sales: Vec<Sale>,
    pub products: Vec<ProductPurchase>,
    pub active_membership_count: usize,
    pub visit_count: usize,
}
