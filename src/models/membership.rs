//! Client memberships

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The membership product a client bought
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipDefinition {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub total_sessions: i64,
    pub price: Decimal,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
}

/// A membership owned by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMembership {
    pub id: String,
    pub client_id: Option<String>,
    pub sessions_used: i64,
    pub status: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub membership: MembershipDefinition,
}
