use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::error;

use super::rows::NamedRow;
use super::{non_blank_id, Repository};
use crate::error::Result;
use crate::models::{ClientMembership, MembershipDefinition};
use crate::normalize::{
    deserialize_datetime_opt, deserialize_one, deserialize_string, deserialize_string_opt,
};
use crate::numeric::{deserialize_count, deserialize_decimal};
use salon_postgrest::SortOrder;

const CLIENT_MEMBERSHIPS_TABLE: &str = "client_memberships";

const CLIENT_MEMBERSHIP_COLUMNS: &str = "id,client_id,sessions_used,status,purchase_date,\
     expiry_date,memberships(id,name,description,total_sessions,price,service_id,services(name))";

#[derive(Debug, Deserialize)]
struct ClientMembershipRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    client_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    sessions_used: i64,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    purchase_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    expiry_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_one")]
    memberships: Option<MembershipRow>,
}

#[derive(Debug, Deserialize)]
struct MembershipRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string")]
    name: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    total_sessions: i64,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    price: Decimal,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    service_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_one")]
    services: Option<NamedRow>,
}

impl From<MembershipRow> for MembershipDefinition {
    fn from(row: MembershipRow) -> Self {
        MembershipDefinition {
            id: row.id,
            name: row.name,
            description: row.description,
            total_sessions: row.total_sessions,
            price: row.price,
            service_id: row.service_id,
            service_name: row.services.and_then(|service| service.name),
        }
    }
}

impl From<ClientMembershipRow> for ClientMembership {
    fn from(row: ClientMembershipRow) -> Self {
        ClientMembership {
            id: row.id,
            client_id: row.client_id,
            sessions_used: row.sessions_used,
            status: row.status,
            purchase_date: row.purchase_date,
            expiry_date: row.expiry_date,
            membership: row
                .memberships
                .map(MembershipDefinition::from)
                .unwrap_or_default(),
        }
    }
}

impl Repository {
    /// A client's memberships with their definitions, most recent first.
    /// Empty for a blank id or on error.
    pub async fn list_memberships_by_client(&self, client_id: &str) -> Vec<ClientMembership> {
        let Some(client_id) = non_blank_id(client_id) else {
            return Vec::new();
        };

        match self.query_memberships(client_id).await {
            Ok(memberships) => memberships,
            Err(e) => {
                error!(error = %e, client_id, "failed to list memberships");
                Vec::new()
            }
        }
    }

    async fn query_memberships(&self, client_id: &str) -> Result<Vec<ClientMembership>> {
        let rows = self
            .backend
            .from(CLIENT_MEMBERSHIPS_TABLE)?
            .select(CLIENT_MEMBERSHIP_COLUMNS)
            .eq("client_id", client_id)
            .order("purchase_date", SortOrder::Descending)
            .execute::<ClientMembershipRow>()
            .await?;
        Ok(rows.into_iter().map(ClientMembership::from).collect())
    }
}
