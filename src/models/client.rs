//! Client records and list filters

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::{
    deserialize_date_opt, deserialize_datetime_opt, deserialize_string, deserialize_string_opt,
    join_name,
};
use crate::numeric::deserialize_decimal;
use salon_postgrest::SortOrder;

/// Page size used when none is requested
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Canonical sort key for client lists
pub const DEFAULT_SORT_FIELD: ClientSortField = ClientSortField::TotalSales;

/// Canonical sort direction for client lists
pub const DEFAULT_SORT_ORDER: SortOrder = SortOrder::Descending;

/// Columns read for a client row
pub const CLIENT_COLUMNS: &str = "id,first_name,last_name,email,phone,date_of_birth,notes,\
                                  location_id,created_at,updated_at,total_sales";

/// A salon client. `total_sales` is maintained by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, deserialize_with = "deserialize_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date_opt")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub location_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub total_sales: Decimal,
}

impl Client {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }

    /// Up to two uppercase initials, `?` when the client has no name
    pub fn initials(&self) -> String {
        let initials: String = [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|part| part.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        }
    }
}

/// Payload for creating a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
    pub location_id: Option<String>,
}

/// Sortable client columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientSortField {
    FirstName,
    LastName,
    CreatedAt,
    UpdatedAt,
    TotalSales,
}

impl ClientSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ClientSortField::FirstName => "first_name",
            ClientSortField::LastName => "last_name",
            ClientSortField::CreatedAt => "created_at",
            ClientSortField::UpdatedAt => "updated_at",
            ClientSortField::TotalSales => "total_sales",
        }
    }

    /// Look up an allow-listed column name
    pub fn from_column(column: &str) -> Option<Self> {
        match column.trim() {
            "first_name" => Some(ClientSortField::FirstName),
            "last_name" => Some(ClientSortField::LastName),
            "created_at" => Some(ClientSortField::CreatedAt),
            "updated_at" => Some(ClientSortField::UpdatedAt),
            "total_sales" => Some(ClientSortField::TotalSales),
            _ => None,
        }
    }
}

/// Resolve a requested sort key. Keys outside the allow-list fall back to
/// `total_sales` descending regardless of the requested direction.
pub fn resolve_sort(sort_by: &str, order: SortOrder) -> (ClientSortField, SortOrder) {
    match ClientSortField::from_column(sort_by) {
        Some(field) => (field, order),
        None => (DEFAULT_SORT_FIELD, DEFAULT_SORT_ORDER),
    }
}

/// Client list request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFilter {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub location_id: Option<String>,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl Default for ClientFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            location_id: None,
            sort_by: DEFAULT_SORT_FIELD.column().to_string(),
            sort_order: DEFAULT_SORT_ORDER,
        }
    }
}

impl ClientFilter {
    /// Apply a partial update, returning the merged filter
    pub fn merge(&self, patch: &ClientFilterPatch) -> ClientFilter {
        let mut merged = self.clone();
        if let Some(page) = patch.page {
            merged.page = page;
        }
        if let Some(limit) = patch.limit {
            merged.limit = limit;
        }
        if let Some(search) = &patch.search {
            merged.search = Some(search.clone()).filter(|s| !s.trim().is_empty());
        }
        if let Some(location_id) = &patch.location_id {
            merged.location_id = location_id.clone();
        }
        if let Some(sort_by) = &patch.sort_by {
            merged.sort_by = sort_by.clone();
        }
        if let Some(sort_order) = patch.sort_order {
            merged.sort_order = sort_order;
        }
        merged
    }
}

/// Partial filter change. `None` leaves a field untouched; an empty search
/// clears it and `location_id: Some(None)` removes the location filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientFilterPatch {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub location_id: Option<Option<String>>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ClientFilterPatch {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }
}

/// One page of clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientPage {
    pub data: Vec<Client>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
    pub has_more: bool,
}

impl ClientPage {
    /// The zeroed page returned when a listing fails
    pub fn empty(page: u32) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            page,
            total_pages: 0,
            has_more: false,
        }
    }
}
