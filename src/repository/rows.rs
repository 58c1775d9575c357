//! Raw row shapes shared by several queries, and their conversions

use serde::Deserialize;

use crate::models::{ClientRef, StaffRef};
use crate::normalize::{deserialize_string, deserialize_string_opt, join_name};

/// Staff columns selected wherever staff is embedded
pub(crate) const STAFF_COLUMNS: &str = "id,first_name,last_name";

/// Client columns selected wherever a client is embedded
pub(crate) const CLIENT_REF_COLUMNS: &str = "id,first_name,last_name,email,phone";

#[derive(Debug, Deserialize)]
pub(crate) struct StaffRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string")]
    first_name: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    last_name: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    name: Option<String>,
}

impl From<StaffRow> for StaffRef {
    fn from(row: StaffRow) -> Self {
        let name = row
            .name
            .unwrap_or_else(|| join_name(&row.first_name, &row.last_name));
        StaffRef { id: row.id, name }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClientRefRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string")]
    first_name: String,
    #[serde(default, deserialize_with = "deserialize_string")]
    last_name: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    phone: Option<String>,
}

impl ClientRefRow {
    pub(crate) fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

impl From<ClientRefRow> for ClientRef {
    fn from(row: ClientRefRow) -> Self {
        ClientRef {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
        }
    }
}

/// Any embedded row that only carries a name
#[derive(Debug, Deserialize)]
pub(crate) struct NamedRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    pub(crate) name: Option<String>,
}

/// Merge staff references, dropping duplicates by id (or by name when unidentified)
pub(crate) fn merge_staff(rows: impl IntoIterator<Item = StaffRow>) -> Vec<StaffRef> {
    let mut staff: Vec<StaffRef> = Vec::new();
    for candidate in rows.into_iter().map(StaffRef::from) {
        let duplicate = staff.iter().any(|existing| match (&existing.id, &candidate.id) {
            (Some(a), Some(b)) => a == b,
            _ => existing.name == candidate.name,
        });
        if !duplicate {
            staff.push(candidate);
        }
    }
    staff
}
