use salon_postgrest::{quote_value, CountMethod, QueryResponse};
use serde_json::Value;
use tracing::error;

use super::{non_blank_id, Repository};
use crate::error::Result;
use crate::models::{resolve_sort, Client, ClientFilter, ClientPage, NewClient, CLIENT_COLUMNS};
use crate::normalize::non_blank;
use crate::pagination::{has_more, page_range, total_pages};

const CLIENTS_TABLE: &str = "clients";

/// Columns matched by the free-text client search
const SEARCH_COLUMNS: [&str; 4] = ["first_name", "last_name", "email", "phone"];

impl Repository {
    /// One page of clients. Never fails: errors are logged and an empty page
    /// echoing the requested page number is returned.
    pub async fn list_clients(&self, filter: &ClientFilter) -> ClientPage {
        match self.try_list_clients(filter).await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, page = filter.page, "failed to list clients");
                ClientPage::empty(filter.page.max(1))
            }
        }
    }

    /// One page of clients, propagating backend errors
    pub async fn try_list_clients(&self, filter: &ClientFilter) -> Result<ClientPage> {
        let page = filter.page.max(1);
        let limit = match filter.limit {
            0 => self.backend.options().default_page_size,
            limit => limit,
        };

        let response = self.query_clients(filter, page, limit).await?;
        let (from, _) = page_range(page, limit);
        let total = response
            .count
            .unwrap_or(from + response.data.len() as u64);
        let total_pages = total_pages(total, limit);
        Ok(ClientPage {
            data: response.data,
            total,
            page,
            total_pages,
            has_more: has_more(page, total_pages),
        })
    }

    async fn query_clients(
        &self,
        filter: &ClientFilter,
        page: u32,
        limit: u32,
    ) -> Result<QueryResponse<Client>> {
        let (field, order) = resolve_sort(&filter.sort_by, filter.sort_order);
        let (from, to) = page_range(page, limit);

        let mut query = self
            .backend
            .from(CLIENTS_TABLE)?
            .select(CLIENT_COLUMNS)
            .count(CountMethod::Exact);

        if let Some(term) = non_blank(filter.search.as_deref()) {
            query = query.or(&search_filter(term));
        }
        if let Some(location_id) = non_blank(filter.location_id.as_deref()) {
            query = query.eq("location_id", location_id);
        }

        let response = query
            .order(field.column(), order)
            .range(from, to)
            .execute_with_count::<Client>()
            .await?;
        Ok(response)
    }

    /// Look up a client. `None` for a blank id, a missing row or any error.
    pub async fn get_client_by_id(&self, id: &str) -> Option<Client> {
        let id = non_blank_id(id)?;

        let result = async {
            self.backend
                .from(CLIENTS_TABLE)?
                .select(CLIENT_COLUMNS)
                .eq("id", id)
                .execute_one::<Client>()
                .await
                .map_err(crate::error::Error::from)
        }
        .await;

        match result {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, client_id = id, "failed to load client");
                None
            }
        }
    }

    /// Insert a client and return the stored record, or `None` if the
    /// backend rejected it.
    pub async fn create_client(&self, new_client: &NewClient) -> Option<Client> {
        let result = async {
            let inserted = self.backend.from(CLIENTS_TABLE)?.insert(new_client).await?;
            Ok::<_, crate::error::Error>(first_inserted(inserted))
        }
        .await;

        match result {
            Ok(Some(client)) => Some(client),
            Ok(None) => {
                error!("client insert returned no row");
                None
            }
            Err(e) => {
                error!(error = %e, "failed to create client");
                None
            }
        }
    }
}

/// `or` filter body matching `term` in any searchable column
fn search_filter(term: &str) -> String {
    let pattern = quote_value(&format!("%{}%", term));
    SEARCH_COLUMNS
        .iter()
        .map(|column| format!("{}.ilike.{}", column, pattern))
        .collect::<Vec<_>>()
        .join(",")
}

fn first_inserted(value: Value) -> Option<Client> {
    let row = match value {
        Value::Array(rows) => rows.into_iter().next()?,
        row @ Value::Object(_) => row,
        _ => return None,
    };
    serde_json::from_value(row).ok()
}
