use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use super::rows::ClientRefRow;
use super::Repository;
use crate::derived::build_voucher_report;
use crate::error::{Error, Result};
use crate::models::{ClientVoucher, VoucherQuery, VoucherReport, VoucherUsage};
use crate::normalize::{
    contains_ci, deserialize_datetime_opt, deserialize_one, deserialize_string,
    deserialize_string_opt,
};
use crate::numeric::deserialize_decimal;
use salon_postgrest::SortOrder;

const CLIENT_VOUCHERS_TABLE: &str = "client_vouchers";
const VOUCHER_USAGE_TABLE: &str = "voucher_usage";

const CLIENT_VOUCHER_COLUMNS: &str = "id,client_id,voucher_id,sale_id,original_value,\
     purchase_date,status,\
     clients(first_name,last_name),\
     vouchers(name,code),\
     sales(location_id)";

const VOUCHER_USAGE_COLUMNS: &str = "client_voucher_id,amount_used,discount_applied";

#[derive(Debug, Deserialize)]
struct ClientVoucherRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    client_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    voucher_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    sale_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    original_value: Decimal,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    purchase_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_one")]
    clients: Option<ClientRefRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    vouchers: Option<VoucherDefinitionRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    sales: Option<SaleLocationRow>,
}

#[derive(Debug, Deserialize)]
struct VoucherDefinitionRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaleLocationRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    location_id: Option<String>,
}

impl From<ClientVoucherRow> for ClientVoucher {
    fn from(row: ClientVoucherRow) -> Self {
        let client_name = row
            .clients
            .as_ref()
            .map(ClientRefRow::full_name)
            .unwrap_or_default();
        let (voucher_name, voucher_code) = match row.vouchers {
            Some(definition) => (definition.name.unwrap_or_default(), definition.code),
            None => (String::new(), None),
        };

        ClientVoucher {
            id: row.id,
            client_id: row.client_id,
            client_name,
            voucher_id: row.voucher_id,
            voucher_name,
            voucher_code,
            original_value: row.original_value,
            purchase_date: row.purchase_date,
            sale_id: row.sale_id,
            location_id: row.sales.and_then(|sale| sale.location_id),
            status: row.status,
        }
    }
}

impl Repository {
    /// Vouchers purchased within the query's inclusive date window, newest
    /// first. Location and text filters are applied after flattening.
    pub async fn list_client_vouchers(&self, query: &VoucherQuery) -> Result<Vec<ClientVoucher>> {
        if query.end_date < query.start_date {
            return Err(Error::invalid_input(format!(
                "end date {} is before start date {}",
                query.end_date, query.start_date
            )));
        }

        let rows = self
            .backend
            .from(CLIENT_VOUCHERS_TABLE)?
            .select(CLIENT_VOUCHER_COLUMNS)
            .gte("purchase_date", &start_of_day(query.start_date))
            .lte("purchase_date", &end_of_day(query.end_date))
            .order("purchase_date", SortOrder::Descending)
            .execute::<ClientVoucherRow>()
            .await?;

        let fetched = rows.len();
        let vouchers: Vec<ClientVoucher> = rows
            .into_iter()
            .map(ClientVoucher::from)
            .filter(|voucher| matches_query(voucher, query))
            .collect();
        debug!(fetched, kept = vouchers.len(), "filtered client vouchers");

        Ok(vouchers)
    }

    /// Non-voided redemptions of the given vouchers. No request is made for
    /// an empty id list.
    pub async fn list_voucher_usage(
        &self,
        client_voucher_ids: &[String],
    ) -> Result<Vec<VoucherUsage>> {
        let mut ids: Vec<&str> = Vec::with_capacity(client_voucher_ids.len());
        for id in client_voucher_ids.iter().map(|id| id.trim()) {
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let usage = self
            .backend
            .from(VOUCHER_USAGE_TABLE)?
            .select(VOUCHER_USAGE_COLUMNS)
            .in_list("client_voucher_id", &ids)
            .not("is_voided", "is.true")
            .execute::<VoucherUsage>()
            .await?;
        Ok(usage)
    }

    /// The voucher sales report: matching vouchers with their balances and
    /// the totals across them.
    pub async fn voucher_report(&self, query: &VoucherQuery) -> Result<VoucherReport> {
        let vouchers = self.list_client_vouchers(query).await?;
        let ids: Vec<String> = vouchers.iter().map(|v| v.id.clone()).collect();
        let usage = self.list_voucher_usage(&ids).await?;
        Ok(build_voucher_report(vouchers, &usage))
    }
}

fn start_of_day(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

fn end_of_day(date: NaiveDate) -> String {
    format!("{}T23:59:59.999", date.format("%Y-%m-%d"))
}

/// With a location set, rows without a resolvable location are dropped.
/// Without one every row is kept.
fn matches_location(voucher: &ClientVoucher, locations: Option<&[String]>) -> bool {
    match locations {
        None => true,
        Some(locations) => voucher
            .location_id
            .as_ref()
            .is_some_and(|location| locations.contains(location)),
    }
}

fn matches_query(voucher: &ClientVoucher, query: &VoucherQuery) -> bool {
    matches_location(voucher, query.location_set())
        && contains_ci(Some(voucher.client_name.as_str()), query.client_name.as_deref())
        && contains_ci(Some(voucher.voucher_name.as_str()), query.voucher_name.as_deref())
        && contains_ci(voucher.voucher_code.as_deref(), query.voucher_code.as_deref())
}
