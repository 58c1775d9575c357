use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::error;

use super::rows::NamedRow;
use super::{non_blank_id, Repository};
use crate::error::Result;
use crate::models::ProductPurchase;
use crate::normalize::{
    deserialize_datetime_opt, deserialize_one, deserialize_string, deserialize_string_opt,
};
use crate::numeric::{deserialize_count, deserialize_decimal, deserialize_decimal_opt};
use salon_postgrest::SortOrder;

/// Number of purchases returned when no limit is given
pub const DEFAULT_PRODUCT_LIMIT: u32 = 50;

const SALE_ITEMS_TABLE: &str = "sale_items";

const PRODUCT_PURCHASE_COLUMNS: &str = "id,sale_id,name,quantity,unit_price,total_price,\
     created_at,sales!inner(client_id,created_at),products(name)";

#[derive(Debug, Deserialize)]
struct ProductPurchaseRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    sale_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    quantity: i64,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    unit_price: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    total_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_one")]
    sales: Option<SaleDateRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    products: Option<NamedRow>,
}

#[derive(Debug, Deserialize)]
struct SaleDateRow {
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    created_at: Option<DateTime<Utc>>,
}

impl From<ProductPurchaseRow> for ProductPurchase {
    fn from(row: ProductPurchaseRow) -> Self {
        let total_price = row
            .total_price
            .unwrap_or_else(|| row.unit_price.saturating_mul(Decimal::from(row.quantity)));
        ProductPurchase {
            id: row.id,
            sale_id: row.sale_id,
            name: row
                .products
                .and_then(|product| product.name)
                .or(row.name)
                .unwrap_or_else(|| "Product".to_string()),
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price,
            created_at: row.created_at.or(row.sales.and_then(|sale| sale.created_at)),
        }
    }
}

impl Repository {
    /// Products bought by a client across their sales, newest first.
    /// Empty for a blank id or on error.
    pub async fn list_product_purchases_by_client(
        &self,
        client_id: &str,
        limit: Option<u32>,
    ) -> Vec<ProductPurchase> {
        let Some(client_id) = non_blank_id(client_id) else {
            return Vec::new();
        };
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PRODUCT_LIMIT);

        match self.query_product_purchases(client_id, limit).await {
            Ok(purchases) => purchases,
            Err(e) => {
                error!(error = %e, client_id, "failed to list product purchases");
                Vec::new()
            }
        }
    }

    async fn query_product_purchases(
        &self,
        client_id: &str,
        limit: u32,
    ) -> Result<Vec<ProductPurchase>> {
        let rows = self
            .backend
            .from(SALE_ITEMS_TABLE)?
            .select(PRODUCT_PURCHASE_COLUMNS)
            .eq("sales.client_id", client_id)
            .eq("item_type", "product")
            .order("created_at", SortOrder::Descending)
            .limit(u64::from(limit))
            .execute::<ProductPurchaseRow>()
            .await?;
        Ok(rows.into_iter().map(ProductPurchase::from).collect())
    }
}
