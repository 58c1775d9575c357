//! Purchased vouchers and their redemptions

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::deserialize_string;
use crate::numeric::deserialize_decimal;

/// A voucher bought by a client, flattened from its joins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientVoucher {
    pub id: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub voucher_id: Option<String>,
    pub voucher_name: String,
    pub voucher_code: Option<String>,
    pub original_value: Decimal,
    pub purchase_date: Option<DateTime<Utc>>,
    pub sale_id: Option<String>,
    /// Location of the sale the voucher was bought in
    pub location_id: Option<String>,
    pub status: Option<String>,
}

/// One redemption of a voucher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherUsage {
    #[serde(default, deserialize_with = "deserialize_string")]
    pub client_voucher_id: String,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub amount_used: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub discount_applied: Decimal,
}

/// Voucher report request. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `None` or empty keeps every voucher, including those with no resolvable location
    pub location_ids: Option<Vec<String>>,
    pub client_name: Option<String>,
    pub voucher_name: Option<String>,
    pub voucher_code: Option<String>,
}

impl VoucherQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            location_ids: None,
            client_name: None,
            voucher_name: None,
            voucher_code: None,
        }
    }

    pub fn with_locations<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.location_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_client_name(mut self, name: &str) -> Self {
        self.client_name = Some(name.to_string());
        self
    }

    pub fn with_voucher_name(mut self, name: &str) -> Self {
        self.voucher_name = Some(name.to_string());
        self
    }

    pub fn with_voucher_code(mut self, code: &str) -> Self {
        self.voucher_code = Some(code.to_string());
        self
    }

    /// The location set, if one was actually requested
    pub fn location_set(&self) -> Option<&[String]> {
        self.location_ids.as_deref().filter(|ids| !ids.is_empty())
    }
}

/// Display balance of a voucher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoucherBalance {
    pub original_value: Decimal,
    pub used: Decimal,
    /// Never below zero
    pub remaining: Decimal,
    /// Usage exceeds the original value
    pub overdrawn: bool,
}

/// A voucher with its derived balance, as shown in the report table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoucherReportRow {
    pub voucher: ClientVoucher,
    pub balance: VoucherBalance,
    pub usage_ratio: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoucherReportSummary {
    pub voucher_count: usize,
    pub total_value: Decimal,
    pub total_used: Decimal,
    pub total_remaining: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoucherReport {
    pub rows: Vec<VoucherReportRow>,
    pub summary: VoucherReportSummary,
}
