use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::error;

use super::rows::{
    merge_staff, ClientRefRow, NamedRow, StaffRow, CLIENT_REF_COLUMNS, STAFF_COLUMNS,
};
use super::{non_blank_id, Repository};
use crate::error::{Error, Result};
use crate::models::{
    Appointment, AppointmentService, MembershipRedemption, PaymentSplit, Sale, SaleLineItem,
    ServiceCatalogEntry, StaffRef, TipRecord,
};
use crate::normalize::{
    deserialize_datetime_opt, deserialize_many, deserialize_one, deserialize_string,
    deserialize_string_opt,
};
use crate::numeric::{deserialize_count_opt, deserialize_decimal, deserialize_decimal_opt};
use salon_postgrest::SortOrder;

const SALES_TABLE: &str = "sales";

const SALE_COLUMNS: &str = "id,client_id,location_id,subtotal,total,tax_amount,\
     discount_amount,tip_amount,payment_method,status,created_at";

const LINE_ITEM_COLUMNS: &str = "id,appointment_service_id,item_type,name,description,\
     quantity,unit_price,total_price,price";

/// Columns for the client's sales list: sale fields, location and line items
fn sale_list_columns() -> String {
    format!(
        "{SALE_COLUMNS},locations(name),\
         sale_items({LINE_ITEM_COLUMNS},staff({STAFF_COLUMNS}))"
    )
}

/// Columns for a single sale with every relation the transaction view shows
fn sale_detail_columns() -> String {
    format!(
        "{SALE_COLUMNS},locations(name),clients({CLIENT_REF_COLUMNS}),\
         sale_items({LINE_ITEM_COLUMNS},staff({STAFF_COLUMNS}),\
         sale_item_staff(staff({STAFF_COLUMNS})),\
         membership_usage(client_membership_id,sessions_used,client_memberships(memberships(name)))),\
         tips(id,amount,payment_method,staff({STAFF_COLUMNS}),payment_methods(name)),\
         sale_payment_methods(id,amount,payment_method,payment_methods(name)),\
         appointments(id,start_time,clients({CLIENT_REF_COLUMNS}),\
         appointment_services(id,price,staff({STAFF_COLUMNS}),services(id,name,price)))"
    )
}

#[derive(Debug, Deserialize)]
struct SaleRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    client_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    location_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    subtotal: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    total: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    tax_amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    discount_amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    tip_amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    payment_method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_one")]
    locations: Option<NamedRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    clients: Option<ClientRefRow>,
    #[serde(default, deserialize_with = "deserialize_many")]
    sale_items: Vec<SaleItemRow>,
    #[serde(default, deserialize_with = "deserialize_many")]
    tips: Vec<TipRow>,
    #[serde(default, deserialize_with = "deserialize_many")]
    sale_payment_methods: Vec<PaymentRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    appointments: Option<AppointmentRow>,
}

#[derive(Debug, Deserialize)]
struct SaleItemRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    appointment_service_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    item_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    unit_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    total_price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_one")]
    staff: Option<StaffRow>,
    #[serde(default, deserialize_with = "deserialize_many")]
    sale_item_staff: Vec<SaleItemStaffRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    membership_usage: Option<MembershipUsageRow>,
}

#[derive(Debug, Deserialize)]
struct SaleItemStaffRow {
    #[serde(default, deserialize_with = "deserialize_one")]
    staff: Option<StaffRow>,
}

#[derive(Debug, Deserialize)]
struct MembershipUsageRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    client_membership_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count_opt")]
    sessions_used: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_one")]
    client_memberships: Option<UsedMembershipRow>,
}

#[derive(Debug, Deserialize)]
struct UsedMembershipRow {
    #[serde(default, deserialize_with = "deserialize_one")]
    memberships: Option<NamedRow>,
}

#[derive(Debug, Deserialize)]
struct TipRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    payment_method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_one")]
    staff: Option<StaffRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    payment_methods: Option<NamedRow>,
}

#[derive(Debug, Deserialize)]
struct PaymentRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    amount: Decimal,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    payment_method: Option<String>,
    #[serde(default, deserialize_with = "deserialize_one")]
    payment_methods: Option<NamedRow>,
}

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_datetime_opt")]
    start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_one")]
    clients: Option<ClientRefRow>,
    #[serde(default, deserialize_with = "deserialize_many")]
    appointment_services: Vec<AppointmentServiceRow>,
}

#[derive(Debug, Deserialize)]
struct AppointmentServiceRow {
    #[serde(default, deserialize_with = "deserialize_string")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    price: Option<Decimal>,
    #[serde(default, deserialize_with = "deserialize_one")]
    staff: Option<StaffRow>,
    #[serde(default, deserialize_with = "deserialize_one")]
    services: Option<ServiceRow>,
}

#[derive(Debug, Deserialize)]
struct ServiceRow {
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_string_opt")]
    name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_decimal_opt")]
    price: Option<Decimal>,
}

impl From<SaleRow> for Sale {
    fn from(row: SaleRow) -> Self {
        Sale {
            id: row.id,
            client_id: row.client_id,
            client: row.clients.map(Into::into),
            location_id: row.location_id,
            location_name: row.locations.and_then(|location| location.name),
            subtotal: row.subtotal,
            total: row.total,
            tax_amount: row.tax_amount,
            discount_amount: row.discount_amount,
            tip_amount: row.tip_amount,
            payment_method: row.payment_method,
            status: row.status,
            created_at: row.created_at,
            items: row.sale_items.into_iter().map(Into::into).collect(),
            tips: row.tips.into_iter().map(Into::into).collect(),
            payments: row.sale_payment_methods.into_iter().map(Into::into).collect(),
            appointment: row.appointments.map(Into::into),
        }
    }
}

impl From<SaleItemRow> for SaleLineItem {
    fn from(row: SaleItemRow) -> Self {
        // Direct attribution first, then the many-to-many link
        let staff = merge_staff(
            row.staff
                .into_iter()
                .chain(row.sale_item_staff.into_iter().filter_map(|link| link.staff)),
        );

        SaleLineItem {
            id: row.id,
            appointment_service_id: row.appointment_service_id,
            item_type: row.item_type,
            name: row.name,
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            price: row.price,
            staff,
            membership_redemption: row.membership_usage.map(Into::into),
        }
    }
}

impl From<MembershipUsageRow> for MembershipRedemption {
    fn from(row: MembershipUsageRow) -> Self {
        MembershipRedemption {
            client_membership_id: row.client_membership_id,
            membership_name: row
                .client_memberships
                .and_then(|m| m.memberships)
                .and_then(|definition| definition.name),
            sessions_used: row.sessions_used.unwrap_or(1),
        }
    }
}

impl From<TipRow> for TipRecord {
    fn from(row: TipRow) -> Self {
        TipRecord {
            id: row.id,
            amount: row.amount,
            staff: row.staff.map(StaffRef::from),
            payment_method: row
                .payment_methods
                .and_then(|method| method.name)
                .or(row.payment_method),
        }
    }
}

impl From<PaymentRow> for PaymentSplit {
    fn from(row: PaymentRow) -> Self {
        PaymentSplit {
            id: row.id,
            payment_method: row
                .payment_methods
                .and_then(|method| method.name)
                .or(row.payment_method)
                .unwrap_or_default(),
            amount: row.amount,
        }
    }
}

impl From<AppointmentRow> for Appointment {
    fn from(row: AppointmentRow) -> Self {
        Appointment {
            id: row.id,
            start_time: row.start_time,
            client: row.clients.map(Into::into),
            services: row.appointment_services.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<AppointmentServiceRow> for AppointmentService {
    fn from(row: AppointmentServiceRow) -> Self {
        AppointmentService {
            id: row.id,
            price: row.price,
            staff: row.staff.map(StaffRef::from),
            service: row.services.map(|service| ServiceCatalogEntry {
                id: service.id,
                name: service.name,
                price: service.price,
            }),
        }
    }
}

impl Repository {
    /// A client's sales, newest first, with their line items and location.
    /// Empty for a blank id or on error.
    pub async fn list_sales_by_client(&self, client_id: &str) -> Vec<Sale> {
        let Some(client_id) = non_blank_id(client_id) else {
            return Vec::new();
        };

        match self.query_sales_by_client(client_id).await {
            Ok(sales) => sales,
            Err(e) => {
                error!(error = %e, client_id, "failed to list sales");
                Vec::new()
            }
        }
    }

    async fn query_sales_by_client(&self, client_id: &str) -> Result<Vec<Sale>> {
        let rows = self
            .backend
            .from(SALES_TABLE)?
            .select(&sale_list_columns())
            .eq("client_id", client_id)
            .order("created_at", SortOrder::Descending)
            .execute::<SaleRow>()
            .await?;
        Ok(rows.into_iter().map(Sale::from).collect())
    }

    /// One sale with its full transaction graph. A blank id is rejected
    /// before any request is made; `None` when no sale has the id.
    pub async fn fetch_sale_by_id(&self, sale_id: &str) -> Result<Option<Sale>> {
        let sale_id =
            non_blank_id(sale_id).ok_or_else(|| Error::invalid_input("sale id is required"))?;

        let row = self
            .backend
            .from(SALES_TABLE)?
            .select(&sale_detail_columns())
            .eq("id", sale_id)
            .execute_one::<SaleRow>()
            .await?;
        Ok(row.map(Sale::from))
    }
}
