//! Sales and their line items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::join_name;

/// A staff member attributed to a line, tip or service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffRef {
    pub id: Option<String>,
    pub name: String,
}

/// Client fields embedded in a sale or appointment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientRef {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientRef {
    pub fn full_name(&self) -> String {
        join_name(&self.first_name, &self.last_name)
    }
}

/// A membership session consumed by a line item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MembershipRedemption {
    pub client_membership_id: Option<String>,
    pub membership_name: Option<String>,
    pub sessions_used: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleLineItem {
    pub id: String,
    pub appointment_service_id: Option<String>,
    pub item_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub price: Option<Decimal>,
    pub staff: Vec<StaffRef>,
    pub membership_redemption: Option<MembershipRedemption>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TipRecord {
    pub id: String,
    pub amount: Decimal,
    pub staff: Option<StaffRef>,
    pub payment_method: Option<String>,
}

/// Part of a sale paid with one method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentSplit {
    pub id: String,
    pub payment_method: String,
    pub amount: Decimal,
}

/// Service catalog entry referenced by an appointment service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceCatalogEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentService {
    pub id: String,
    pub price: Option<Decimal>,
    pub staff: Option<StaffRef>,
    pub service: Option<ServiceCatalogEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub client: Option<ClientRef>,
    pub services: Vec<AppointmentService>,
}

/// A completed transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub client_id: Option<String>,
    pub client: Option<ClientRef>,
    pub location_id: Option<String>,
    pub location_name: Option<String>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub tip_amount: Decimal,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub items: Vec<SaleLineItem>,
    pub tips: Vec<TipRecord>,
    pub payments: Vec<PaymentSplit>,
    pub appointment: Option<Appointment>,
}

/// One row of the combined line listing on a transaction view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayLine {
    pub title: String,
    pub amount: Decimal,
    pub staff_label: String,
    pub quantity: Decimal,
    /// The line item this row came from, if any
    pub sale_item_id: Option<String>,
    /// The appointment service this row came from, if any
    pub appointment_service_id: Option<String>,
    pub membership_name: Option<String>,
}

/// A product bought by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPurchase {
    pub id: String,
    pub sale_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub created_at: Option<DateTime<Utc>>,
}
