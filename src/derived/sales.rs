use rust_decimal::Decimal;

use crate::models::{AppointmentService, DisplayLine, Sale, SaleLineItem, StaffRef};
use crate::numeric::saturating_sum;

pub const SERVICE_FALLBACK_TITLE: &str = "Service";
pub const ITEM_FALLBACK_TITLE: &str = "Item";
pub const NO_STAFF_LABEL: &str = "No staff recorded";

/// Amount of a line item: total price, else unit price × quantity, else the
/// bare price field, else zero. A missing quantity counts as one unit, and a
/// product too large to represent falls through to the price field.
pub fn line_item_amount(item: &SaleLineItem) -> Decimal {
    line_item_amount_opt(item).unwrap_or(Decimal::ZERO)
}

fn line_item_amount_opt(item: &SaleLineItem) -> Option<Decimal> {
    item.total_price
        .or_else(|| {
            item.unit_price
                .and_then(|unit| unit.checked_mul(item.quantity.unwrap_or(Decimal::ONE)))
        })
        .or(item.price)
}

/// Joined staff names, or the "no staff" label
pub fn staff_label(staff: &[StaffRef]) -> String {
    let names: Vec<&str> = staff
        .iter()
        .map(|s| s.name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        NO_STAFF_LABEL.to_string()
    } else {
        names.join(", ")
    }
}

/// One display line per appointment service when the sale came from an
/// appointment, otherwise one per line item. Never fails; a sale with neither
/// yields no lines.
pub fn combine_sale_line_items(sale: &Sale) -> Vec<DisplayLine> {
    let services = sale
        .appointment
        .as_ref()
        .map(|appointment| appointment.services.as_slice())
        .unwrap_or_default();

    if !services.is_empty() {
        return services
            .iter()
            .map(|service| service_line(service, &sale.items))
            .collect();
    }

    sale.items.iter().map(item_line).collect()
}

fn service_line(service: &AppointmentService, items: &[SaleLineItem]) -> DisplayLine {
    let matched = items
        .iter()
        .find(|item| item.appointment_service_id.as_deref() == Some(service.id.as_str()));
    let catalog = service.service.as_ref();

    let amount = matched
        .and_then(line_item_amount_opt)
        .or_else(|| catalog.and_then(|c| c.price))
        .or(service.price)
        .unwrap_or(Decimal::ZERO);

    let title = first_text(&[
        catalog.and_then(|c| c.name.as_deref()),
        matched.and_then(|item| item.description.as_deref()),
        matched.and_then(|item| item.name.as_deref()),
    ])
    .unwrap_or(SERVICE_FALLBACK_TITLE)
    .to_string();

    let staff_label = match matched {
        Some(item) if !item.staff.is_empty() => staff_label(&item.staff),
        _ => staff_label(service.staff.as_ref().map(std::slice::from_ref).unwrap_or_default()),
    };

    DisplayLine {
        title,
        amount,
        staff_label,
        quantity: matched
            .and_then(|item| item.quantity)
            .unwrap_or(Decimal::ONE),
        sale_item_id: matched.map(|item| item.id.clone()),
        appointment_service_id: Some(service.id.clone()),
        membership_name: matched.and_then(membership_name),
    }
}

fn item_line(item: &SaleLineItem) -> DisplayLine {
    let title = first_text(&[item.name.as_deref(), item.description.as_deref()])
        .unwrap_or(ITEM_FALLBACK_TITLE)
        .to_string();

    DisplayLine {
        title,
        amount: line_item_amount(item),
        staff_label: staff_label(&item.staff),
        quantity: item.quantity.unwrap_or(Decimal::ONE),
        sale_item_id: Some(item.id.clone()),
        appointment_service_id: item.appointment_service_id.clone(),
        membership_name: membership_name(item),
    }
}

fn membership_name(item: &SaleLineItem) -> Option<String> {
    item.membership_redemption
        .as_ref()
        .and_then(|r| r.membership_name.clone())
}

fn first_text<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Sum of the tip records, or the sale's own tip amount when none were recorded
pub fn tip_total(sale: &Sale) -> Decimal {
    if sale.tips.is_empty() {
        sale.tip_amount
    } else {
        saturating_sum(sale.tips.iter().map(|tip| tip.amount))
    }
}

/// What the client paid: the sale total (or subtotal − discount + tax when no
/// total was stored) plus tips.
pub fn payable_total(sale: &Sale) -> Decimal {
    let base = if sale.total > Decimal::ZERO {
        sale.total
    } else {
        sale.subtotal
            .saturating_sub(sale.discount_amount)
            .saturating_add(sale.tax_amount)
            .max(Decimal::ZERO)
    };
    base.saturating_add(tip_total(sale))
}

/// Sum of payment splits
pub fn paid_total(sale: &Sale) -> Decimal {
    saturating_sum(sale.payments.iter().map(|p| p.amount))
}
