//! Display strings for amounts, ratios and dates

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// `£1,234.50`, `-£5.00`
pub fn format_money(amount: Decimal, symbol: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{}{}{}.{}", sign, symbol, group_thousands(whole), fraction)
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// A `[0, 1]` ratio as a whole percentage, e.g. `0.505` → `51%`
pub fn format_percent(ratio: Decimal) -> String {
    let percent = ratio
        .saturating_mul(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", percent.normalize())
}

/// `12 Mar 2024`
pub fn format_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%-d %b %Y").to_string()
}

/// `12 Mar 2024`, or `-` when there is no date
pub fn format_date_opt(timestamp: Option<&DateTime<Utc>>) -> String {
    timestamp.map(format_date).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn money() {
        assert_eq!(format_money(dec!(1234.5), "£"), "£1,234.50");
        assert_eq!(format_money(dec!(0), "£"), "£0.00");
        assert_eq!(format_money(dec!(-5), "$"), "-$5.00");
        assert_eq!(format_money(dec!(999999.999), "€"), "€1,000,000.00");
        assert_eq!(format_money(dec!(-0.001), "£"), "£0.00");
    }

    #[test]
    fn percent() {
        assert_eq!(format_percent(dec!(0.5)), "50%");
        assert_eq!(format_percent(dec!(0.505)), "51%");
        assert_eq!(format_percent(Decimal::ONE), "100%");
        assert_eq!(format_percent(Decimal::ZERO), "0%");
    }

    #[test]
    fn dates() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 2, 15, 0, 0).unwrap();
        assert_eq!(format_date(&ts), "2 Mar 2024");
        assert_eq!(format_date_opt(None), "-");
    }
}
