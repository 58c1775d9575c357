use rust_decimal::Decimal;

use crate::models::{
    ClientVoucher, VoucherBalance, VoucherReport, VoucherReportRow, VoucherReportSummary,
    VoucherUsage,
};
use crate::numeric::saturating_sum;

/// Sum of `amount_used` over the usage rows belonging to `voucher`
pub fn used_voucher_amount(voucher: &ClientVoucher, usage: &[VoucherUsage]) -> Decimal {
    saturating_sum(
        usage
            .iter()
            .filter(|u| u.client_voucher_id == voucher.id)
            .map(|u| u.amount_used),
    )
}

/// Original value minus redemptions. Negative when usage exceeds the value.
pub fn remaining_voucher_balance(voucher: &ClientVoucher, usage: &[VoucherUsage]) -> Decimal {
    voucher
        .original_value
        .saturating_sub(used_voucher_amount(voucher, usage))
}

/// Balance for display: remaining clamped at zero, with overdraw flagged.
pub fn voucher_balance(voucher: &ClientVoucher, usage: &[VoucherUsage]) -> VoucherBalance {
    let used = used_voucher_amount(voucher, usage);
    let raw_remaining = voucher.original_value.saturating_sub(used);
    VoucherBalance {
        original_value: voucher.original_value,
        used,
        remaining: raw_remaining.max(Decimal::ZERO),
        overdrawn: raw_remaining < Decimal::ZERO,
    }
}

/// Share of the original value already used, within `[0, 1]`.
/// Zero when the voucher has no positive value.
pub fn voucher_usage_ratio(voucher: &ClientVoucher, usage: &[VoucherUsage]) -> Decimal {
    if voucher.original_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let used = used_voucher_amount(voucher, usage);
    // Overflow only happens when usage dwarfs the value
    let ratio = used
        .checked_div(voucher.original_value)
        .unwrap_or(if used > Decimal::ZERO { Decimal::ONE } else { Decimal::ZERO });
    ratio.clamp(Decimal::ZERO, Decimal::ONE)
}

/// Rows and totals for the voucher sales report
pub fn build_voucher_report(vouchers: Vec<ClientVoucher>, usage: &[VoucherUsage]) -> VoucherReport {
    let mut summary = VoucherReportSummary::default();

    let rows = vouchers
        .into_iter()
        .map(|voucher| {
            let balance = voucher_balance(&voucher, usage);
            let usage_ratio = voucher_usage_ratio(&voucher, usage);

            summary.voucher_count += 1;
            summary.total_value = summary.total_value.saturating_add(balance.original_value);
            summary.total_used = summary.total_used.saturating_add(balance.used);
            summary.total_remaining = summary.total_remaining.saturating_add(balance.remaining);

            VoucherReportRow {
                voucher,
                balance,
                usage_ratio,
            }
        })
        .collect();

    VoucherReport { rows, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn voucher(id: &str, value: Decimal) -> ClientVoucher {
        ClientVoucher {
            id: id.to_string(),
            client_id: None,
            client_name: "Jane Doe".to_string(),
            voucher_id: None,
            voucher_name: "Gift".to_string(),
            voucher_code: None,
            original_value: value,
            purchase_date: None,
            sale_id: None,
            location_id: None,
            status: None,
        }
    }

    fn usage(id: &str, amount: Decimal) -> VoucherUsage {
        VoucherUsage {
            client_voucher_id: id.to_string(),
            amount_used: amount,
            discount_applied: Decimal::ZERO,
        }
    }

    #[test]
    fn balance_without_usage_is_original_value() {
        let v = voucher("v1", dec!(75));
        assert_eq!(remaining_voucher_balance(&v, &[]), dec!(75));
        assert_eq!(voucher_usage_ratio(&v, &[]), Decimal::ZERO);
    }

    #[test]
    fn partial_usage() {
        let v = voucher("v1", dec!(100));
        let rows = [usage("v1", dec!(30)), usage("v1", dec!(20)), usage("v2", dec!(99))];

        assert_eq!(remaining_voucher_balance(&v, &rows), dec!(50));
        assert_eq!(voucher_usage_ratio(&v, &rows), dec!(0.5));
    }

    #[test]
    fn overdrawn_voucher_is_clamped_for_display() {
        let v = voucher("v1", dec!(40));
        let rows = [usage("v1", dec!(55))];

        assert_eq!(remaining_voucher_balance(&v, &rows), dec!(-15));
        assert_eq!(voucher_usage_ratio(&v, &rows), Decimal::ONE);

        let balance = voucher_balance(&v, &rows);
        assert_eq!(balance.remaining, Decimal::ZERO);
        assert_eq!(balance.used, dec!(55));
        assert!(balance.overdrawn);
    }

    #[test]
    fn ratio_stays_in_unit_interval() {
        for original in [dec!(0), dec!(1), dec!(25), dec!(100)] {
            for used in [dec!(0), dec!(0.5), dec!(25), dec!(250)] {
                let v = voucher("v", original);
                let ratio = voucher_usage_ratio(&v, &[usage("v", used)]);
                assert!(ratio >= Decimal::ZERO && ratio <= Decimal::ONE);
            }
        }
    }

    #[test]
    fn zero_value_voucher_has_zero_ratio() {
        let v = voucher("v1", Decimal::ZERO);
        assert_eq!(voucher_usage_ratio(&v, &[usage("v1", dec!(10))]), Decimal::ZERO);
    }

    #[test]
    fn report_totals() {
        let vouchers = vec![voucher("a", dec!(100)), voucher("b", dec!(50))];
        let rows = [usage("a", dec!(30)), usage("b", dec!(60))];

        let report = build_voucher_report(vouchers, &rows);

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.summary.voucher_count, 2);
        assert_eq!(report.summary.total_value, dec!(150));
        assert_eq!(report.summary.total_used, dec!(90));
        // b is overdrawn and contributes nothing remaining
        assert_eq!(report.summary.total_remaining, dec!(70));
        assert_eq!(report.rows[0].usage_ratio, dec!(0.3));
    }

    #[test]
    fn extreme_usage_saturates() {
        let v = voucher("v1", dec!(100));
        let rows = [usage("v1", Decimal::MAX), usage("v1", Decimal::MAX)];

        assert_eq!(used_voucher_amount(&v, &rows), Decimal::MAX);
        assert_eq!(remaining_voucher_balance(&v, &rows), dec!(100) - Decimal::MAX);
        let balance = voucher_balance(&v, &rows);
        assert_eq!(balance.remaining, Decimal::ZERO);
        assert!(balance.overdrawn);
        assert_eq!(voucher_usage_ratio(&v, &rows), Decimal::ONE);
    }

    #[test]
    fn ratio_of_tiny_voucher_with_huge_usage_is_one() {
        let v = voucher("v1", dec!(0.01));
        assert_eq!(voucher_usage_ratio(&v, &[usage("v1", Decimal::MAX)]), Decimal::ONE);
        assert_eq!(voucher_usage_ratio(&v, &[usage("v1", Decimal::MIN)]), Decimal::ZERO);
    }

    #[test]
    fn report_totals_saturate() {
        let vouchers = vec![voucher("a", Decimal::MAX), voucher("b", Decimal::MAX)];
        let rows = [usage("a", Decimal::MAX), usage("b", dec!(1))];

        let report = build_voucher_report(vouchers, &rows);

        assert_eq!(report.summary.total_value, Decimal::MAX);
        assert_eq!(report.summary.total_used, Decimal::MAX);
        assert_eq!(report.summary.total_remaining, Decimal::MAX - dec!(1));
    }
}
