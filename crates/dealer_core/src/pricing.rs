//! HT/TTC price arithmetic shared by invoices, proformas, deposits and
//! repair orders.
//!
//! # Invariants
//! - Every amount leaving this module is rounded to cents, half away from
//!   zero.
//! - Rates are percentages (`20` means 20 %).
//! - Totals are sums of already-rounded line amounts, so a printed invoice
//!   always adds up.
//! - Line and total arithmetic is checked; overflow is a validation error.
//!   Scalar helpers expect amounts bounded by `model::require_amount`.

use crate::model::line_item::LineItem;
use crate::model::ValidationError;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Standard French VAT rate, used when no other rate is configured.
pub fn default_vat_rate() -> Decimal {
    Decimal::new(20, 0)
}

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds an amount to cents.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a pre-tax price to its tax-inclusive value.
pub fn ttc_from_ht(ht: Decimal, vat_rate: Decimal) -> Decimal {
    round_cents(ht * (Decimal::ONE + vat_rate / HUNDRED))
}

/// Back-converts a tax-inclusive price to its pre-tax value.
pub fn ht_from_ttc(ttc: Decimal, vat_rate: Decimal) -> Decimal {
    round_cents(ttc / (Decimal::ONE + vat_rate / HUNDRED))
}

/// VAT amount due on a pre-tax base.
pub fn vat_from_ht(ht: Decimal, vat_rate: Decimal) -> Decimal {
    round_cents(ht * vat_rate / HUNDRED)
}

/// VAT due under the used-vehicle margin scheme.
///
/// Only the margin is taxed and the sale price already includes that VAT.
/// A sale at a loss owes nothing.
pub fn margin_vat(sale_ttc: Decimal, purchase_price: Decimal, vat_rate: Decimal) -> Decimal {
    let margin = (sale_ttc - purchase_price).max(Decimal::ZERO);
    round_cents(margin * vat_rate / (HUNDRED + vat_rate))
}

/// Computed amounts for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
    /// `quantity × unit price` before discount.
    pub gross_ht: Decimal,
    /// Gross minus line discount.
    pub net_ht: Decimal,
    pub vat: Decimal,
    pub ttc: Decimal,
}

fn in_range(value: Option<Decimal>) -> Result<Decimal, ValidationError> {
    value.ok_or_else(|| ValidationError::new("lines", "amount is out of range"))
}

/// Computes the amounts of one line.
pub fn line_amounts(line: &LineItem) -> Result<LineAmounts, ValidationError> {
    let raw_gross = in_range(line.quantity.checked_mul(line.unit_price_ht))?;
    let kept_share = in_range(HUNDRED.checked_sub(line.discount_percent))? / HUNDRED;
    let net_ht = round_cents(in_range(raw_gross.checked_mul(kept_share))?);
    let vat = round_cents(in_range(net_ht.checked_mul(line.vat_rate))? / HUNDRED);
    Ok(LineAmounts {
        gross_ht: round_cents(raw_gross),
        net_ht,
        vat,
        ttc: in_range(net_ht.checked_add(vat))?,
    })
}

/// VAT base and amount for one rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatBreakdown {
    pub base_ht: Decimal,
    pub vat: Decimal,
}

/// Document-level totals, stored alongside the lines they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub total_ht: Decimal,
    pub total_discount: Decimal,
    pub total_vat: Decimal,
    pub total_ttc: Decimal,
    /// Keyed by the normalized rate string (`"20"`, `"5.5"`).
    pub vat_by_rate: BTreeMap<String, VatBreakdown>,
}

impl Totals {
    /// Sums a set of lines.
    pub fn from_lines(lines: &[LineItem]) -> Result<Self, ValidationError> {
        let mut totals = Self::default();
        for line in lines {
            let amounts = line_amounts(line)?;
            let discount = in_range(amounts.gross_ht.checked_sub(amounts.net_ht))?;
            totals.total_ht = in_range(totals.total_ht.checked_add(amounts.net_ht))?;
            totals.total_discount = in_range(totals.total_discount.checked_add(discount))?;
            totals.total_vat = in_range(totals.total_vat.checked_add(amounts.vat))?;

            let entry = totals
                .vat_by_rate
                .entry(line.vat_rate.normalize().to_string())
                .or_default();
            entry.base_ht = in_range(entry.base_ht.checked_add(amounts.net_ht))?;
            entry.vat = in_range(entry.vat.checked_add(amounts.vat))?;
        }
        totals.total_ttc = in_range(totals.total_ht.checked_add(totals.total_vat))?;
        Ok(totals)
    }
}

/// Remaining amount after deposits, never negative.
pub fn balance_due(total_ttc: Decimal, deposits_ttc: impl IntoIterator<Item = Decimal>) -> Decimal {
    let paid: Decimal = deposits_ttc.into_iter().sum();
    (total_ttc - paid).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    fn line(quantity: &str, unit: &str, discount: &str, rate: &str) -> LineItem {
        LineItem {
            description: "item".to_string(),
            quantity: d(quantity),
            unit_price_ht: d(unit),
            discount_percent: d(discount),
            vat_rate: d(rate),
        }
    }

    #[test]
    fn ttc_and_ht_conversions_use_cent_rounding() {
        assert_eq!(ttc_from_ht(d("100"), d("20")), d("120.00"));
        assert_eq!(ttc_from_ht(d("10.01"), d("5.5")), d("10.56"));
        assert_eq!(ht_from_ttc(d("120"), d("20")), d("100.00"));
        assert_eq!(ht_from_ttc(d("19.99"), d("20")), d("16.66"));
        assert_eq!(vat_from_ht(d("16.66"), d("20")), d("3.33"));
    }

    #[test]
    fn ht_round_trip_stays_within_one_cent() {
        for cents in [1_i64, 99, 1_999, 12_345, 1_000_001, 2_499_999] {
            let ttc = Decimal::new(cents, 2);
            for rate in ["0", "2.1", "5.5", "10", "20"] {
                let back = ttc_from_ht(ht_from_ttc(ttc, d(rate)), d(rate));
                assert!(
                    (back - ttc).abs() <= d("0.01"),
                    "ttc={ttc} rate={rate} back={back}"
                );
            }
        }
    }

    #[test]
    fn line_amounts_apply_discount_before_vat() {
        let amounts = line_amounts(&line("2", "150", "10", "20")).unwrap();
        assert_eq!(amounts.gross_ht, d("300.00"));
        assert_eq!(amounts.net_ht, d("270.00"));
        assert_eq!(amounts.vat, d("54.00"));
        assert_eq!(amounts.ttc, d("324.00"));
    }

    #[test]
    fn totals_sum_lines_and_split_vat_by_rate() {
        let totals = Totals::from_lines(&[
            line("1", "1000", "0", "20"),
            line("3", "12.50", "0", "5.5"),
            line("1", "200", "50", "20"),
        ])
        .unwrap();
        assert_eq!(totals.total_ht, d("1137.50"));
        assert_eq!(totals.total_discount, d("100.00"));
        assert_eq!(totals.total_vat, d("222.06"));
        assert_eq!(totals.total_ttc, d("1359.56"));
        assert_eq!(totals.vat_by_rate.len(), 2);
        assert_eq!(totals.vat_by_rate["20"].base_ht, d("1100.00"));
        assert_eq!(totals.vat_by_rate["5.5"].vat, d("2.06"));
    }

    #[test]
    fn empty_lines_give_zero_totals() {
        let totals = Totals::from_lines(&[]).unwrap();
        assert_eq!(totals.total_ttc, Decimal::ZERO);
        assert!(totals.vat_by_rate.is_empty());
    }

    #[test]
    fn overflowing_lines_are_rejected_instead_of_panicking() {
        let huge = line("1000000000000000", "1000000000000000", "0", "20");
        assert_eq!(line_amounts(&huge).unwrap_err().field, "lines");

        let max = Decimal::MAX.to_string();
        let twice = [line("1", &max, "0", "0"), line("1", &max, "0", "0")];
        assert!(Totals::from_lines(&twice).is_err());
    }

    #[test]
    fn margin_vat_taxes_only_positive_margin() {
        assert_eq!(margin_vat(d("12000"), d("10000"), d("20")), d("333.33"));
        assert_eq!(margin_vat(d("9000"), d("10000"), d("20")), Decimal::ZERO);
    }

    #[test]
    fn balance_due_is_floored_at_zero() {
        assert_eq!(balance_due(d("1000"), [d("300"), d("200")]), d("500"));
        assert_eq!(balance_due(d("100"), [d("300")]), Decimal::ZERO);
    }
}
