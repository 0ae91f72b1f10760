//! # Invoice Totals
//!
//! Aggregates line items into document totals. Nothing here is cached: every
//! call derives from the immutable invoice, so repeated calls agree.
//!
//! ## Two-Tier Discount
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  item subtotal ─(item discount)─► item net                           │
//! │                                      │                               │
//! │                  Σ item net = net before document discount           │
//! │                                      │                               │
//! │                     ─(document discount)─► total net                 │
//! │                                                                      │
//! │  Tax with a document discount:                                       │
//! │    doc% = percent value, or amount × 100 / net-before-doc-discount   │
//! │    percent tax:  (item net − item net × doc% / 100) × tax% / 100     │
//! │    amount tax:   passed through unchanged                            │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use ts_rs::TS;

use crate::error::CoreResult;
use crate::invoice::Invoice;
use crate::line_item::LineItem;
use crate::money::Money;
use crate::pricing::PricingModel;
use crate::rate::{Rate, RateKind};

/// Bucket label for items without a tax rate.
pub const UNTAXED_LABEL: &str = "0%";

/// Every document-level total, exact (unrounded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct InvoiceTotals {
    /// Σ item subtotals.
    pub subtotal: Money,
    /// Σ item discounts.
    pub total_discount: Money,
    /// Σ item net amounts.
    pub net_before_document_discount: Money,
    pub document_discount: Money,
    /// Net after both discount tiers.
    pub total_net: Money,
    pub total_tax: Money,
    pub total_gross: Money,
    /// Tax grouped by rate label.
    #[ts(type = "Record<string, Money>")]
    pub tax_breakdown: BTreeMap<String, Money>,
    pub total_with_commission: Money,
    pub total_with_commission_and_fixed_fee: Money,
}

impl Invoice {
    fn model(&self) -> &'static dyn PricingModel {
        self.pricing_model().model()
    }

    fn sum_items<F>(&self, f: F) -> CoreResult<Money>
    where
        F: Fn(&dyn PricingModel, &LineItem) -> Money,
    {
        let model = self.model();
        let values: Vec<Money> = self.items().iter().map(|item| f(model, item)).collect();
        Money::sum(self.currency(), &values)
    }

    pub fn subtotal(&self) -> CoreResult<Money> {
        self.sum_items(|m, item| m.subtotal(item))
    }

    pub fn total_discount(&self) -> CoreResult<Money> {
        self.sum_items(|m, item| m.discount(item))
    }

    /// Σ item net, before the document discount.
    pub fn net_before_document_discount(&self) -> CoreResult<Money> {
        self.sum_items(|m, item| m.net(item))
    }

    /// Document discount as an amount; zero when none is set.
    pub fn document_discount_amount(&self) -> CoreResult<Money> {
        let base = self.net_before_document_discount()?;
        let amount = self
            .document_discount()
            .map_or(Decimal::ZERO, |d| d.amount_of(base.amount()));
        Ok(Money::new(amount, self.currency()))
    }

    /// Document discount as a percentage of the pre-discount net.
    ///
    /// `None` without a document discount. An amount-kind discount on a zero
    /// base counts as 0%.
    pub fn document_discount_percent(&self) -> CoreResult<Option<Decimal>> {
        let Some(discount) = self.document_discount() else {
            return Ok(None);
        };
        let base = self.net_before_document_discount()?;
        if base.is_zero() && discount.kind == RateKind::Amount {
            return Ok(Some(Decimal::ZERO));
        }
        Ok(Some(discount.percent_of(base.amount())?))
    }

    pub fn total_net(&self) -> CoreResult<Money> {
        self.net_before_document_discount()?
            .sub(&self.document_discount_amount()?)
    }

    /// Tax per item, rescaled by the document discount when present.
    fn item_taxes(&self) -> CoreResult<Vec<(String, Money)>> {
        let model = self.model();
        let doc_percent = self.document_discount_percent()?;

        let taxes = self
            .items()
            .iter()
            .map(|item| {
                let label = item.tax.map_or_else(|| UNTAXED_LABEL.to_string(), |t| t.label());
                let tax = match (doc_percent, item.tax) {
                    (Some(pct), Some(rate)) if rate.kind == RateKind::Percent => {
                        let net = model.net(item);
                        let share = net.amount() - Rate::percent(pct).amount_of(net.amount());
                        Money::new(rate.amount_of(share), net.currency())
                    }
                    _ => model.tax(item),
                };
                (label, tax)
            })
            .collect();
        Ok(taxes)
    }

    pub fn total_tax(&self) -> CoreResult<Money> {
        let taxes = self.item_taxes()?;
        Money::sum(self.currency(), taxes.iter().map(|(_, tax)| tax))
    }

    /// Net plus tax. Without a document discount this equals Σ item gross.
    pub fn total_gross(&self) -> CoreResult<Money> {
        self.total_net()?.add(&self.total_tax()?)
    }

    /// Tax amounts grouped by rate label (`"10%"`, `"8.1%"`, ...).
    ///
    /// Labels compare as strings, so `10%` and `10.0%` are separate buckets.
    pub fn tax_breakdown(&self) -> CoreResult<BTreeMap<String, Money>> {
        let mut breakdown: BTreeMap<String, Money> = BTreeMap::new();
        for (label, tax) in self.item_taxes()? {
            let entry = match breakdown.remove(&label) {
                Some(existing) => existing.add(&tax)?,
                None => tax,
            };
            breakdown.insert(label, entry);
        }
        Ok(breakdown)
    }

    pub fn total_with_commission(&self) -> CoreResult<Money> {
        self.sum_items(|m, item| m.total_with_commission(item))
    }

    /// Commission total plus the fixed fee, added at most once.
    pub fn total_with_commission_and_fixed_fee(&self) -> CoreResult<Money> {
        let total = self.total_with_commission()?;
        match self.fixed_fee() {
            Some(fee) => total.add(fee),
            None => Ok(total),
        }
    }

    /// Computes every total in one pass.
    pub fn totals(&self) -> CoreResult<InvoiceTotals> {
        let totals = InvoiceTotals {
            subtotal: self.subtotal()?,
            total_discount: self.total_discount()?,
            net_before_document_discount: self.net_before_document_discount()?,
            document_discount: self.document_discount_amount()?,
            total_net: self.total_net()?,
            total_tax: self.total_tax()?,
            total_gross: self.total_gross()?,
            tax_breakdown: self.tax_breakdown()?,
            total_with_commission: self.total_with_commission()?,
            total_with_commission_and_fixed_fee: self.total_with_commission_and_fixed_fee()?,
        };

        debug!(
            invoice = %self.number(),
            items = self.items().len(),
            model = self.model().name(),
            gross = %totals.total_gross,
            "Computed invoice totals"
        );

        Ok(totals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceBuilder, Party};
    use crate::pricing::PricingModelKind;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, "USD")
    }

    fn builder() -> InvoiceBuilder {
        InvoiceBuilder::new()
            .number("INV-100")
            .issue_date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .due_date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
            .supplier(Party::new("Acme"))
            .customer(Party::new("Globex"))
    }

    fn two_item_invoice() -> Invoice {
        builder()
            .add_item(LineItem::new("A", dec!(1), usd(dec!(100)), dec!(10)))
            .add_item(LineItem::new("B", dec!(2), usd(dec!(50)), dec!(10)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_two_item_aggregation() {
        let invoice = two_item_invoice();

        assert_eq!(invoice.subtotal().unwrap().amount(), dec!(200));
        assert_eq!(invoice.total_tax().unwrap().amount(), dec!(20));
        assert_eq!(invoice.total_gross().unwrap().amount(), dec!(220));
        assert!(invoice.total_discount().unwrap().is_zero());
        assert!(invoice.document_discount_percent().unwrap().is_none());
    }

    #[test]
    fn test_tax_breakdown_groups_by_label() {
        let invoice = builder()
            .add_item(LineItem::new("A", dec!(1), usd(dec!(100)), dec!(10)))
            .add_item(LineItem::new("B", dec!(1), usd(dec!(100)), dec!(10.0)))
            .add_item(LineItem::new("C", dec!(1), usd(dec!(50)), dec!(10)))
            .add_item(LineItem::new("D", dec!(1), usd(dec!(40)), dec!(0)).without_tax())
            .build()
            .unwrap();

        let breakdown = invoice.tax_breakdown().unwrap();
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown["10%"].amount(), dec!(15));
        assert_eq!(breakdown["10.0%"].amount(), dec!(10));
        assert!(breakdown[UNTAXED_LABEL].is_zero());
    }

    #[test]
    fn test_percent_document_discount_rescales_percent_taxes() {
        let invoice = builder()
            .add_item(LineItem::new("A", dec!(1), usd(dec!(100)), dec!(20)))
            .add_item(
                LineItem::new("B", dec!(1), usd(dec!(100)), dec!(0))
                    .with_tax(Rate::amount(dec!(3))),
            )
            .document_discount(Rate::percent(dec!(10)))
            .build()
            .unwrap();

        let totals = invoice.totals().unwrap();
        assert_eq!(totals.net_before_document_discount.amount(), dec!(200));
        assert_eq!(totals.document_discount.amount(), dec!(20));
        assert_eq!(totals.total_net.amount(), dec!(180));
        // A: (100 - 10) × 20% = 18, B: amount tax 3 unscaled
        assert_eq!(totals.total_tax.amount(), dec!(21));
        assert_eq!(totals.total_gross.amount(), dec!(201));
        assert_eq!(totals.tax_breakdown["20%"].amount(), dec!(18));
        assert_eq!(totals.tax_breakdown["3"].amount(), dec!(3));
    }

    #[test]
    fn test_amount_document_discount_on_top_of_item_discount() {
        let invoice = builder()
            .add_item(LineItem::new("A", dec!(2), usd(dec!(100)), dec!(10)).with_discount(dec!(50)))
            .add_item(LineItem::new("B", dec!(1), usd(dec!(300)), dec!(10)))
            .document_discount(Rate::amount(dec!(40)))
            .build()
            .unwrap();

        // nets: 100 + 300 = 400, doc discount 40 = 10%
        assert_eq!(invoice.total_discount().unwrap().amount(), dec!(100));
        assert_eq!(invoice.document_discount_percent().unwrap(), Some(dec!(10)));
        assert_eq!(invoice.total_net().unwrap().amount(), dec!(360));
        // (90 + 270) × 10%
        assert_eq!(invoice.total_tax().unwrap().amount(), dec!(36));
        assert_eq!(invoice.total_gross().unwrap().amount(), dec!(396));
    }

    #[test]
    fn test_amount_document_discount_on_zero_base() {
        let invoice = builder()
            .add_item(LineItem::new("Free", dec!(1), usd(dec!(0)), dec!(10)))
            .document_discount(Rate::amount(dec!(5)))
            .build()
            .unwrap();

        assert_eq!(invoice.document_discount_percent().unwrap(), Some(Decimal::ZERO));
        assert!(invoice.total_tax().unwrap().is_zero());
    }

    #[test]
    fn test_default_tax_applies_to_untaxed_items() {
        let invoice = builder()
            .add_item(LineItem::new("A", dec!(2), usd(dec!(100)), dec!(0)).without_tax())
            .add_item(LineItem::new("B", dec!(1), usd(dec!(50)), dec!(20)))
            .default_tax(Rate::percent(dec!(10)))
            .build()
            .unwrap();

        let totals = invoice.totals().unwrap();
        assert_eq!(totals.total_tax.amount(), dec!(30));
        assert_eq!(totals.tax_breakdown["10%"].amount(), dec!(20));
        assert_eq!(totals.tax_breakdown["20%"].amount(), dec!(10));
        assert!(!totals.tax_breakdown.contains_key(UNTAXED_LABEL));
    }

    #[test]
    fn test_commission_model_and_fixed_fee() {
        let invoice = builder()
            .pricing_model(PricingModelKind::Commission)
            .add_item(
                LineItem::new("Search", dec!(4), usd(dec!(1000)), dec!(0)).with_commission(dec!(15)),
            )
            .add_item(
                LineItem::new("Social", dec!(1), usd(dec!(500)), dec!(0)).with_commission(dec!(10)),
            )
            .with_fixed_fee()
            .build()
            .unwrap();

        assert_eq!(invoice.subtotal().unwrap().amount(), dec!(1500));
        assert_eq!(invoice.total_with_commission().unwrap().amount(), dec!(1700));
        assert_eq!(
            invoice.total_with_commission_and_fixed_fee().unwrap().amount(),
            dec!(1715)
        );
    }

    #[test]
    fn test_fixed_fee_absent() {
        let invoice = two_item_invoice();
        assert_eq!(
            invoice.total_with_commission_and_fixed_fee().unwrap(),
            invoice.total_with_commission().unwrap()
        );
    }

    #[test]
    fn test_totals_are_idempotent() {
        let invoice = two_item_invoice();
        let first = invoice.totals().unwrap();
        let second = invoice.totals().unwrap();
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn prop_gross_is_net_plus_tax(
            prices in proptest::collection::vec((1i64..1_000_000, 1i64..50, 0i64..300), 1..8),
            discount in 0i64..50,
        ) {
            let mut b = builder().document_discount(Rate::percent(Decimal::from(discount)));
            for (i, (cents, qty, tax_tenths)) in prices.iter().enumerate() {
                b = b.add_item(LineItem::new(
                    format!("Item {i}"),
                    Decimal::from(*qty),
                    usd(Decimal::new(*cents, 2)),
                    Decimal::new(*tax_tenths, 1),
                ));
            }
            let totals = b.build().unwrap().totals().unwrap();

            prop_assert_eq!(
                totals.total_gross.amount(),
                totals.total_net.amount() + totals.total_tax.amount()
            );
            let breakdown_sum: Decimal = totals.tax_breakdown.values().map(|m| m.amount()).sum();
            prop_assert_eq!(breakdown_sum, totals.total_tax.amount());
        }
    }
}
