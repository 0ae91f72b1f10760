//! # Line Items
//!
//! One billable row of an invoice. Amounts are never stored: subtotal,
//! discount, net, tax, gross and commission are derived on demand by a
//! [`PricingModel`](crate::pricing::PricingModel).
//!
//! ## Derivation Order
//! ```text
//! subtotal ──► discount ──► net ──► tax (on net) ──► gross
//!     │
//!     └──► commission (on subtotal) ──► total_with_commission
//! ```
//!
//! The getters on `LineItem` use the standard model (quantity × unit price).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::pricing::{PricingModel, StandardPricing};
use crate::rate::Rate;

/// A single invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub description: String,

    /// Secondary text printed in small grey type under the description.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<String>,

    #[ts(as = "String")]
    pub quantity: Decimal,

    pub unit_price: Money,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub tax: Option<Rate>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub discount: Option<Rate>,

    /// Agency fee on the pre-discount subtotal.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub commission: Option<Rate>,
}

impl LineItem {
    /// Creates a line item with a percent tax rate.
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::{LineItem, Money};
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::new(Decimal::ONE_HUNDRED, "USD");
    /// let item = LineItem::new("Consulting", Decimal::TWO, price, Decimal::TEN);
    /// assert_eq!(item.gross_amount().amount(), Decimal::new(220, 0));
    /// ```
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Money,
        tax_percent: Decimal,
    ) -> Self {
        LineItem {
            description: description.into(),
            details: None,
            quantity,
            unit_price,
            tax: Some(Rate::percent(tax_percent)),
            discount: None,
            commission: None,
        }
    }

    /// Applies a percentage discount.
    pub fn with_discount(self, percent: Decimal) -> Self {
        self.with_discount_rate(Rate::percent(percent))
    }

    /// Applies a percentage or fixed-amount discount.
    pub fn with_discount_rate(mut self, discount: Rate) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_tax(mut self, tax: Rate) -> Self {
        self.tax = Some(tax);
        self
    }

    pub fn without_tax(mut self) -> Self {
        self.tax = None;
        self
    }

    /// Applies a commission percentage.
    pub fn with_commission(mut self, percent: Decimal) -> Self {
        self.commission = Some(Rate::percent(percent));
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Currency of the unit price.
    pub fn currency(&self) -> &str {
        self.unit_price.currency()
    }

    // =========================================================================
    // Standard-model shortcuts
    // =========================================================================

    pub fn subtotal(&self) -> Money {
        StandardPricing.subtotal(self)
    }

    pub fn discount_amount(&self) -> Money {
        StandardPricing.discount(self)
    }

    pub fn net_amount(&self) -> Money {
        StandardPricing.net(self)
    }

    pub fn tax_amount(&self) -> Money {
        StandardPricing.tax(self)
    }

    pub fn gross_amount(&self) -> Money {
        StandardPricing.gross(self)
    }

    pub fn commission_amount(&self) -> Money {
        StandardPricing.commission(self)
    }

    pub fn total_with_commission(&self) -> Money {
        StandardPricing.total_with_commission(self)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Checks description, quantity, price and rate signs.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "line item description".to_string(),
            });
        }

        let field = |name: &str| format!("line item '{}' {}", self.description, name);

        if self.quantity <= Decimal::ZERO {
            return Err(ValidationError::MustBePositive {
                field: field("quantity"),
            });
        }
        if self.unit_price.is_negative() {
            return Err(ValidationError::Negative {
                field: field("unit price"),
            });
        }

        let rates = [
            ("tax rate", &self.tax),
            ("discount", &self.discount),
            ("commission", &self.commission),
        ];
        for (name, rate) in rates {
            if let Some(rate) = rate {
                if rate.value.is_sign_negative() && !rate.value.is_zero() {
                    return Err(ValidationError::Negative { field: field(name) });
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd(amount: Decimal) -> Money {
        Money::new(amount, "USD")
    }

    #[test]
    fn test_basic_amounts() {
        let item = LineItem::new("X", dec!(2), usd(dec!(100)), dec!(10));

        assert_eq!(item.subtotal().amount(), dec!(200));
        assert_eq!(item.discount_amount().amount(), dec!(0));
        assert_eq!(item.net_amount().amount(), dec!(200));
        assert_eq!(item.tax_amount().amount(), dec!(20));
        assert_eq!(item.gross_amount().amount(), dec!(220));
        assert_eq!(item.gross_amount().currency(), "USD");
    }

    #[test]
    fn test_discount_applies_before_tax() {
        let item = LineItem::new("X", dec!(1), usd(dec!(100)), dec!(10)).with_discount(dec!(10));

        assert_eq!(item.discount_amount().amount(), dec!(10));
        assert_eq!(item.net_amount().amount(), dec!(90));
        assert_eq!(item.tax_amount().amount(), dec!(9));
        assert_eq!(item.gross_amount().amount(), dec!(99));
    }

    #[test]
    fn test_amount_discount() {
        let item = LineItem::new("X", dec!(3), usd(dec!(10)), dec!(0))
            .with_discount_rate(Rate::amount(dec!(5)));

        assert_eq!(item.net_amount().amount(), dec!(25));
        assert_eq!(item.gross_amount().amount(), dec!(25));
    }

    #[test]
    fn test_commission_uses_subtotal_not_net() {
        let item = LineItem::new("Campaign", dec!(1), usd(dec!(1000)), dec!(0))
            .with_discount(dec!(50))
            .with_commission(dec!(15));

        assert_eq!(item.commission_amount().amount(), dec!(150));
        assert_eq!(item.total_with_commission().amount(), dec!(1150));
    }

    #[test]
    fn test_amounts_are_not_rounded() {
        let item = LineItem::new("Widget", dec!(3), usd(dec!(0.333)), dec!(8.1));
        assert_eq!(item.tax_amount().amount(), dec!(0.080919));
    }

    #[test]
    fn test_untaxed_item() {
        let item = LineItem::new("Gift", dec!(1), usd(dec!(5)), dec!(0)).without_tax();
        assert!(item.tax_amount().is_zero());
        assert_eq!(item.gross_amount().amount(), dec!(5));
    }

    #[test]
    fn test_validate() {
        let ok = LineItem::new("X", dec!(1), usd(dec!(0)), dec!(0));
        assert!(ok.validate().is_ok());

        let empty = LineItem::new("  ", dec!(1), usd(dec!(1)), dec!(0));
        assert!(matches!(empty.validate(), Err(ValidationError::Required { .. })));

        let zero_qty = LineItem::new("X", dec!(0), usd(dec!(1)), dec!(0));
        assert_eq!(
            zero_qty.validate().unwrap_err(),
            ValidationError::MustBePositive {
                field: "line item 'X' quantity".to_string()
            }
        );

        let negative_price = LineItem::new("X", dec!(1), usd(dec!(-1)), dec!(0));
        assert!(matches!(negative_price.validate(), Err(ValidationError::Negative { .. })));

        let negative_tax = LineItem::new("X", dec!(1), usd(dec!(1)), dec!(-5));
        assert_eq!(
            negative_tax.validate().unwrap_err(),
            ValidationError::Negative {
                field: "line item 'X' tax rate".to_string()
            }
        );
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = r#"{
            "description": "Hosting",
            "quantity": "12",
            "unit_price": { "amount": "29.99", "currency": "CHF" },
            "tax": { "kind": "percent", "value": "8.1" }
        }"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.subtotal().amount(), dec!(359.88));
        assert!(item.discount.is_none());
    }
}
