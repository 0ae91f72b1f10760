//! # Pricing Models
//!
//! Invoices come in two flavours that disagree on what a line's subtotal is.
//! Each is a named strategy behind the [`PricingModel`] trait.
//!
//! ```text
//! ┌────────────────────┬──────────────────────────┬──────────────────────────┐
//! │                    │ StandardPricing          │ CommissionPricing        │
//! ├────────────────────┼──────────────────────────┼──────────────────────────┤
//! │ subtotal           │ unit_price × quantity    │ unit_price (ad spend)    │
//! │ discount / tax     │ on subtotal / on net     │ on subtotal / on net     │
//! │ commission         │ on subtotal              │ on subtotal              │
//! │ typical table      │ name, price, qty, tax,   │ name, ad spend,          │
//! │                    │ discount, total          │ commission, total        │
//! └────────────────────┴──────────────────────────┴──────────────────────────┘
//! ```
//!
//! All amounts are exact; rounding happens when values are formatted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::line_item::LineItem;
use crate::money::Money;

/// Per-item derived amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ItemPricing {
    pub subtotal: Money,
    pub discount: Money,
    pub net: Money,
    pub tax: Money,
    pub gross: Money,
    pub commission: Money,
    pub total_with_commission: Money,
}

/// Strategy for deriving a line item's amounts.
///
/// Only [`subtotal`](Self::subtotal) differs between models; the rest of the
/// pipeline is shared.
pub trait PricingModel: Send + Sync {
    fn name(&self) -> &'static str;

    fn subtotal(&self, item: &LineItem) -> Money;

    fn discount(&self, item: &LineItem) -> Money {
        let subtotal = self.subtotal(item);
        let amount = item
            .discount
            .map_or(Decimal::ZERO, |d| d.amount_of(subtotal.amount()));
        Money::new(amount, subtotal.currency())
    }

    fn net(&self, item: &LineItem) -> Money {
        let subtotal = self.subtotal(item);
        let discount = self.discount(item);
        Money::new(subtotal.amount() - discount.amount(), subtotal.currency())
    }

    /// Tax on the discounted base.
    fn tax(&self, item: &LineItem) -> Money {
        let net = self.net(item);
        let amount = item.tax.map_or(Decimal::ZERO, |t| t.amount_of(net.amount()));
        Money::new(amount, net.currency())
    }

    fn gross(&self, item: &LineItem) -> Money {
        let net = self.net(item);
        let tax = self.tax(item);
        Money::new(net.amount() + tax.amount(), net.currency())
    }

    /// Commission on the pre-discount subtotal.
    fn commission(&self, item: &LineItem) -> Money {
        let subtotal = self.subtotal(item);
        let amount = item
            .commission
            .map_or(Decimal::ZERO, |c| c.amount_of(subtotal.amount()));
        Money::new(amount, subtotal.currency())
    }

    fn total_with_commission(&self, item: &LineItem) -> Money {
        let subtotal = self.subtotal(item);
        let commission = self.commission(item);
        Money::new(subtotal.amount() + commission.amount(), subtotal.currency())
    }

    fn breakdown(&self, item: &LineItem) -> ItemPricing {
        ItemPricing {
            subtotal: self.subtotal(item),
            discount: self.discount(item),
            net: self.net(item),
            tax: self.tax(item),
            gross: self.gross(item),
            commission: self.commission(item),
            total_with_commission: self.total_with_commission(item),
        }
    }
}

/// Quantity × unit price.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPricing;

impl PricingModel for StandardPricing {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn subtotal(&self, item: &LineItem) -> Money {
        item.unit_price.mul(item.quantity)
    }
}

/// Agency model: the unit price is the whole line's spend, quantity is
/// informational only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionPricing;

impl PricingModel for CommissionPricing {
    fn name(&self) -> &'static str {
        "commission"
    }

    fn subtotal(&self, item: &LineItem) -> Money {
        item.unit_price.clone()
    }
}

/// Serializable selector for a pricing model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PricingModelKind {
    #[default]
    Standard,
    Commission,
}

static STANDARD: StandardPricing = StandardPricing;
static COMMISSION: CommissionPricing = CommissionPricing;

impl PricingModelKind {
    pub fn model(self) -> &'static dyn PricingModel {
        match self {
            PricingModelKind::Standard => &STANDARD,
            PricingModelKind::Commission => &COMMISSION,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
