//! # Rate Module
//!
//! A `Rate` is a tax, discount or commission expressed either as a
//! percentage of a base or as a fixed amount in the invoice currency.
//!
//! ## Conversion Directions
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │   Percent(10) on base 200                                            │
//! │     amount-from-percent:  200 × 10 / 100          = 20               │
//! │                                                                      │
//! │   Amount(20) on base 200                                             │
//! │     percent-from-amount:  20 × 100 / 200          = 10               │
//! │     (base 0 is rejected: DivisionByZero)                             │
//! │                                                                      │
//! │   Percent(10), gross 220                                             │
//! │     net = 220 × 100 / 110 = 200,  tax = 220 − 200 = 20               │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::round2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Whether a rate is relative to its base or absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RateKind {
    Percent,
    Amount,
}

/// A percentage-or-fixed-amount value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate {
    pub kind: RateKind,
    #[ts(as = "String")]
    pub value: Decimal,
}

/// Net and tax parts recovered from a gross amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct TaxSplit {
    #[ts(as = "String")]
    pub net: Decimal,
    #[ts(as = "String")]
    pub tax: Decimal,
}

impl Rate {
    /// A rate relative to its base, e.g. `Rate::percent(dec!(8.1))`.
    pub const fn percent(value: Decimal) -> Self {
        Rate {
            kind: RateKind::Percent,
            value,
        }
    }

    /// A fixed amount in the invoice currency.
    pub const fn amount(value: Decimal) -> Self {
        Rate {
            kind: RateKind::Amount,
            value,
        }
    }

    #[inline]
    pub fn is_percent(&self) -> bool {
        self.kind == RateKind::Percent
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Exact amount this rate represents on `base`, no rounding.
    ///
    /// Percent: `base × value / 100`. Amount: `value`.
    pub fn amount_of(&self, base: Decimal) -> Decimal {
        match self.kind {
            RateKind::Percent => base * self.value / HUNDRED,
            RateKind::Amount => self.value,
        }
    }

    /// Percentage this rate represents on `base`.
    ///
    /// ## Errors
    /// `CoreError::DivisionByZero` for an amount-kind rate on a zero base.
    pub fn percent_of(&self, base: Decimal) -> CoreResult<Decimal> {
        match self.kind {
            RateKind::Percent => Ok(self.value),
            RateKind::Amount => (self.value * HUNDRED).checked_div(base).ok_or_else(|| {
                CoreError::DivisionByZero {
                    operation: "percent from amount".to_string(),
                }
            }),
        }
    }

    /// Amount on `base`, rounded to 2 places for percent rates.
    ///
    /// Amount-kind rates are already absolute and come back verbatim.
    pub fn calculate(&self, base: Decimal) -> Decimal {
        match self.kind {
            RateKind::Percent => round2(self.amount_of(base)),
            RateKind::Amount => self.value,
        }
    }

    /// `base + calculate(base)`.
    pub fn add_to_amount(&self, base: Decimal) -> Decimal {
        base + self.calculate(base)
    }

    /// Splits a tax-inclusive amount into its net and tax parts.
    ///
    /// Percent: `net = gross × 100 / (100 + value)`, `tax = gross − net`, both
    /// rounded to 2 places. Amount: the tax is the fixed value.
    ///
    /// ## Errors
    /// `CoreError::DivisionByZero` when `100 + value` is zero.
    pub fn extract_from_gross(&self, gross: Decimal) -> CoreResult<TaxSplit> {
        match self.kind {
            RateKind::Percent => {
                let net = (gross * HUNDRED)
                    .checked_div(HUNDRED + self.value)
                    .ok_or_else(|| CoreError::DivisionByZero {
                        operation: "extract tax from gross".to_string(),
                    })?;
                Ok(TaxSplit {
                    net: round2(net),
                    tax: round2(gross - net),
                })
            }
            RateKind::Amount => Ok(TaxSplit {
                net: gross - self.value,
                tax: self.value,
            }),
        }
    }

    /// String identity used to group taxes: `"10%"`, `"8.1%"`, `"5.00"`.
    ///
    /// Numerically equal rates with different scales (`10` vs `10.0`) have
    /// different labels.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RateKind::Percent => write!(f, "{}%", self.value),
            RateKind::Amount => write!(f, "{}", self.value),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
