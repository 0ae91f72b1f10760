//! # Money Module
//!
//! Provides the `Money` type: an exact decimal amount tagged with a currency.
//!
//! ## Why Exact Decimals?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Invoices also need fractional intermediates:                          │
//! │    12 × 29.99 × 8.1% = 29.15028   → rounded only when displayed        │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Base-10, 96-bit mantissa, no representation error                   │
//! │    Rounding happens explicitly, half away from zero                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::new(Decimal::new(1099, 2), "USD"); // $10.99
//! let total = price.add(&Money::new(Decimal::new(500, 2), "USD")).unwrap();
//! assert_eq!(total.amount(), Decimal::new(1599, 2));
//!
//! // Mixing currencies is an error, never a conversion
//! assert!(price.add(&Money::new(Decimal::ONE, "EUR")).is_err());
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Mul, Neg};
use ts_rs::TS;

use crate::currency::CurrencyFormatter;
use crate::error::{CoreError, CoreResult};
use crate::MONEY_DECIMAL_PLACES;

// =============================================================================
// Rounding
// =============================================================================

/// Rounds to `places` decimal places, midpoints away from zero.
///
/// This is "standard" rounding (2.345 → 2.35, -2.345 → -2.35), not banker's
/// rounding and never truncation.
#[inline]
pub fn round_half_up(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to the two places used for intermediate money results.
#[inline]
pub fn round2(value: Decimal) -> Decimal {
    round_half_up(value, MONEY_DECIMAL_PLACES)
}

/// Renders `value` with exactly `places` fractional digits, e.g. `"10.50"`.
///
/// A value that rounds to zero never renders as `"-0.00"`.
pub fn to_fixed(value: Decimal, places: u32) -> String {
    let mut rounded = round_half_up(value, places);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(places);
    rounded.to_string()
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value: exact decimal amount plus ISO currency code.
///
/// ## Design Decisions
/// - **Immutable value type**: every operation returns a new `Money`
/// - **Currency travels with the amount**: add/sub refuse to mix currencies
/// - **Codes are upper-cased** on construction so `"usd"` and `"USD"` agree
///
/// ## Where Money is Used
/// ```text
/// LineItem.unit_price ──► subtotal ──► net ──► tax ──► gross
///                              │
///                              └──► commission
///
/// InvoiceTotals: subtotal / discount / net / tax / gross / breakdown
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money {
    #[ts(as = "String")]
    amount: Decimal,
    currency: String,
}

impl Money {
    /// Creates a Money value from an exact decimal amount.
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Money {
            amount,
            currency: currency.into().trim().to_uppercase(),
        }
    }

    /// Creates a zero amount in the given currency.
    pub fn zero(currency: impl Into<String>) -> Self {
        Money::new(Decimal::ZERO, currency)
    }

    /// Parses a plain decimal string such as `"1234.56"`.
    ///
    /// For symbol-decorated strings use [`CurrencyFormatter::parse`].
    pub fn from_str_amount(amount: &str, currency: impl Into<String>) -> CoreResult<Self> {
        let parsed: Decimal = amount
            .trim()
            .parse()
            .map_err(|e: rust_decimal::Error| CoreError::InvalidAmount {
                input: amount.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Money::new(parsed, currency))
    }

    /// The exact amount.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The upper-case currency code.
    #[inline]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Adds two values of the same currency.
    ///
    /// ## Errors
    /// `CoreError::CurrencyMismatch` when the currencies differ.
    pub fn add(&self, other: &Money) -> CoreResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Money {
            amount: self.amount + other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Subtracts `other` from this value.
    ///
    /// ## Errors
    /// `CoreError::CurrencyMismatch` when the currencies differ.
    pub fn sub(&self, other: &Money) -> CoreResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Money {
            amount: self.amount - other.amount,
            currency: self.currency.clone(),
        })
    }

    /// Multiplies by a scalar, keeping the currency.
    #[inline]
    pub fn mul(&self, factor: Decimal) -> Money {
        Money {
            amount: self.amount * factor,
            currency: self.currency.clone(),
        }
    }

    /// Rounds the amount to `places` decimal places (half away from zero).
    #[inline]
    pub fn round(&self, places: u32) -> Money {
        Money {
            amount: round_half_up(self.amount, places),
            currency: self.currency.clone(),
        }
    }

    /// Checks if the amount is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Checks if the amount is strictly negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Checks if the amount is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Money {
        Money {
            amount: self.amount.abs(),
            currency: self.currency.clone(),
        }
    }

    /// Formats with this value's own currency definition, e.g. `"$ 1,234.56"`.
    ///
    /// ## Errors
    /// `CoreError::UnknownCurrency` if the code is not in the currency table.
    pub fn format(&self) -> CoreResult<String> {
        self.format_as(&self.currency)
    }

    /// Formats the amount using the definition of `currency_code`.
    pub fn format_as(&self, currency_code: &str) -> CoreResult<String> {
        Ok(CurrencyFormatter::new(currency_code)?.format(self.amount))
    }

    /// Sums values that must all share `currency`.
    ///
    /// An empty iterator yields zero in `currency`.
    pub fn sum<'a, I>(currency: &str, values: I) -> CoreResult<Money>
    where
        I: IntoIterator<Item = &'a Money>,
    {
        values
            .into_iter()
            .try_fold(Money::zero(currency), |acc, value| acc.add(value))
    }

    fn ensure_same_currency(&self, other: &Money) -> CoreResult<()> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency.clone(),
                right: other.currency.clone(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows a fixed two-place amount followed by the code: `"10.99 USD"`.
///
/// ## Note
/// This is for logs and debugging. Use [`Money::format`] for documents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            to_fixed(self.amount, MONEY_DECIMAL_PLACES),
            self.currency
        )
    }
}

/// Scalar multiplication (percentage math, quantities).
impl Mul<Decimal> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, factor: Decimal) -> Money {
        Money {
            amount: self.amount * factor,
            currency: self.currency,
        }
    }
}

impl Neg for Money {
    type Output = Money;

    #[inline]
    fn neg(self) -> Money {
        Money {
            amount: -self.amount,
            currency: self.currency,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
