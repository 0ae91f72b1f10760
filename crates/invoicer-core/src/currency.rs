//! # Currency Module
//!
//! Per-currency display rules and the formatter that applies them.
//!
//! ## Formatting Pipeline
//! ```text
//!   -1234.565 (EUR)
//!        │ round to decimal_places (half away from zero)
//!        ▼
//!   -1234.57 ──► negative? remember sign, keep |x| = 1234.57
//!        │
//!        │ group integer part by thousands_separator
//!        ▼
//!   "1.234" + decimal_separator + "57"  = "1.234,57"
//!        │
//!        │ attach symbol (before/after, one space)
//!        ▼
//!   "1.234,57 €" ──► prefix sign ──► "-1.234,57 €"
//! ```
//!
//! The sign is always the outermost character, so `"-$ 5.00"` rather than
//! `"$ -5.00"`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{to_fixed, Money};
use crate::MONEY_DECIMAL_PLACES;

// =============================================================================
// Currency Definitions
// =============================================================================

/// Which side of the number the symbol goes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

/// Display rules for one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub symbol_position: SymbolPosition,
    pub decimal_places: u32,
    /// Empty for currencies without minor units (JPY).
    pub decimal_separator: &'static str,
    pub thousands_separator: &'static str,
}

const fn def(
    code: &'static str,
    name: &'static str,
    symbol: &'static str,
    symbol_position: SymbolPosition,
    decimal_places: u32,
    decimal_separator: &'static str,
    thousands_separator: &'static str,
) -> Currency {
    Currency {
        code,
        name,
        symbol,
        symbol_position,
        decimal_places,
        decimal_separator,
        thousands_separator,
    }
}

use SymbolPosition::{After, Before};

/// Built-in currency table.
static CURRENCIES: &[Currency] = &[
    def("USD", "US Dollar", "$", Before, 2, ".", ","),
    def("EUR", "Euro", "€", After, 2, ",", "."),
    def("CHF", "Swiss Franc", "CHF", Before, 2, ".", "'"),
    def("GBP", "British Pound", "£", Before, 2, ".", ","),
    def("JPY", "Japanese Yen", "¥", Before, 0, "", ","),
    def("CAD", "Canadian Dollar", "CA$", Before, 2, ".", ","),
    def("AUD", "Australian Dollar", "A$", Before, 2, ".", ","),
    def("CNY", "Chinese Yuan", "¥", Before, 2, ".", ","),
    def("INR", "Indian Rupee", "₹", Before, 2, ".", ","),
    def("BRL", "Brazilian Real", "R$", Before, 2, ",", "."),
];

/// Looks up a currency definition by code, ignoring case.
pub fn get(code: &str) -> Option<&'static Currency> {
    let code = code.trim();
    CURRENCIES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// All built-in currency definitions.
pub fn all() -> &'static [Currency] {
    CURRENCIES
}

// =============================================================================
// Formatter
// =============================================================================

/// Formats and parses amounts for a single currency.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyFormatter {
    currency: &'static Currency,
}

impl CurrencyFormatter {
    /// Creates a formatter for `code`.
    ///
    /// ## Errors
    /// `CoreError::UnknownCurrency` if the code is not in the table.
    pub fn new(code: &str) -> CoreResult<Self> {
        get(code)
            .map(|currency| CurrencyFormatter { currency })
            .ok_or_else(|| CoreError::UnknownCurrency(code.to_string()))
    }

    /// The currency definition in use.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Formats an amount, e.g. `1234.56` → `"$ 1,234.56"`.
    pub fn format(&self, amount: Decimal) -> String {
        let c = self.currency;
        let fixed = to_fixed(amount, c.decimal_places);

        let (negative, digits) = match fixed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, fixed.as_str()),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (digits, None),
        };

        let mut number = group_thousands(int_part, c.thousands_separator);
        if let Some(frac) = frac_part {
            if c.decimal_places > 0 {
                number.push_str(c.decimal_separator);
                number.push_str(frac);
            }
        }

        let with_symbol = match c.symbol_position {
            Before => format!("{} {}", c.symbol, number),
            After => format!("{} {}", number, c.symbol),
        };

        if negative {
            format!("-{with_symbol}")
        } else {
            with_symbol
        }
    }

    /// Formats a Money value's amount with this formatter's rules.
    pub fn format_money(&self, money: &Money) -> String {
        self.format(money.amount())
    }

    /// Parses a string produced by [`format`](Self::format) back into a decimal.
    ///
    /// Strips the symbol and the thousands separator, maps the decimal
    /// separator to `.` and drops whitespace. Empty separators are left alone.
    ///
    /// ## Errors
    /// `CoreError::InvalidAmount` if what remains is not a decimal.
    pub fn parse(&self, input: &str) -> CoreResult<Decimal> {
        let c = self.currency;
        let mut cleaned = input.replace(c.symbol, "");
        if !c.thousands_separator.is_empty() {
            cleaned = cleaned.replace(c.thousands_separator, "");
        }
        if !c.decimal_separator.is_empty() && c.decimal_separator != "." {
            cleaned = cleaned.replace(c.decimal_separator, ".");
        }
        let cleaned: String = cleaned.chars().filter(|ch| !ch.is_whitespace()).collect();

        cleaned
            .parse::<Decimal>()
            .map_err(|e| CoreError::InvalidAmount {
                input: input.to_string(),
                reason: e.to_string(),
            })
    }
}

fn group_thousands(int_part: &str, separator: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(digit);
    }
    out
}

/// Formats with the currency table, or `"<amount> <CODE>"` for unknown codes.
pub fn format_simple(amount: Decimal, code: &str) -> String {
    match CurrencyFormatter::new(code) {
        Ok(formatter) => formatter.format(amount),
        Err(_) => format!("{} {}", to_fixed(amount, MONEY_DECIMAL_PLACES), code),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn fmt(code: &str, amount: Decimal) -> String {
        CurrencyFormatter::new(code).unwrap().format(amount)
    }

    #[test]
    fn test_format_symbol_before() {
        assert_eq!(fmt("USD", dec!(1234.56)), "$ 1,234.56");
        assert_eq!(fmt("USD", dec!(0)), "$ 0.00");
        assert_eq!(fmt("GBP", dec!(1234567.891)), "£ 1,234,567.89");
        assert_eq!(fmt("CHF", dec!(1234.5)), "CHF 1'234.50");
        assert_eq!(fmt("BRL", dec!(1234.56)), "R$ 1.234,56");
    }

    #[test]
    fn test_format_symbol_after() {
        assert_eq!(fmt("EUR", dec!(1234.56)), "1.234,56 €");
        assert_eq!(fmt("EUR", dec!(12)), "12,00 €");
    }

    #[test]
    fn test_format_negative_sign_is_outermost() {
        assert_eq!(fmt("USD", dec!(-1234.565)), "-$ 1,234.57");
        assert_eq!(fmt("EUR", dec!(-5)), "-5,00 €");
    }

    #[test]
    fn test_format_zero_decimal_currency() {
        assert_eq!(fmt("JPY", dec!(1234567.5)), "¥ 1,234,568");
        assert_eq!(fmt("JPY", dec!(999)), "¥ 999");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(get("eur").map(|c| c.code), Some("EUR"));
        assert!(get("XYZ").is_none());
        assert_eq!(all().len(), 10);
    }

    #[test]
    fn test_unknown_currency() {
        assert_eq!(
            CurrencyFormatter::new("XYZ").unwrap_err(),
            CoreError::UnknownCurrency("XYZ".to_string())
        );
    }

    #[test]
    fn test_parse() {
        let usd = CurrencyFormatter::new("USD").unwrap();
        assert_eq!(usd.parse("$ 1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(usd.parse("-$ 1,234.56").unwrap(), dec!(-1234.56));

        let eur = CurrencyFormatter::new("EUR").unwrap();
        assert_eq!(eur.parse("1.234,56 €").unwrap(), dec!(1234.56));

        let chf = CurrencyFormatter::new("CHF").unwrap();
        assert_eq!(chf.parse("CHF 1'234.50").unwrap(), dec!(1234.50));

        let jpy = CurrencyFormatter::new("JPY").unwrap();
        assert_eq!(jpy.parse("¥ 1,234,568").unwrap(), dec!(1234568));

        assert!(matches!(
            usd.parse("twelve dollars"),
            Err(CoreError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_format_simple_fallback() {
        assert_eq!(format_simple(dec!(10), "USD"), "$ 10.00");
        assert_eq!(format_simple(dec!(10.5), "XYZ"), "10.50 XYZ");
    }

    proptest! {
        #[test]
        fn prop_parse_inverts_format(
            cents in -1_000_000_000_000i64..1_000_000_000_000,
            idx in 0usize..10,
        ) {
            let currency = &all()[idx];
            let formatter = CurrencyFormatter::new(currency.code).unwrap();
            let amount = Decimal::new(cents, 3);

            let parsed = formatter.parse(&formatter.format(amount)).unwrap();
            let expected = crate::money::round_half_up(amount, currency.decimal_places);
            prop_assert_eq!(parsed, expected);
        }
    }
}
