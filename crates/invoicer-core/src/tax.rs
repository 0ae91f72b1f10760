//! # Tax Module
//!
//! Named VAT rates for common jurisdictions and a calculator for stacking
//! several rates on one net amount.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::round2;
use crate::rate::{Rate, TaxSplit};
use crate::error::CoreResult;

/// Kind of VAT rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TaxCategory {
    Standard,
    Reduced,
    Zero,
    Exempt,
}

/// A named percentage tax rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate {
    pub name: String,
    #[ts(as = "String")]
    pub percentage: Decimal,
    pub category: TaxCategory,
}

impl TaxRate {
    pub fn new(name: impl Into<String>, percentage: Decimal, category: TaxCategory) -> Self {
        TaxRate {
            name: name.into(),
            percentage,
            category,
        }
    }

    /// Tax on `net`, rounded to 2 places.
    pub fn calculate(&self, net: Decimal) -> Decimal {
        self.as_rate().calculate(net)
    }

    pub fn add_to_amount(&self, net: Decimal) -> Decimal {
        self.as_rate().add_to_amount(net)
    }

    pub fn extract_from_gross(&self, gross: Decimal) -> CoreResult<TaxSplit> {
        self.as_rate().extract_from_gross(gross)
    }

    /// The percent `Rate` for attaching to a line item.
    pub fn as_rate(&self) -> Rate {
        Rate::percent(self.percentage)
    }
}

impl From<&TaxRate> for Rate {
    fn from(rate: &TaxRate) -> Self {
        rate.as_rate()
    }
}

// =============================================================================
// Catalogue
// =============================================================================

const CATALOGUE: &[(&str, &str, Decimal, TaxCategory)] = &[
    ("CH_STANDARD", "Swiss Standard VAT", dec!(8.1), TaxCategory::Standard),
    ("CH_REDUCED", "Swiss Reduced VAT", dec!(2.6), TaxCategory::Reduced),
    ("CH_HOTEL", "Swiss Hotel VAT", dec!(3.8), TaxCategory::Reduced),
    ("DE_STANDARD", "German Standard VAT", dec!(19), TaxCategory::Standard),
    ("DE_REDUCED", "German Reduced VAT", dec!(7), TaxCategory::Reduced),
    ("FR_STANDARD", "French Standard VAT", dec!(20), TaxCategory::Standard),
    ("FR_REDUCED", "French Reduced VAT", dec!(5.5), TaxCategory::Reduced),
    ("UK_STANDARD", "UK Standard VAT", dec!(20), TaxCategory::Standard),
    ("UK_REDUCED", "UK Reduced VAT", dec!(5), TaxCategory::Reduced),
    ("US_ZERO", "US No Federal VAT", dec!(0), TaxCategory::Zero),
    ("EU_EXEMPT", "EU VAT Exempt", dec!(0), TaxCategory::Exempt),
];

/// Looks up a catalogue rate by code, e.g. `"CH_STANDARD"`.
pub fn rate(code: &str) -> Option<TaxRate> {
    CATALOGUE
        .iter()
        .find(|(c, ..)| *c == code)
        .map(|(_, name, pct, category)| TaxRate::new(*name, *pct, *category))
}

/// All catalogue codes in declaration order.
pub fn codes() -> impl Iterator<Item = &'static str> {
    CATALOGUE.iter().map(|(code, ..)| *code)
}

// =============================================================================
// Calculator
// =============================================================================

/// Applies several tax rates to the same net amount.
///
/// Each rate's tax is rounded on its own before summing.
#[derive(Debug, Clone, Default)]
pub struct TaxCalculator {
    rates: Vec<TaxRate>,
}

impl TaxCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rate(mut self, rate: TaxRate) -> Self {
        self.rates.push(rate);
        self
    }

    pub fn rates(&self) -> &[TaxRate] {
        &self.rates
    }

    pub fn calculate_tax(&self, net: Decimal) -> Decimal {
        let total: Decimal = self.rates.iter().map(|r| r.calculate(net)).sum();
        round2(total)
    }

    pub fn calculate_gross(&self, net: Decimal) -> Decimal {
        net + self.calculate_tax(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_lookup() {
        let ch = rate("CH_STANDARD").unwrap();
        assert_eq!(ch.percentage, dec!(8.1));
        assert_eq!(ch.category, TaxCategory::Standard);
        assert!(rate("XX_NONE").is_none());
        assert_eq!(codes().count(), 11);
    }

    #[test]
    fn test_tax_rate_math() {
        let de = rate("DE_STANDARD").unwrap();
        assert_eq!(de.calculate(dec!(100)), dec!(19));
        assert_eq!(de.add_to_amount(dec!(100)), dec!(119));
        assert_eq!(de.extract_from_gross(dec!(119)).unwrap().tax, dec!(19));
        assert_eq!(Rate::from(&de), Rate::percent(dec!(19)));
    }

    #[test]
    fn test_calculator_stacks_rates() {
        let calc = TaxCalculator::new()
            .add_rate(rate("CH_STANDARD").unwrap())
            .add_rate(rate("CH_REDUCED").unwrap());

        // 8.1% of 33.33 = 2.69973 → 2.70, 2.6% = 0.86658 → 0.87
        assert_eq!(calc.calculate_tax(dec!(33.33)), dec!(3.57));
        assert_eq!(calc.calculate_gross(dec!(33.33)), dec!(36.90));
        assert_eq!(TaxCalculator::new().calculate_tax(dec!(50)), Decimal::ZERO);
    }
}
