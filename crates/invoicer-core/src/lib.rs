//! # invoicer-core: Pure Invoice Computation
//!
//! This crate holds the **numbers** of Invoicer: money, currencies, rates,
//! line items and document totals. It performs no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  invoicer-cli (apps/invoicer-cli)               │   │
//! │  │        read invoice JSON ──► totals ──► render ──► output        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    invoicer-layout                              │   │
//! │  │       Canvas, LayoutCursor, invoice table, block renderer       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ invoicer-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │   rate    │  │ line_item │  │  invoice  │  │   │
//! │  │   │ currency  │  │    tax    │  │  pricing  │  │  totals   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DRAWING • DETERMINISTIC                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money`: exact decimal + currency code
//! - [`currency`] - currency table, formatting and parsing
//! - [`rate`] - percent-or-amount rates (tax, discount, commission)
//! - [`tax`] - named VAT rates and a multi-rate calculator
//! - [`line_item`] - one invoice row
//! - [`pricing`] - standard and commission pricing models
//! - [`invoice`] - `Invoice`, parties and the validating builder
//! - [`totals`] - document aggregation
//! - [`error`] - domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use invoicer_core::{Invoice, LineItem, Money, Party};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//!
//! let invoice = Invoice::builder()
//!     .number("INV-001")
//!     .issue_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
//!     .due_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
//!     .supplier(Party::new("Acme"))
//!     .customer(Party::new("Globex"))
//!     .add_item(LineItem::new(
//!         "Support",
//!         Decimal::TWO,
//!         Money::new(Decimal::ONE_HUNDRED, "USD"),
//!         Decimal::TEN,
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let totals = invoice.totals().unwrap();
//! assert_eq!(totals.total_gross.amount(), Decimal::new(220, 0));
//! assert_eq!(totals.total_gross.format().unwrap(), "$ 220.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod currency;
pub mod error;
pub mod invoice;
pub mod line_item;
pub mod money;
pub mod pricing;
pub mod rate;
pub mod tax;
pub mod totals;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::{format_simple, CurrencyFormatter};
pub use error::{CoreError, CoreResult, ValidationError, ValidationResult};
pub use invoice::{Address, Invoice, InvoiceBuilder, InvoiceStatus, Party};
pub use line_item::LineItem;
pub use money::Money;
pub use pricing::{ItemPricing, PricingModel, PricingModelKind};
pub use rate::{Rate, RateKind, TaxSplit};
pub use totals::InvoiceTotals;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Places used when rounding intermediate money results and for the plain
/// `Display` form.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Currency assumed when an invoice does not name one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Flat transfer fee added once per document when enabled.
pub const DEFAULT_FIXED_TRANSFER_FEE: rust_decimal::Decimal = rust_decimal_macros::dec!(15);
