//! # Invoice
//!
//! The invoice document, its parties and the builder that validates it.
//!
//! ## Lifecycle
//! ```text
//!  InvoiceBuilder (mutable, unvalidated)
//!      │  .number() .issue_date() .add_item() ...   no checks here
//!      ▼
//!  build() ──► ValidationError?  ──► caller
//!      │
//!      ▼
//!  Invoice (immutable)  ──► totals() / layout, any number of times
//! ```
//!
//! Totals are never stored on the invoice; see [`crate::totals`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::{ValidationError, ValidationResult};
use crate::line_item::LineItem;
use crate::money::Money;
use crate::pricing::PricingModelKind;
use crate::rate::Rate;
use crate::DEFAULT_CURRENCY;

// =============================================================================
// Parties
// =============================================================================

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// True if nothing printable is set. `state` alone does not count.
    pub fn is_empty(&self) -> bool {
        self.street.is_empty()
            && self.city.is_empty()
            && self.postal_code.is_empty()
            && self.country.is_empty()
    }

    /// Display lines: street, `"<postal> <city>, <state>"`, country.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        if !self.street.is_empty() {
            lines.push(self.street.clone());
        }

        let mut city_line = String::new();
        if !self.postal_code.is_empty() {
            city_line.push_str(&self.postal_code);
            city_line.push(' ');
        }
        city_line.push_str(&self.city);
        if !self.state.is_empty() {
            city_line.push_str(", ");
            city_line.push_str(&self.state);
        }
        if !city_line.is_empty() {
            lines.push(city_line);
        }

        if !self.country.is_empty() {
            lines.push(self.country.clone());
        }
        lines
    }
}

/// Supplier or customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Party {
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub email: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub phone: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub vat_id: Option<String>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub iban: Option<String>,
}

impl Party {
    pub fn new(name: impl Into<String>) -> Self {
        Party {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = address;
        self
    }

    pub fn with_vat_id(mut self, vat_id: impl Into<String>) -> Self {
        self.vat_id = Some(vat_id.into());
        self
    }

    /// `role` names the party in the error, e.g. `"supplier"`.
    pub fn validate(&self, role: &str) -> ValidationResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: format!("{role} name"),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Status
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Issued,
    Paid,
    Cancelled,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Cancelled => "cancelled",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A validated, immutable invoice.
///
/// Only obtainable through [`InvoiceBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Invoice {
    number: String,
    #[ts(as = "String")]
    issue_date: NaiveDate,
    #[ts(as = "String")]
    due_date: NaiveDate,
    currency: String,
    country_code: Option<String>,
    supplier: Party,
    customer: Party,
    items: Vec<LineItem>,
    notes: Option<String>,
    terms: Option<String>,
    version: Option<String>,
    status: InvoiceStatus,
    document_discount: Option<Rate>,
    default_tax: Option<Rate>,
    pricing_model: PricingModelKind,
    fixed_fee: Option<Money>,
    #[ts(type = "Record<string, unknown>")]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Invoice {
    pub fn builder() -> InvoiceBuilder {
        InvoiceBuilder::new()
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn country_code(&self) -> Option<&str> {
        self.country_code.as_deref()
    }

    pub fn supplier(&self) -> &Party {
        &self.supplier
    }

    pub fn customer(&self) -> &Party {
        &self.customer
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Payment terms, printed as the payment-term line.
    pub fn terms(&self) -> Option<&str> {
        self.terms.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn document_discount(&self) -> Option<Rate> {
        self.document_discount
    }

    /// Tax applied to items that were added without one.
    pub fn default_tax(&self) -> Option<Rate> {
        self.default_tax
    }

    pub fn pricing_model(&self) -> PricingModelKind {
        self.pricing_model
    }

    pub fn fixed_fee(&self) -> Option<&Money> {
        self.fixed_fee.as_ref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Accumulates invoice fields; all validation happens in [`build`](Self::build).
///
/// Also the JSON input shape:
/// ```json
/// {
///   "number": "INV-001",
///   "issue_date": "2024-03-01",
///   "due_date": "2024-03-31",
///   "currency": "USD",
///   "supplier": { "name": "Acme" },
///   "customer": { "name": "Globex" },
///   "items": [ ... ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvoiceBuilder {
    number: String,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    currency: String,
    country_code: Option<String>,
    supplier: Party,
    customer: Party,
    items: Vec<LineItem>,
    notes: Option<String>,
    terms: Option<String>,
    version: Option<String>,
    status: InvoiceStatus,
    document_discount: Option<Rate>,
    default_tax: Option<Rate>,
    pricing_model: PricingModelKind,
    /// Amount in the invoice currency.
    fixed_fee: Option<Decimal>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl Default for InvoiceBuilder {
    fn default() -> Self {
        InvoiceBuilder {
            number: String::new(),
            issue_date: None,
            due_date: None,
            currency: DEFAULT_CURRENCY.to_string(),
            country_code: None,
            supplier: Party::default(),
            customer: Party::default(),
            items: Vec::new(),
            notes: None,
            terms: None,
            version: None,
            status: InvoiceStatus::Draft,
            document_discount: None,
            default_tax: None,
            pricing_model: PricingModelKind::Standard,
            fixed_fee: None,
            metadata: BTreeMap::new(),
        }
    }
}

impl InvoiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn currency(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    pub fn country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub fn supplier(mut self, supplier: Party) -> Self {
        self.supplier = supplier;
        self
    }

    pub fn customer(mut self, customer: Party) -> Self {
        self.customer = customer;
        self
    }

    pub fn add_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn terms(mut self, terms: impl Into<String>) -> Self {
        self.terms = Some(terms.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn document_discount(mut self, discount: Rate) -> Self {
        self.document_discount = Some(discount);
        self
    }

    /// Tax for items without their own rate, including items built with
    /// [`LineItem::without_tax`]. Resolved in [`build`](Self::build).
    pub fn default_tax(mut self, tax: Rate) -> Self {
        self.default_tax = Some(tax);
        self
    }

    pub fn pricing_model(mut self, model: PricingModelKind) -> Self {
        self.pricing_model = model;
        self
    }

    /// Adds the standard fixed transfer fee once per document.
    pub fn with_fixed_fee(self) -> Self {
        self.fixed_fee(crate::DEFAULT_FIXED_TRANSFER_FEE)
    }

    pub fn fixed_fee(mut self, amount: Decimal) -> Self {
        self.fixed_fee = Some(amount);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Validates every field and produces the immutable invoice.
    ///
    /// ## Check Order
    /// 1. number, issue date, due date, date ordering
    /// 2. currency code format
    /// 3. supplier, customer
    /// 4. at least one item; each item valid and priced in the invoice currency
    /// 5. document discount, default tax and fixed fee signs
    ///
    /// Items without a tax rate take the default tax, if one is set.
    pub fn build(self) -> ValidationResult<Invoice> {
        let number = self.number.trim().to_string();
        if number.is_empty() {
            return Err(ValidationError::Required {
                field: "invoice number".to_string(),
            });
        }

        let issue_date = self.issue_date.ok_or_else(|| ValidationError::Required {
            field: "issue date".to_string(),
        })?;
        let due_date = self.due_date.ok_or_else(|| ValidationError::Required {
            field: "due date".to_string(),
        })?;
        if due_date < issue_date {
            return Err(ValidationError::DueDateBeforeIssue {
                issue: issue_date.to_string(),
                due: due_date.to_string(),
            });
        }

        let currency = self.currency.trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency".to_string(),
                reason: format!("'{}' is not a three-letter code", self.currency),
            });
        }

        self.supplier.validate("supplier")?;
        self.customer.validate("customer")?;

        if self.items.is_empty() {
            return Err(ValidationError::NoLineItems);
        }
        for item in &self.items {
            item.validate()?;
            if item.currency() != currency {
                return Err(ValidationError::CurrencyMismatch {
                    field: format!("line item '{}' unit price", item.description),
                    expected: currency,
                    found: item.currency().to_string(),
                });
            }
        }

        if let Some(discount) = &self.document_discount {
            if discount.value.is_sign_negative() && !discount.value.is_zero() {
                return Err(ValidationError::Negative {
                    field: "document discount".to_string(),
                });
            }
        }
        if let Some(tax) = &self.default_tax {
            if tax.value.is_sign_negative() && !tax.value.is_zero() {
                return Err(ValidationError::Negative {
                    field: "default tax".to_string(),
                });
            }
        }
        if let Some(fee) = self.fixed_fee {
            if fee.is_sign_negative() && !fee.is_zero() {
                return Err(ValidationError::Negative {
                    field: "fixed fee".to_string(),
                });
            }
        }

        let fixed_fee = self.fixed_fee.map(|fee| Money::new(fee, currency.as_str()));
        let default_tax = self.default_tax;
        let items = self
            .items
            .into_iter()
            .map(|mut item| {
                if item.tax.is_none() {
                    item.tax = default_tax;
                }
                item
            })
            .collect();

        Ok(Invoice {
            number,
            issue_date,
            due_date,
            currency,
            country_code: self.country_code,
            supplier: self.supplier,
            customer: self.customer,
            items,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            terms: self.terms.filter(|t| !t.trim().is_empty()),
            version: self.version.filter(|v| !v.trim().is_empty()),
            status: self.status,
            document_discount: self.document_discount,
            default_tax,
            pricing_model: self.pricing_model,
            fixed_fee,
            metadata: self.metadata,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
