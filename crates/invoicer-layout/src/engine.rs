//! # Engine
//!
//! The render entry point. Holds the configuration, template manager and
//! tokenizer; each call builds its own cursor, so one engine can serve many
//! invoices.
//!
//! ## Two Paths
//! ```text
//! render_invoice:   Invoice ──► totals ──► header/table/totals ──► Canvas
//!
//! render_template:  Invoice ──► totals ──► context ──► handlebars template
//!                                                         │ render
//!                                                         ▼
//!                   Canvas ◄── BlockRenderer ◄── Tokenizer blocks
//! ```
//!
//! Both paths finish every fallible step (totals, template lookup) before
//! the first canvas call.

use invoicer_core::{format_simple, Invoice, InvoiceTotals, LineItem, Money, Party, Rate};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::blocks::{BlockOutcome, BlockRenderer};
use crate::canvas::Canvas;
use crate::config::RenderConfig;
use crate::error::LayoutResult;
use crate::invoice_layout::{layout_invoice, RenderOutcome};
use crate::template::{TemplateContext, TemplateManager};
use crate::tokenizer::{TagSplitter, Tokenizer};

/// Result of the template path.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateOutcome {
    pub totals: InvoiceTotals,
    pub blocks: BlockOutcome,
}

pub struct Engine {
    config: RenderConfig,
    templates: TemplateManager,
    tokenizer: Box<dyn Tokenizer>,
}

impl Engine {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            templates: TemplateManager::new(),
            tokenizer: Box::new(TagSplitter),
        }
    }

    pub fn with_templates(mut self, templates: TemplateManager) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateManager {
        &self.templates
    }

    /// Lays the invoice out with the built-in header/table/totals design.
    pub fn render_invoice<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        invoice: &Invoice,
    ) -> LayoutResult<RenderOutcome> {
        info!(
            invoice = %invoice.number(),
            items = invoice.items().len(),
            "Rendering invoice"
        );

        let outcome = layout_invoice(canvas, invoice, &self.config)?;

        info!(
            invoice = %invoice.number(),
            pages = outcome.pages,
            page_breaks = outcome.page_breaks,
            gross = %outcome.totals.total_gross,
            "Invoice rendered"
        );
        Ok(outcome)
    }

    /// Renders the named template with the invoice's context and draws the
    /// resulting blocks.
    pub fn render_template<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        invoice: &Invoice,
        template: &str,
    ) -> LayoutResult<TemplateOutcome> {
        let totals = invoice.totals()?;
        let context = template_context(invoice, &totals);
        let html = self.templates.render(template, &context)?;
        let blocks = self.tokenizer.tokenize(&html);

        info!(
            invoice = %invoice.number(),
            template = %template,
            blocks = blocks.len(),
            "Rendering invoice template"
        );

        let drawn = BlockRenderer::new(&self.config).render(canvas, &blocks);

        info!(
            invoice = %invoice.number(),
            pages = drawn.pages,
            blocks_drawn = drawn.blocks_drawn,
            "Template rendered"
        );
        Ok(TemplateOutcome {
            totals,
            blocks: drawn,
        })
    }
}

/// Data for an invoice template.
///
/// Top-level amounts are formatted in the invoice currency, so a plain
/// `{{ total_gross }}` prints `"2.200,00 €"`. The structured parts:
///
/// ```text
/// items[]         position, description, details, quantity, unit_price,
///                 tax, discount, commission (rate labels), subtotal, net,
///                 tax_amount, gross (formatted), amounts (raw Money values)
/// supplier        Party as serialized, plus address_lines
/// customer        same
/// totals          InvoiceTotals as serialized (raw Money values)
/// tax_lines[]     { rate, amount } per breakdown bucket
/// metadata        free-form invoice metadata
/// ```
pub fn template_context(invoice: &Invoice, totals: &InvoiceTotals) -> TemplateContext {
    let money = |m: &Money| format_simple(m.amount(), invoice.currency());
    let mut ctx = TemplateContext::new();
    let mut set = |key: &str, value: Value| {
        ctx.insert(key.to_string(), value);
    };

    set("number", json!(invoice.number()));
    set("issue_date", json!(invoice.issue_date().to_string()));
    set("due_date", json!(invoice.due_date().to_string()));
    set("currency", json!(invoice.currency()));
    set("status", json!(invoice.status().as_str()));
    set("notes", json!(invoice.notes().unwrap_or_default()));
    set("terms", json!(invoice.terms().unwrap_or_default()));
    set("version", json!(invoice.version().unwrap_or_default()));

    for (role, party) in [("supplier", invoice.supplier()), ("customer", invoice.customer())] {
        set(&format!("{role}_name"), json!(party.name));
        set(&format!("{role}_address"), json!(party_address(party)));
        set(
            &format!("{role}_vat_id"),
            json!(party.vat_id.as_deref().unwrap_or_default()),
        );
        set(role, party_value(party));
    }

    set("subtotal", json!(money(&totals.subtotal)));
    set("total_discount", json!(money(&totals.total_discount)));
    set("document_discount", json!(money(&totals.document_discount)));
    set("total_net", json!(money(&totals.total_net)));
    set("total_tax", json!(money(&totals.total_tax)));
    set("total_gross", json!(money(&totals.total_gross)));
    set("total_with_commission", json!(money(&totals.total_with_commission)));
    set(
        "total_with_commission_and_fixed_fee",
        json!(money(&totals.total_with_commission_and_fixed_fee)),
    );

    let breakdown: Vec<String> = totals
        .tax_breakdown
        .iter()
        .map(|(label, tax)| format!("{label}: {}", money(tax)))
        .collect();
    set("tax_breakdown", json!(breakdown.join(", ")));
    let tax_lines: Vec<Value> = totals
        .tax_breakdown
        .iter()
        .map(|(label, tax)| json!({ "rate": label, "amount": money(tax) }))
        .collect();
    set("tax_lines", Value::Array(tax_lines));

    let model = invoice.pricing_model().model();
    let items: Vec<Value> = invoice
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| item_value(i + 1, item, &model.breakdown(item), &money))
        .collect();
    set("items", Value::Array(items));

    set("totals", json!(totals));
    set("metadata", json!(invoice.metadata()));

    ctx
}

fn item_value(
    position: usize,
    item: &LineItem,
    amounts: &invoicer_core::ItemPricing,
    money: &dyn Fn(&Money) -> String,
) -> Value {
    let label = |rate: Option<Rate>| rate.map(|r| r.label()).unwrap_or_default();
    json!({
        "position": position,
        "description": item.description,
        "details": item.details.as_deref().unwrap_or_default(),
        "quantity": item.quantity.normalize().to_string(),
        "unit_price": money(&item.unit_price),
        "tax": label(item.tax),
        "discount": label(item.discount),
        "commission": label(item.commission),
        "subtotal": money(&amounts.subtotal),
        "net": money(&amounts.net),
        "tax_amount": money(&amounts.tax),
        "gross": money(&amounts.gross),
        "amounts": amounts,
    })
}

fn party_value(party: &Party) -> Value {
    let mut value = json!(party);
    if let Value::Object(fields) = &mut value {
        fields.insert("address_lines".to_string(), json!(party.address.lines()));
    }
    value
}

fn party_address(party: &Party) -> String {
    party.address.lines().join(", ")
}

// =============================================================================
// Unit Tests
// =============================================================================
