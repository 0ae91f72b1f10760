//! # Invoice Layout
//!
//! Lays one validated [`Invoice`] out onto a [`Canvas`].
//!
//! ## Page Structure
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ INVOICE                        Ref.: INV-001 │  header
//! │                                Date: ...     │
//! │ Supplier                Customer             │
//! │ ┌──────────────────────────────────────────┐ │
//! │ │ Name   Unit price  Qty  Discount Tax Total│ │  table header band
//! │ └──────────────────────────────────────────┘ │
//! │ row ...                                      │  rows (break + header
//! │ row ...                                      │  redraw on overflow)
//! │                      ┌─────────┬─────────┐   │
//! │                      │SUBTOTAL │ $ 200.00│   │  totals (reserved
//! │                      │VAT      │ $ 20.00 │   │  height, own page if
//! │                      │TOTAL    │ $ 220.00│   │  it does not fit)
//! │ notes ...        Payment term: 30 days   │   │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Totals are computed before the first canvas call, so a totals error
//! leaves the canvas untouched.

use invoicer_core::money::to_fixed;
use invoicer_core::{
    format_simple, CurrencyFormatter, Invoice, InvoiceTotals, ItemPricing, LineItem, Money,
    Party, PricingModelKind, Rate, RateKind, MONEY_DECIMAL_PLACES,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::canvas::{Align, Canvas, Cell, FontStyle, RectStyle};
use crate::config::{ColumnOffsets, Labels, RenderConfig};
use crate::cursor::LayoutCursor;
use crate::error::LayoutResult;

const TITLE_HEIGHT: f64 = 10.0;
const TITLE_WIDTH: f64 = 100.0;
const META_LINE_HEIGHT: f64 = 5.0;
const PARTY_NAME_HEIGHT: f64 = 5.0;
const PARTY_LINE_HEIGHT: f64 = 4.0;
const PARTY_WIDTH: f64 = 80.0;
const DETAILS_GAP: f64 = 1.0;
const CELL_PADDING: f64 = 2.0;
const PAYMENT_TERM_WIDTH: f64 = 80.0;
const PAYMENT_TERM_HEIGHT: f64 = 4.0;

/// What a layout run produced besides the canvas calls.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOutcome {
    pub totals: InvoiceTotals,
    pub pages: usize,
    pub page_breaks: usize,
}

/// Lays `invoice` out onto `canvas`, starting a fresh page.
///
/// Fails only if totals cannot be computed; overflow adds pages.
pub fn layout_invoice<C: Canvas + ?Sized>(
    canvas: &mut C,
    invoice: &Invoice,
    config: &RenderConfig,
) -> LayoutResult<RenderOutcome> {
    let totals = invoice.totals()?;
    let discount_percent = invoice.document_discount_percent()?;

    canvas.add_page();

    let mut painter = InvoicePainter {
        canvas,
        config,
        invoice,
        cursor: LayoutCursor::new(config.geometry),
        amounts: Amounts::new(invoice.currency()),
        columns: table_columns(invoice, &config.geometry.columns),
    };

    painter.header();
    painter.table();
    painter.totals(&totals, discount_percent);

    Ok(RenderOutcome {
        pages: painter.cursor.page(),
        page_breaks: painter.cursor.page_breaks(),
        totals,
    })
}

// =============================================================================
// Amount Formatting
// =============================================================================

/// Formats amounts in the invoice currency, falling back to
/// `"<amount> <CODE>"` when the currency table has no entry.
struct Amounts<'a> {
    code: &'a str,
}

impl<'a> Amounts<'a> {
    fn new(code: &'a str) -> Self {
        if let Err(e) = CurrencyFormatter::new(code) {
            warn!(currency = %code, error = %e, "Falling back to plain amount display");
        }
        Self { code }
    }

    fn format(&self, amount: Decimal) -> String {
        format_simple(amount, self.code)
    }

    /// `"10%"` for percentages, the formatted amount otherwise.
    fn rate(&self, rate: &Rate) -> String {
        match rate.kind {
            RateKind::Percent => rate.label(),
            RateKind::Amount => self.format(rate.value),
        }
    }

    /// Second line of a rate cell: the resulting amount for a percentage,
    /// the share of `base` for a fixed amount (`"12.50 %"`).
    fn rate_detail(&self, rate: &Rate, amount: Decimal, base: Decimal) -> String {
        match rate.kind {
            RateKind::Percent => self.format(amount),
            RateKind::Amount => {
                // zero base reads as 0%
                let percent = rate.percent_of(base).unwrap_or(Decimal::ZERO);
                format!("{} %", to_fixed(percent, 2))
            }
        }
    }
}

// =============================================================================
// Table Columns
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Name,
    UnitPrice,
    Quantity,
    AdSpend,
    Commission,
    Discount,
    Tax,
    Total,
}

impl ColumnKind {
    fn label(self, labels: &Labels) -> &str {
        match self {
            ColumnKind::Name => &labels.item_name,
            ColumnKind::UnitPrice => &labels.unit_price,
            ColumnKind::Quantity => &labels.quantity,
            ColumnKind::AdSpend => &labels.ad_spend,
            ColumnKind::Commission => &labels.commission,
            ColumnKind::Discount => &labels.discount,
            ColumnKind::Tax => &labels.tax,
            ColumnKind::Total => &labels.item_total,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Column {
    kind: ColumnKind,
    x: f64,
    width: f64,
}

/// Columns for the invoice's pricing model. Each column runs to the start of
/// the next; the last one runs to the table's right edge.
fn table_columns(invoice: &Invoice, offsets: &ColumnOffsets) -> Vec<Column> {
    let mut picked = vec![(ColumnKind::Name, offsets.name)];
    match invoice.pricing_model() {
        PricingModelKind::Standard => {
            picked.push((ColumnKind::UnitPrice, offsets.unit_price));
            picked.push((ColumnKind::Quantity, offsets.quantity));
            if invoice.items().iter().any(|item| item.commission.is_some()) {
                picked.push((ColumnKind::Commission, offsets.commission));
            }
        }
        PricingModelKind::Commission => {
            picked.push((ColumnKind::AdSpend, offsets.unit_price));
            picked.push((ColumnKind::Commission, offsets.commission));
        }
    }
    picked.push((ColumnKind::Discount, offsets.discount));
    picked.push((ColumnKind::Tax, offsets.tax));
    picked.push((ColumnKind::Total, offsets.total));

    let ends: Vec<f64> = picked
        .iter()
        .skip(1)
        .map(|(_, x)| *x)
        .chain(std::iter::once(offsets.right_edge))
        .collect();

    picked
        .into_iter()
        .zip(ends)
        .map(|((kind, x), end)| Column {
            kind,
            x,
            width: end - x,
        })
        .collect()
}

enum CellText {
    Single(String),
    /// Title over a smaller grey description, each half the row height.
    Stacked(String, String),
}

// =============================================================================
// Painter
// =============================================================================

struct InvoicePainter<'a, C: Canvas + ?Sized> {
    canvas: &'a mut C,
    config: &'a RenderConfig,
    invoice: &'a Invoice,
    cursor: LayoutCursor,
    amounts: Amounts<'a>,
    columns: Vec<Column>,
}

impl<C: Canvas + ?Sized> InvoicePainter<'_, C> {
    fn regular(&mut self, size: f64) {
        self.canvas
            .set_font(&self.config.font, FontStyle::Regular, size);
    }

    fn bold(&mut self, size: f64) {
        self.canvas
            .set_font(&self.config.bold_font, FontStyle::Bold, size);
    }

    fn base_text(&mut self) {
        self.canvas.set_text_color(self.config.colors.base_text);
    }

    fn grey_text(&mut self) {
        self.canvas.set_text_color(self.config.colors.grey_text);
    }

    fn amount_column_width(&self) -> f64 {
        let g = &self.config.geometry;
        g.page_width - g.margin_right - g.totals_label_x
    }

    // -------------------------------------------------------------------------
    // Header
    // -------------------------------------------------------------------------

    fn header(&mut self) {
        let g = self.config.geometry;
        let labels = &self.config.labels;
        let top = self.cursor.y();

        let mut meta = vec![
            format!("{}: {}", labels.reference, self.invoice.number()),
            format!("{}: {}", labels.date, self.invoice.issue_date()),
            format!("{}: {}", labels.due_date, self.invoice.due_date()),
        ];
        if let Some(version) = self.invoice.version() {
            meta.push(format!("{}: {}", labels.version, version));
        }
        let title = labels.title.to_string();

        self.cursor.begin_block(&mut *self.canvas, TITLE_HEIGHT);
        self.base_text();
        self.bold(g.title_font_size);
        self.canvas.set_position(g.margin_left, top);
        self.canvas.draw_cell(Cell::new(TITLE_WIDTH, TITLE_HEIGHT, &title));

        self.regular(g.base_font_size);
        let meta_width = self.amount_column_width();
        let mut meta_y = top;
        for line in &meta {
            self.canvas.set_position(g.totals_label_x, meta_y);
            self.canvas
                .draw_cell(Cell::new(meta_width, META_LINE_HEIGHT, line).align(Align::Right));
            meta_y += META_LINE_HEIGHT;
        }

        let parties_top = (top + TITLE_HEIGHT).max(meta_y) + g.table_gap;
        let supplier_bottom = self.party(self.invoice.supplier(), g.margin_left, parties_top);
        let customer_bottom = self.party(self.invoice.customer(), g.totals_label_x, parties_top);

        self.cursor
            .end_block(&mut *self.canvas, supplier_bottom.max(customer_bottom));
    }

    /// Draws a party block, returning its bottom edge.
    fn party(&mut self, party: &Party, x: f64, top: f64) -> f64 {
        let g = self.config.geometry;
        let mut y = top;

        self.bold(g.base_font_size);
        self.canvas.set_position(x, y);
        self.canvas
            .draw_cell(Cell::new(PARTY_WIDTH, PARTY_NAME_HEIGHT, &party.name));
        y += PARTY_NAME_HEIGHT;

        let mut lines = party.address.lines();
        if let Some(email) = &party.email {
            lines.push(email.clone());
        }
        if let Some(vat_id) = &party.vat_id {
            lines.push(format!("{}: {}", self.config.labels.vat_id, vat_id));
        }

        self.regular(g.base_font_size);
        for line in &lines {
            self.canvas.set_position(x, y);
            self.canvas
                .draw_cell(Cell::new(PARTY_WIDTH, PARTY_LINE_HEIGHT, line));
            y += PARTY_LINE_HEIGHT;
        }
        y
    }

    // -------------------------------------------------------------------------
    // Item Table
    // -------------------------------------------------------------------------

    fn table(&mut self) {
        let g = self.config.geometry;

        self.cursor.advance(g.table_gap);
        self.cursor
            .begin_block(&mut *self.canvas, g.table_header_height + g.header_row_gap);
        self.table_header();
        let bottom = self.cursor.y();
        self.cursor.end_block(&mut *self.canvas, bottom);

        let model = self.invoice.pricing_model().model();
        for item in self.invoice.items() {
            let pricing = model.breakdown(item);
            self.row(item, &pricing);
        }
    }

    /// Draws the header band at the cursor and moves the cursor below it.
    fn table_header(&mut self) {
        let g = self.config.geometry;
        let top = self.cursor.y();
        let left = g.columns.name;

        self.bold(g.base_font_size);
        self.base_text();
        self.canvas.set_fill_color(self.config.colors.grey_bg);
        self.canvas.draw_rect(
            left,
            top,
            g.columns.right_edge - left,
            g.table_header_height,
            RectStyle::Fill,
        );

        for column in self.columns.clone() {
            let label = column.kind.label(&self.config.labels).to_string();
            self.canvas.set_position(column.x, top);
            self.canvas
                .draw_cell(Cell::new(column.width, g.table_header_height, &label));
        }

        self.cursor
            .advance(g.table_header_height + g.header_row_gap);
    }

    fn name_width(&self) -> f64 {
        self.columns
            .iter()
            .find(|c| c.kind == ColumnKind::Name)
            .map_or(0.0, |c| c.width)
    }

    /// Height of the name cell: wrapped title plus wrapped details.
    fn row_height(&mut self, item: &LineItem) -> f64 {
        let g = self.config.geometry;
        let width = self.name_width();

        self.regular(g.base_font_size);
        let mut height = self
            .canvas
            .wrapped_height(&item.description, width, g.row_line_height);

        if let Some(details) = item.details.as_deref().filter(|d| !d.trim().is_empty()) {
            self.regular(g.small_font_size);
            height += DETAILS_GAP
                + self
                    .canvas
                    .wrapped_height(details, width, g.row_line_height);
        }

        height.max(g.min_row_height)
    }

    fn row(&mut self, item: &LineItem, pricing: &ItemPricing) {
        let g = self.config.geometry;
        let height = self.row_height(item);

        if self.cursor.begin_block(&mut *self.canvas, height).is_new_page() {
            debug!(
                invoice = %self.invoice.number(),
                page = self.cursor.page(),
                item = %item.description,
                "Redrawing table header"
            );
            self.table_header();
        }
        let top = self.cursor.y();

        for column in self.columns.clone() {
            self.canvas.set_position(column.x, top);
            if column.kind == ColumnKind::Name {
                self.name_cell(item, column.width);
                continue;
            }

            self.regular(g.base_font_size);
            self.base_text();
            match self.cell_text(column.kind, item, pricing) {
                CellText::Single(text) => {
                    self.canvas.draw_cell(Cell::new(column.width, height, &text));
                }
                CellText::Stacked(title, description) => {
                    let half = height / 2.0;
                    self.canvas
                        .draw_cell(Cell::new(column.width, half, &title).align(Align::LeftBottom));
                    self.canvas.set_position(column.x, top + half);
                    self.regular(g.small_font_size);
                    self.grey_text();
                    self.canvas.draw_cell(
                        Cell::new(column.width, half, &description).align(Align::LeftTop),
                    );
                }
            }
        }

        self.regular(g.base_font_size);
        self.base_text();
        self.cursor
            .end_block(&mut *self.canvas, top + height + g.row_spacing);
    }

    fn name_cell(&mut self, item: &LineItem, width: f64) {
        let g = self.config.geometry;

        self.regular(g.base_font_size);
        self.base_text();
        self.canvas
            .draw_wrapped_text(width, g.row_line_height, &item.description);

        if let Some(details) = item.details.as_deref().filter(|d| !d.trim().is_empty()) {
            let (x, y) = self.canvas.position();
            self.canvas.set_position(x, y + DETAILS_GAP);
            self.regular(g.small_font_size);
            self.grey_text();
            self.canvas
                .draw_wrapped_text(width, g.row_line_height, details);
        }
    }

    fn cell_text(&self, kind: ColumnKind, item: &LineItem, pricing: &ItemPricing) -> CellText {
        let stacked = |rate: Option<Rate>, amount: &Money, base: &Money| match rate {
            Some(rate) => CellText::Stacked(
                self.amounts.rate(&rate),
                self.amounts
                    .rate_detail(&rate, amount.amount(), base.amount()),
            ),
            None => CellText::Single("-".to_string()),
        };

        match kind {
            ColumnKind::Name => CellText::Single(item.description.clone()),
            ColumnKind::UnitPrice | ColumnKind::AdSpend => {
                CellText::Single(self.amounts.format(item.unit_price.amount()))
            }
            ColumnKind::Quantity => CellText::Single(item.quantity.normalize().to_string()),
            ColumnKind::Commission => {
                stacked(item.commission, &pricing.commission, &pricing.subtotal)
            }
            ColumnKind::Discount => stacked(item.discount, &pricing.discount, &pricing.subtotal),
            ColumnKind::Tax => stacked(item.tax, &pricing.tax, &pricing.net),
            ColumnKind::Total => {
                let total = match self.invoice.pricing_model() {
                    PricingModelKind::Standard => &pricing.gross,
                    PricingModelKind::Commission => &pricing.total_with_commission,
                };
                CellText::Single(self.amounts.format(total.amount()))
            }
        }
    }

    // -------------------------------------------------------------------------
    // Totals and Trailer
    // -------------------------------------------------------------------------

    fn totals(&mut self, totals: &InvoiceTotals, discount_percent: Option<Decimal>) {
        let g = self.config.geometry;
        let labels = self.config.labels.clone();
        let document_discount = self.invoice.document_discount();

        self.cursor
            .begin_block(&mut *self.canvas, g.trailer_height(document_discount.is_some()));
        let mut y = self.cursor.y() + g.table_gap;

        self.regular(g.large_font_size);
        self.base_text();

        let legacy = self.invoice.pricing_model() == PricingModelKind::Commission;
        let subtotal = if legacy {
            &totals.total_with_commission
        } else {
            &totals.net_before_document_discount
        };
        y = self.totals_row(y, &labels.subtotal, &self.amounts.format(subtotal.amount()));

        if let Some(discount) = document_discount {
            let description = self.discount_description(&discount, totals, discount_percent);
            y = self.discount_row(y, &labels.total_discounted, &description, totals);
        }

        y = self.totals_row(y, &labels.tax_total, &self.amounts.format(totals.total_tax.amount()));

        if legacy {
            let fee = self
                .invoice
                .fixed_fee()
                .map_or_else(|| "-".to_string(), |fee| self.amounts.format(fee.amount()));
            y = self.totals_row(y, &labels.fixed_fee, &fee);

            self.bold(g.large_font_size);
            let total = self
                .amounts
                .format(totals.total_with_commission_and_fixed_fee.amount());
            y = self.totals_row(y, &labels.total, &total);
        } else {
            self.bold(g.large_font_size);
            let total = self.amounts.format(totals.total_gross.amount());
            y = self.totals_row(y, &labels.total_with_tax, &total);
        }
        self.regular(g.large_font_size);

        let bottom = self.trailer_lines(y);
        self.cursor.end_block(&mut *self.canvas, bottom);
    }

    /// `"-10 % / -$ 20.00"` for percentages, `"-$ 20.00 / -10.00 %"` for
    /// amounts.
    fn discount_description(
        &self,
        discount: &Rate,
        totals: &InvoiceTotals,
        percent: Option<Decimal>,
    ) -> String {
        match discount.kind {
            RateKind::Percent => format!(
                "-{} % / -{}",
                discount.value,
                self.amounts.format(totals.document_discount.amount())
            ),
            RateKind::Amount => format!(
                "-{} / -{} %",
                self.amounts.format(discount.value),
                to_fixed(percent.unwrap_or(Decimal::ZERO), MONEY_DECIMAL_PLACES)
            ),
        }
    }

    /// Label cell on dark, value cell on grey. Returns the row's bottom.
    fn totals_row(&mut self, y: f64, label: &str, value: &str) -> f64 {
        let g = self.config.geometry;
        let height = g.totals_row_height;
        let width = g.totals_column_width;

        self.canvas.set_fill_color(self.config.colors.dark_bg);
        self.canvas
            .draw_rect(g.totals_label_x, y, width, height, RectStyle::Fill);
        self.canvas.set_position(g.totals_label_x, y);
        self.canvas
            .draw_cell(Cell::new(width - CELL_PADDING, height, label).align(Align::Right));

        self.canvas.set_fill_color(self.config.colors.grey_bg);
        self.canvas
            .draw_rect(g.totals_value_x, y, width, height, RectStyle::Fill);
        self.canvas.set_position(g.totals_value_x + CELL_PADDING, y);
        self.canvas
            .draw_cell(Cell::new(width - CELL_PADDING, height, value));

        y + height
    }

    fn discount_row(
        &mut self,
        y: f64,
        label: &str,
        description: &str,
        totals: &InvoiceTotals,
    ) -> f64 {
        let g = self.config.geometry;
        let height = g.discount_row_height;
        let half = height / 2.0;
        let width = g.totals_column_width;

        self.canvas.set_fill_color(self.config.colors.dark_bg);
        self.canvas
            .draw_rect(g.totals_label_x, y, width, height, RectStyle::Fill);
        self.canvas.set_position(g.totals_label_x, y);
        self.canvas.draw_cell(
            Cell::new(width - CELL_PADDING, half, label).align(Align::RightBottom),
        );

        self.regular(g.base_font_size);
        self.grey_text();
        self.canvas.set_position(g.totals_label_x, y + half);
        self.canvas.draw_cell(
            Cell::new(width - CELL_PADDING, half, description).align(Align::RightTop),
        );
        self.regular(g.large_font_size);
        self.base_text();

        let value = self.amounts.format(totals.total_net.amount());
        self.canvas.set_fill_color(self.config.colors.grey_bg);
        self.canvas
            .draw_rect(g.totals_value_x, y, width, height, RectStyle::Fill);
        self.canvas.set_position(g.totals_value_x + CELL_PADDING, y);
        self.canvas
            .draw_cell(Cell::new(width - CELL_PADDING, height, &value));

        y + height
    }

    /// Notes on the left and the payment term on the right, both starting
    /// below the totals. Returns the lower of their bottoms.
    fn trailer_lines(&mut self, totals_bottom: f64) -> f64 {
        let g = self.config.geometry;
        let mut bottom = totals_bottom;

        if let Some(notes) = self.invoice.notes() {
            let top = totals_bottom + g.table_gap;
            self.regular(g.notes_font_size);
            self.base_text();
            self.canvas.set_position(g.margin_left, top);
            let line_height = self.canvas.font_line_height();
            let height = self
                .canvas
                .draw_wrapped_text(g.notes_width, line_height, notes);
            bottom = bottom.max(top + height);
        }

        if let Some(term) = self.invoice.terms() {
            let top = totals_bottom + g.payment_term_offset;
            let text = format!("{}: {}", self.config.labels.payment_term, term);
            self.bold(g.large_font_size);
            self.canvas.set_position(g.totals_label_x, top);
            self.canvas.draw_cell(
                Cell::new(PAYMENT_TERM_WIDTH, PAYMENT_TERM_HEIGHT, &text).align(Align::Right),
            );
            bottom = bottom.max(top + PAYMENT_TERM_HEIGHT);
        }

        bottom
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
