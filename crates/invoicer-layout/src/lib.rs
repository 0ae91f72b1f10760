//! # invoicer-layout: Page Layout Engine
//!
//! Turns a validated [`Invoice`](invoicer_core::Invoice) into drawing calls on
//! a [`Canvas`], paginating as it goes.
//!
//! ## Render Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Render Flow                                    │
//! │                                                                         │
//! │   Invoice ──► totals (invoicer-core) ──┐                                │
//! │                                        ▼                                │
//! │   RenderConfig ──────────────────► Engine                               │
//! │                                        │                                │
//! │                  ┌─────────────────────┴──────────────────┐             │
//! │                  ▼                                        ▼             │
//! │          invoice_layout                       template ► tokenizer      │
//! │      header / table / totals                        ► BlockRenderer     │
//! │                  │                                        │             │
//! │                  └──────────────► LayoutCursor ◄──────────┘             │
//! │                                   (page breaks)                         │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                              Canvas (RecordingCanvas)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`canvas`] - drawing primitives the engine drives
//! - [`recording`] - a canvas that records calls as a page sequence
//! - [`cursor`] - draw position and page-break state machine
//! - [`config`] - fonts, colours, labels and geometry (TOML + env)
//! - [`invoice_layout`] - the built-in invoice design
//! - [`blocks`] - tagged text block renderer
//! - [`template`] - template sources and the handlebars registry
//! - [`helpers`] - formatMoney, formatDate and the other template helpers
//! - [`tokenizer`] - HTML-ish text to blocks
//! - [`engine`] - the render entry point
//!
//! ## Example Usage
//!
//! ```rust
//! use invoicer_core::{Invoice, LineItem, Money, Party};
//! use invoicer_layout::{Engine, RecordingCanvas, RenderConfig};
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
//! let engine = Engine::new(RenderConfig::DEFAULT);
//! let mut canvas = RecordingCanvas::new((10.0, 20.0));
//! let outcome = engine.render_invoice(&mut canvas, &invoice).unwrap();
//!
//! assert_eq!(outcome.pages, 1);
//! assert!(canvas.pages()[0].contains_text("$ 220.00"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod blocks;
pub mod canvas;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod invoice_layout;
pub mod recording;
pub mod template;
pub mod tokenizer;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use blocks::{Block, BlockOutcome, BlockRenderer, BlockStyle};
pub use canvas::{Align, Canvas, Cell, FontStyle, RectStyle, Rgb};
pub use config::{ColumnOffsets, Labels, PageGeometry, Palette, RenderConfig};
pub use cursor::{LayoutCursor, PagerState, Placement};
pub use engine::{template_context, Engine, TemplateOutcome};
pub use error::{LayoutError, LayoutResult};
pub use invoice_layout::{layout_invoice, RenderOutcome};
pub use recording::{Command, RecordedPage, RecordingCanvas, RenderedDocument};
pub use template::{FsSource, MemorySource, TemplateContext, TemplateManager, TemplateSource};
pub use tokenizer::{TagSplitter, Tokenizer};
