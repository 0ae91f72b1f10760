//! # Render Configuration
//!
//! Fonts, colours, label strings and page geometry for invoice layout.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     INVOICER_FONT=Times                                                │
//! │     INVOICER_BOLD_FONT=Times-Bold                                      │
//! │     INVOICER_PAGE_LIMIT=250                                            │
//! │     INVOICER_TITLE=RECHNUNG                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     explicit --config path, or                                         │
//! │     ~/.config/invoicer/invoicer.toml (Linux)                           │
//! │     ~/Library/Application Support/com.invoicer.invoicer/... (macOS)    │
//! │                                                                         │
//! │  3. RenderConfig::DEFAULT (lowest priority)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! font = "Helvetica"
//! bold_font = "Helvetica"
//!
//! [colors]
//! dark_bg = [212, 212, 212]
//!
//! [labels]
//! title = "FACTURE"
//! tax_total = "TVA"
//!
//! [geometry]
//! page_height_limit = 250.0
//! ```
//!
//! Every table and field is optional; missing values come from the default.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::canvas::Rgb;
use crate::error::{LayoutError, LayoutResult};

type Text = Cow<'static, str>;

const fn text(s: &'static str) -> Text {
    Cow::Borrowed(s)
}

// =============================================================================
// Colours
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Totals title cells.
    pub dark_bg: Rgb,
    /// Table header band and totals value cells.
    pub grey_bg: Rgb,
    pub base_text: Rgb,
    /// Secondary text: item details, stacked descriptions.
    pub grey_text: Rgb,
}

impl Palette {
    pub const DEFAULT: Palette = Palette {
        dark_bg: Rgb(212, 212, 212),
        grey_bg: Rgb(232, 232, 232),
        base_text: Rgb(35, 35, 35),
        grey_text: Rgb(82, 82, 82),
    };
}

impl Default for Palette {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Labels
// =============================================================================

/// Every string printed by the layout that is not invoice data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub title: Text,
    pub reference: Text,
    pub date: Text,
    pub due_date: Text,
    pub version: Text,
    pub vat_id: Text,

    // Totals block
    pub subtotal: Text,
    pub total_discounted: Text,
    pub tax_total: Text,
    pub total_with_tax: Text,
    pub total: Text,
    pub fixed_fee: Text,
    pub payment_term: Text,

    // Table header
    pub item_name: Text,
    pub unit_price: Text,
    pub quantity: Text,
    pub ad_spend: Text,
    pub commission: Text,
    pub discount: Text,
    pub tax: Text,
    pub item_total: Text,
}

impl Labels {
    pub const DEFAULT: Labels = Labels {
        title: text("INVOICE"),
        reference: text("Ref."),
        date: text("Date"),
        due_date: text("Due date"),
        version: text("Version"),
        vat_id: text("VAT"),
        subtotal: text("SUBTOTAL"),
        total_discounted: text("TOTAL DISCOUNTED"),
        tax_total: text("VAT applied"),
        total_with_tax: text("TOTAL WITH TAX"),
        total: text("TOTAL"),
        fixed_fee: text("Fixed Transfer Fees"),
        payment_term: text("Payment term"),
        item_name: text("Name"),
        unit_price: text("Unit price"),
        quantity: text("Qty"),
        ad_spend: text("Ad Spend"),
        commission: text("Commission"),
        discount: text("Discount"),
        tax: text("Tax"),
        item_total: text("Total"),
    };
}

impl Default for Labels {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Geometry
// =============================================================================

/// Absolute X positions of the item table columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOffsets {
    pub name: f64,
    pub unit_price: f64,
    pub quantity: f64,
    pub commission: f64,
    pub discount: f64,
    pub tax: f64,
    pub total: f64,
    /// Right edge of the table.
    pub right_edge: f64,
}

impl ColumnOffsets {
    pub const DEFAULT: ColumnOffsets = ColumnOffsets {
        name: 10.0,
        unit_price: 80.0,
        quantity: 103.0,
        commission: 125.0,
        discount: 140.0,
        tax: 157.0,
        total: 175.0,
        right_edge: 190.0,
    };

    fn in_order(&self) -> [(&'static str, f64); 8] {
        [
            ("name", self.name),
            ("unit_price", self.unit_price),
            ("quantity", self.quantity),
            ("commission", self.commission),
            ("discount", self.discount),
            ("tax", self.tax),
            ("total", self.total),
            ("right_edge", self.right_edge),
        ]
    }
}

impl Default for ColumnOffsets {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Page geometry, font sizes and block heights, all in mm (sizes in pt).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub page_width: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    /// Lowest Y a block may reach before a page break.
    pub page_height_limit: f64,

    pub base_font_size: f64,
    pub small_font_size: f64,
    pub extra_small_font_size: f64,
    pub large_font_size: f64,
    pub title_font_size: f64,
    pub notes_font_size: f64,
    /// Base size for template blocks.
    pub template_font_size: f64,

    pub table_gap: f64,
    pub table_header_height: f64,
    pub header_row_gap: f64,
    pub row_line_height: f64,
    pub min_row_height: f64,
    pub row_spacing: f64,

    /// Space the totals block needs; checked once after the table.
    pub totals_reserved_height: f64,
    /// Extra space when a document discount row is printed.
    pub discount_block_extra: f64,
    pub totals_label_x: f64,
    pub totals_value_x: f64,
    pub totals_column_width: f64,
    pub totals_row_height: f64,
    pub discount_row_height: f64,

    pub notes_width: f64,
    pub payment_term_offset: f64,

    /// Must stay the last field: TOML tables follow plain values.
    pub columns: ColumnOffsets,
}

impl PageGeometry {
    pub const DEFAULT: PageGeometry = PageGeometry {
        page_width: 210.0,
        margin_left: 10.0,
        margin_right: 10.0,
        margin_top: 20.0,
        page_height_limit: 260.0,
        columns: ColumnOffsets::DEFAULT,
        base_font_size: 8.0,
        small_font_size: 7.0,
        extra_small_font_size: 6.0,
        large_font_size: 10.0,
        title_font_size: 20.0,
        notes_font_size: 9.0,
        template_font_size: 10.0,
        table_gap: 10.0,
        table_header_height: 6.0,
        header_row_gap: 2.0,
        row_line_height: 3.0,
        min_row_height: 6.0,
        row_spacing: 3.0,
        totals_reserved_height: 60.0,
        discount_block_extra: 15.0,
        totals_label_x: 120.0,
        totals_value_x: 160.0,
        totals_column_width: 40.0,
        totals_row_height: 10.0,
        discount_row_height: 15.0,
        notes_width: 100.0,
        payment_term_offset: 15.0,
    };

    /// Width between the left and right margins.
    pub fn content_width(&self) -> f64 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Height the totals block needs, including the discount row if any.
    pub fn trailer_height(&self, has_document_discount: bool) -> f64 {
        if has_document_discount {
            self.totals_reserved_height + self.discount_block_extra
        } else {
            self.totals_reserved_height
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Render Configuration
// =============================================================================

/// Complete render configuration, passed explicitly into the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub font: Text,
    pub bold_font: Text,
    pub colors: Palette,
    pub labels: Labels,
    pub geometry: PageGeometry,
}

impl RenderConfig {
    /// The built-in configuration.
    pub const DEFAULT: RenderConfig = RenderConfig {
        font: text("Helvetica"),
        bold_font: text("Helvetica"),
        colors: Palette::DEFAULT,
        labels: Labels::DEFAULT,
        geometry: PageGeometry::DEFAULT,
    };

    /// Loads configuration from file and environment on top of the default.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. `RenderConfig::DEFAULT`
    /// 2. Config file (`invoicer.toml`), if it exists
    /// 3. `INVOICER_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> LayoutResult<Self> {
        let mut config = Self::DEFAULT;

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading render config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns the default if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load render config: {}. Using defaults.", e);
            Self::DEFAULT
        })
    }

    /// Parses a TOML file without env overrides or validation.
    pub fn from_file(path: &Path) -> LayoutResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> LayoutResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validates geometry and fonts.
    pub fn validate(&self) -> LayoutResult<()> {
        if self.font.trim().is_empty() || self.bold_font.trim().is_empty() {
            return Err(LayoutError::Config("font names cannot be empty".into()));
        }

        let g = &self.geometry;
        if g.page_height_limit <= g.margin_top {
            return Err(LayoutError::Config(format!(
                "page_height_limit ({}) must be greater than margin_top ({})",
                g.page_height_limit, g.margin_top
            )));
        }
        if g.content_width() <= 0.0 {
            return Err(LayoutError::Config(
                "margins leave no room for content".into(),
            ));
        }

        let columns = g.columns.in_order();
        for pair in columns.windows(2) {
            let ((prev_name, prev), (name, x)) = (pair[0], pair[1]);
            if x <= prev {
                return Err(LayoutError::Config(format!(
                    "column offset {name} ({x}) must be greater than {prev_name} ({prev})"
                )));
            }
        }
        if g.columns.right_edge > g.page_width {
            return Err(LayoutError::Config(format!(
                "table right edge ({}) is outside the page ({})",
                g.columns.right_edge, g.page_width
            )));
        }

        let sizes = [
            ("base_font_size", g.base_font_size),
            ("small_font_size", g.small_font_size),
            ("extra_small_font_size", g.extra_small_font_size),
            ("large_font_size", g.large_font_size),
            ("title_font_size", g.title_font_size),
            ("notes_font_size", g.notes_font_size),
            ("template_font_size", g.template_font_size),
            ("row_line_height", g.row_line_height),
            ("min_row_height", g.min_row_height),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v <= 0.0 || !v.is_finite()) {
            return Err(LayoutError::Config(format!("{name} must be positive")));
        }

        Ok(())
    }

    /// Applies `INVOICER_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(font) = lookup("INVOICER_FONT") {
            debug!(font = %font, "Overriding font from environment");
            self.font = Cow::Owned(font);
        }

        if let Some(font) = lookup("INVOICER_BOLD_FONT") {
            self.bold_font = Cow::Owned(font);
        }

        if let Some(limit) = lookup("INVOICER_PAGE_LIMIT") {
            match limit.parse::<f64>() {
                Ok(v) => {
                    debug!(limit = v, "Overriding page height limit from environment");
                    self.geometry.page_height_limit = v;
                }
                Err(_) => warn!(value = %limit, "Ignoring non-numeric INVOICER_PAGE_LIMIT"),
            }
        }

        if let Some(title) = lookup("INVOICER_TITLE") {
            self.labels.title = Cow::Owned(title);
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "invoicer", "invoicer")
            .map(|dirs| dirs.config_dir().join("invoicer.toml"))
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.labels.title, "INVOICE");
        assert_eq!(config.geometry.page_height_limit, 260.0);
        assert_eq!(config.colors.dark_bg, Rgb(212, 212, 212));
    }

    #[test]
    fn test_trailer_height() {
        let g = PageGeometry::DEFAULT;
        assert_eq!(g.trailer_height(false), 60.0);
        assert_eq!(g.trailer_height(true), 75.0);
        assert_eq!(g.content_width(), 190.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = r#"
            font = "Times"

            [labels]
            title = "FACTURE"

            [geometry]
            page_height_limit = 250.0

            [geometry.columns]
            total = 170.0
        "#;
        let config: RenderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.font, "Times");
        assert_eq!(config.bold_font, "Helvetica");
        assert_eq!(config.labels.title, "FACTURE");
        assert_eq!(config.labels.subtotal, "SUBTOTAL");
        assert_eq!(config.geometry.page_height_limit, 250.0);
        assert_eq!(config.geometry.columns.total, 170.0);
        assert_eq!(config.geometry.columns.tax, 157.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[colors]\ngrey_text = [1, 2, 3]").unwrap();

        let config = RenderConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.colors.grey_text, Rgb(1, 2, 3));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "font = [").unwrap();

        let err = RenderConfig::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, LayoutError::Toml(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let rendered = RenderConfig::DEFAULT.to_toml().unwrap();
        let parsed: RenderConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, RenderConfig::DEFAULT);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("INVOICER_FONT", "Courier"),
            ("INVOICER_PAGE_LIMIT", "240"),
            ("INVOICER_TITLE", "RECHNUNG"),
        ]
        .into_iter()
        .collect();

        let mut config = RenderConfig::DEFAULT;
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.font, "Courier");
        assert_eq!(config.bold_font, "Helvetica");
        assert_eq!(config.geometry.page_height_limit, 240.0);
        assert_eq!(config.labels.title, "RECHNUNG");
    }

    #[test]
    fn test_bad_page_limit_override_is_ignored() {
        let mut config = RenderConfig::DEFAULT;
        config.apply_overrides_from(|key| {
            (key == "INVOICER_PAGE_LIMIT").then(|| "tall".to_string())
        });
        assert_eq!(config.geometry.page_height_limit, 260.0);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut config = RenderConfig::DEFAULT;
        config.geometry.page_height_limit = 10.0;
        assert!(matches!(config.validate(), Err(LayoutError::Config(_))));

        let mut config = RenderConfig::DEFAULT;
        config.geometry.columns.tax = 100.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("column offset tax"));

        let mut config = RenderConfig::DEFAULT;
        config.geometry.small_font_size = 0.0;
        assert!(config.validate().is_err());
    }
}
