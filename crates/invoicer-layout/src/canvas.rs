//! # Canvas
//!
//! The drawing capability the layout engine drives. A PDF backend implements
//! this trait; [`RecordingCanvas`](crate::recording::RecordingCanvas) records
//! the calls instead.
//!
//! ## Coordinates
//! ```text
//!  (0,0) ──────────── x (mm) ──────────►
//!    │   ┌──────────────────────────┐
//!    │   │ margin_top               │
//!    y   │   ┌──────────────────┐   │
//!    │   │   │ content          │   │
//!    ▼   │   └──────────────────┘   │
//!        │ page_height_limit ────── │
//!        └──────────────────────────┘
//! ```
//!
//! Units are millimetres; font sizes are points.

use serde::{Deserialize, Serialize};

/// An RGB colour, serialized as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    Regular,
    Bold,
}

/// Text alignment inside a cell.
///
/// The two-letter variants align horizontally left and vertically to the
/// bottom or top edge, for stacked title/description cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Right,
    Center,
    LeftBottom,
    LeftTop,
    RightBottom,
    RightTop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectStyle {
    Fill,
    Stroke,
    FillStroke,
}

/// A single-line text cell drawn at the current position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell<'a> {
    pub width: f64,
    pub height: f64,
    pub text: &'a str,
    pub align: Align,
    pub border: bool,
    pub fill: bool,
}

impl<'a> Cell<'a> {
    pub fn new(width: f64, height: f64, text: &'a str) -> Self {
        Cell {
            width,
            height,
            text,
            align: Align::Left,
            border: false,
            fill: false,
        }
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

/// Page-drawing primitives.
///
/// ## Position Semantics
/// - `draw_cell` leaves `y` unchanged and moves `x` past the cell
/// - `draw_wrapped_text` moves `y` below the last line and restores `x`
/// - `add_page` resets the position to the top-left margin
pub trait Canvas {
    fn set_position(&mut self, x: f64, y: f64);

    fn position(&self) -> (f64, f64);

    fn set_x(&mut self, x: f64) {
        let (_, y) = self.position();
        self.set_position(x, y);
    }

    fn set_y(&mut self, y: f64) {
        let (x, _) = self.position();
        self.set_position(x, y);
    }

    fn draw_cell(&mut self, cell: Cell<'_>);

    /// Draws `text` wrapped to `width`, returning the height used.
    fn draw_wrapped_text(&mut self, width: f64, line_height: f64, text: &str) -> f64;

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64);

    fn set_fill_color(&mut self, color: Rgb);

    fn set_text_color(&mut self, color: Rgb);

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, style: RectStyle);

    fn add_page(&mut self);

    /// Height of one line of the current font, in mm.
    fn font_line_height(&self) -> f64;

    /// Width of `text` in the current font, in mm.
    fn text_width(&self, text: &str) -> f64;

    /// Greedy word wrap using [`text_width`](Self::text_width).
    ///
    /// Explicit newlines always break. A word wider than `width` gets a line
    /// of its own. Empty input yields no lines.
    fn split_lines(&self, text: &str, width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                if current.is_empty() {
                    current.push_str(word);
                    continue;
                }
                let candidate = format!("{current} {word}");
                if self.text_width(&candidate) <= width {
                    current = candidate;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }
        lines
    }

    /// Height `text` would take when wrapped to `width` at `line_height`.
    fn wrapped_height(&self, text: &str, width: f64, line_height: f64) -> f64 {
        self.split_lines(text, width).len() as f64 * line_height
    }
}
