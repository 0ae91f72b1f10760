//! # Recording Canvas
//!
//! A [`Canvas`] that records every drawing call as a [`Command`] on the
//! current page. The finished [`RenderedDocument`] is the page sequence a PDF
//! backend would serialize; tests and the CLI inspect it directly.
//!
//! ## Metrics
//! Text is measured with a fixed average advance of half an em, so layouts
//! are deterministic without font files:
//! ```text
//! line height (mm) = size (pt) × 0.3528
//! text width  (mm) = chars × size (pt) × 0.3528 × 0.5
//! ```

use serde::Serialize;

use crate::canvas::{Align, Canvas, Cell, FontStyle, RectStyle, Rgb};

/// Millimetres per typographic point.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

const AVERAGE_ADVANCE_EM: f64 = 0.5;

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    SetFont {
        family: String,
        style: FontStyle,
        size: f64,
    },
    SetFillColor {
        color: Rgb,
    },
    SetTextColor {
        color: Rgb,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        style: RectStyle,
    },
    Cell {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        text: String,
        align: Align,
        border: bool,
        fill: bool,
    },
    Text {
        x: f64,
        y: f64,
        width: f64,
        line_height: f64,
        lines: Vec<String>,
    },
}

impl Command {
    /// Text carried by a cell or wrapped-text command.
    pub fn text(&self) -> Option<String> {
        match self {
            Command::Cell { text, .. } => Some(text.clone()),
            Command::Text { lines, .. } => Some(lines.join("\n")),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedPage {
    /// 1-based page number.
    pub number: usize,
    pub commands: Vec<Command>,
}

impl RecordedPage {
    fn new(number: usize) -> Self {
        Self {
            number,
            commands: Vec::new(),
        }
    }

    /// Every text string drawn on this page, in order.
    pub fn texts(&self) -> Vec<String> {
        self.commands.iter().filter_map(Command::text).collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.commands
            .iter()
            .filter_map(Command::text)
            .any(|t| t.contains(needle))
    }
}

/// The finished page sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub pages: Vec<RecordedPage>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Canvas that records calls instead of producing a PDF.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    pages: Vec<RecordedPage>,
    origin: (f64, f64),
    x: f64,
    y: f64,
    font_family: String,
    font_style: FontStyle,
    font_size: f64,
}

impl RecordingCanvas {
    /// `origin` is where `add_page` puts the cursor (left and top margins).
    pub fn new(origin: (f64, f64)) -> Self {
        Self {
            pages: Vec::new(),
            origin,
            x: origin.0,
            y: origin.1,
            font_family: "Helvetica".to_string(),
            font_style: FontStyle::Regular,
            font_size: 12.0,
        }
    }

    pub fn pages(&self) -> &[RecordedPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Current font as `(family, style, size)`.
    pub fn font(&self) -> (&str, FontStyle, f64) {
        (&self.font_family, self.font_style, self.font_size)
    }

    pub fn finish(self) -> RenderedDocument {
        RenderedDocument { pages: self.pages }
    }

    fn record(&mut self, command: Command) {
        if self.pages.is_empty() {
            self.pages.push(RecordedPage::new(1));
        }
        if let Some(page) = self.pages.last_mut() {
            page.commands.push(command);
        }
    }
}

impl Canvas for RecordingCanvas {
    fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    fn draw_cell(&mut self, cell: Cell<'_>) {
        self.record(Command::Cell {
            x: self.x,
            y: self.y,
            width: cell.width,
            height: cell.height,
            text: cell.text.to_string(),
            align: cell.align,
            border: cell.border,
            fill: cell.fill,
        });
        self.x += cell.width;
    }

    fn draw_wrapped_text(&mut self, width: f64, line_height: f64, text: &str) -> f64 {
        let lines = self.split_lines(text, width);
        let height = lines.len() as f64 * line_height;
        self.record(Command::Text {
            x: self.x,
            y: self.y,
            width,
            line_height,
            lines,
        });
        self.y += height;
        height
    }

    fn set_font(&mut self, family: &str, style: FontStyle, size: f64) {
        self.font_family = family.to_string();
        self.font_style = style;
        self.font_size = size;
        self.record(Command::SetFont {
            family: family.to_string(),
            style,
            size,
        });
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.record(Command::SetFillColor { color });
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.record(Command::SetTextColor { color });
    }

    fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64, style: RectStyle) {
        self.record(Command::Rect {
            x,
            y,
            width,
            height,
            style,
        });
    }

    fn add_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(RecordedPage::new(number));
        self.x = self.origin.0;
        self.y = self.origin.1;
    }

    fn font_line_height(&self) -> f64 {
        self.font_size * PT_TO_MM
    }

    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.font_size * PT_TO_MM * AVERAGE_ADVANCE_EM
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_page_resets_position() {
        let mut canvas = RecordingCanvas::new((10.0, 20.0));
        canvas.add_page();
        canvas.set_position(50.0, 200.0);
        canvas.add_page();

        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.position(), (10.0, 20.0));
        assert_eq!(canvas.pages()[1].number, 2);
    }

    #[test]
    fn test_cell_advances_x_only() {
        let mut canvas = RecordingCanvas::new((10.0, 20.0));
        canvas.add_page();
        canvas.draw_cell(Cell::new(30.0, 6.0, "Name").align(Align::Right));

        assert_eq!(canvas.position(), (40.0, 20.0));
        assert_eq!(
            canvas.pages()[0].commands[0],
            Command::Cell {
                x: 10.0,
                y: 20.0,
                width: 30.0,
                height: 6.0,
                text: "Name".to_string(),
                align: Align::Right,
                border: false,
                fill: false,
            }
        );
    }

    #[test]
    fn test_wrapped_text_moves_y() {
        let mut canvas = RecordingCanvas::new((10.0, 20.0));
        canvas.add_page();
        canvas.set_font("Helvetica", FontStyle::Regular, 10.0);

        // 10pt: 1.764 mm per char, so 20 mm fits 11 chars
        let height = canvas.draw_wrapped_text(20.0, 5.0, "alpha beta gamma delta");
        assert_eq!(height, 10.0);
        assert_eq!(canvas.position(), (10.0, 30.0));
        assert_eq!(
            canvas.pages()[0].texts(),
            vec!["alpha beta\ngamma delta".to_string()]
        );
    }

    #[test]
    fn test_metrics() {
        let mut canvas = RecordingCanvas::new((0.0, 0.0));
        canvas.set_font("Helvetica", FontStyle::Bold, 72.0);
        assert!((canvas.font_line_height() - 25.4).abs() < 1e-9);
        assert!((canvas.text_width("ab") - 25.4).abs() < 1e-9);
    }

    #[test]
    fn test_split_lines_handles_newlines_and_long_words() {
        let mut canvas = RecordingCanvas::new((0.0, 0.0));
        canvas.set_font("Helvetica", FontStyle::Regular, 10.0);

        let lines = canvas.split_lines("one\nsupercalifragilistic two", 10.0);
        assert_eq!(lines, vec!["one", "supercalifragilistic", "two"]);
        assert!(canvas.split_lines("   ", 10.0).is_empty());
    }

    #[test]
    fn test_drawing_before_add_page_opens_first_page() {
        let mut canvas = RecordingCanvas::new((0.0, 0.0));
        canvas.set_fill_color(Rgb(1, 2, 3));
        let doc = canvas.finish();
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].number, 1);
    }

    #[test]
    fn test_serializes_with_op_tag() {
        let mut canvas = RecordingCanvas::new((0.0, 0.0));
        canvas.draw_rect(1.0, 2.0, 3.0, 4.0, RectStyle::Fill);
        let json = serde_json::to_value(canvas.finish()).unwrap();
        assert_eq!(json["pages"][0]["commands"][0]["op"], "rect");
        assert_eq!(json["pages"][0]["commands"][0]["style"], "fill");
    }
}
