//! # Block Renderer
//!
//! Draws a flat sequence of tagged text blocks, one wrapped paragraph per
//! block, paginating through the same [`LayoutCursor`] as the invoice table.
//!
//! ## Tag Styles
//! ```text
//! tag          weight   size    line height      gap after
//! ───────────  ───────  ──────  ───────────────  ─────────
//! h1           bold     24      12               5
//! h2           bold     18      10               4
//! h3           bold     14      8                3
//! p, div       regular  base    1.5 × base line  2
//! strong, b    bold     base    1.5 × base line  0
//! other        regular  base    1.5 × base line  0
//! script, style, head, title, meta: skipped
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canvas::{Canvas, FontStyle};
use crate::config::RenderConfig;
use crate::cursor::LayoutCursor;
use crate::recording::PT_TO_MM;

/// One run of text and the tag that encloses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub tag: String,
    pub text: String,
}

impl Block {
    pub fn new(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
        }
    }
}

/// Tags whose text is never drawn.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "head", "title", "meta"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockStyle {
    pub font_style: FontStyle,
    pub size: f64,
    pub line_height: f64,
    /// Vertical space after the block.
    pub gap: f64,
}

impl BlockStyle {
    /// Style for `tag` at a base font size of `base_size` points.
    ///
    /// `None` for tags whose text is not content.
    pub fn for_tag(tag: &str, base_size: f64) -> Option<BlockStyle> {
        let tag = tag.to_ascii_lowercase();
        if NON_CONTENT_TAGS.contains(&tag.as_str()) {
            return None;
        }

        let body_line = base_size * PT_TO_MM * 1.5;
        let style = match tag.as_str() {
            "h1" => Self::bold(24.0, 12.0, 5.0),
            "h2" => Self::bold(18.0, 10.0, 4.0),
            "h3" => Self::bold(14.0, 8.0, 3.0),
            "p" | "div" => BlockStyle {
                font_style: FontStyle::Regular,
                size: base_size,
                line_height: body_line,
                gap: 2.0,
            },
            "strong" | "b" => Self::bold(base_size, body_line, 0.0),
            _ => BlockStyle {
                font_style: FontStyle::Regular,
                size: base_size,
                line_height: body_line,
                gap: 0.0,
            },
        };
        Some(style)
    }

    const fn bold(size: f64, line_height: f64, gap: f64) -> Self {
        BlockStyle {
            font_style: FontStyle::Bold,
            size,
            line_height,
            gap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockOutcome {
    pub blocks_drawn: usize,
    pub pages: usize,
    pub page_breaks: usize,
}

pub struct BlockRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Draws `blocks` onto a fresh page of `canvas`.
    pub fn render<C: Canvas + ?Sized>(&self, canvas: &mut C, blocks: &[Block]) -> BlockOutcome {
        let g = self.config.geometry;
        let width = g.content_width();
        let mut cursor = LayoutCursor::new(g);
        let mut drawn = 0;

        canvas.add_page();
        canvas.set_text_color(self.config.colors.base_text);

        for block in blocks {
            let text = block.text.trim();
            if text.is_empty() {
                continue;
            }
            let Some(style) = BlockStyle::for_tag(&block.tag, g.template_font_size) else {
                debug!(tag = %block.tag, "Skipping non-content block");
                continue;
            };

            let family = match style.font_style {
                FontStyle::Bold => &self.config.bold_font,
                FontStyle::Regular => &self.config.font,
            };
            canvas.set_font(family, style.font_style, style.size);

            let extent = canvas.wrapped_height(text, width, style.line_height);
            cursor.begin_block(canvas, extent);
            let top = cursor.y();
            let height = canvas.draw_wrapped_text(width, style.line_height, text);
            cursor.end_block(canvas, top + height + style.gap);
            drawn += 1;
        }

        BlockOutcome {
            blocks_drawn: drawn,
            pages: cursor.page(),
            page_breaks: cursor.page_breaks(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
