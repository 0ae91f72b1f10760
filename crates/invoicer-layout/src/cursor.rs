//! # Layout Cursor
//!
//! The owned drawing position and page-break bookkeeping for one render.
//!
//! ## State Machine
//! ```text
//!                 begin_block(extent)
//!  ┌─────────────┐   fits    ┌─────────┐  end_block(bottom)  ┌─────────────┐
//!  │ Positioning │ ────────► │ Drawing │ ──────────────────► │ Positioning │
//!  └─────────────┘           └─────────┘                     └─────────────┘
//!        │ y + extent > limit      ▲
//!        ▼                         │ y = margin_top
//!  ┌──────────┐  add_page   ┌─────────┐
//!  │ Overflow │ ──────────► │ NewPage │  (caller redraws table header)
//!  └──────────┘             └─────────┘
//! ```
//!
//! A block that starts at the top margin never breaks, even when taller than
//! the page: breaking would only emit an empty page.

use serde::Serialize;
use tracing::debug;

use crate::canvas::Canvas;
use crate::config::PageGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PagerState {
    /// Tracking the bottom of the last drawn block.
    Positioning,
    /// Canvas calls are being issued for the current block.
    Drawing,
    /// The projected bottom is past the page limit.
    Overflow,
    /// A page was just added; `y` is at the top margin.
    NewPage,
}

/// Where the next block goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    SamePage,
    /// A page break was emitted before the block.
    NewPage,
}

impl Placement {
    pub fn is_new_page(self) -> bool {
        self == Placement::NewPage
    }
}

#[derive(Debug, Clone)]
pub struct LayoutCursor {
    x: f64,
    y: f64,
    geometry: PageGeometry,
    state: PagerState,
    page: usize,
    page_breaks: usize,
}

impl LayoutCursor {
    /// A cursor at the top-left margin of page 1.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            x: geometry.margin_left,
            y: geometry.margin_top,
            geometry,
            state: PagerState::Positioning,
            page: 1,
            page_breaks: 0,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn state(&self) -> PagerState {
        self.state
    }

    /// 1-based number of the page being drawn.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_breaks(&self) -> usize {
        self.page_breaks
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Whether a block of `extent` fits below the cursor on this page.
    pub fn fits(&self, extent: f64) -> bool {
        self.at_top() || self.y + extent <= self.geometry.page_height_limit
    }

    fn at_top(&self) -> bool {
        self.y <= self.geometry.margin_top
    }

    /// Reserves `extent` for the next block, breaking the page first when it
    /// would cross the limit. The canvas is left at the block's top-left.
    pub fn begin_block<C: Canvas + ?Sized>(&mut self, canvas: &mut C, extent: f64) -> Placement {
        let placement = if self.fits(extent) {
            Placement::SamePage
        } else {
            self.state = PagerState::Overflow;
            debug!(
                page = self.page,
                y = self.y,
                extent,
                limit = self.geometry.page_height_limit,
                "Block overflows page, breaking"
            );
            self.break_page(canvas);
            Placement::NewPage
        };

        self.state = PagerState::Drawing;
        canvas.set_position(self.x, self.y);
        placement
    }

    /// Finishes the current block with its bottom edge at `bottom`.
    pub fn end_block<C: Canvas + ?Sized>(&mut self, canvas: &mut C, bottom: f64) {
        self.y = bottom;
        self.x = self.geometry.margin_left;
        self.state = PagerState::Positioning;
        canvas.set_position(self.x, self.y);
    }

    /// Moves down by `dy` without a break check.
    pub fn advance(&mut self, dy: f64) {
        self.y += dy;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    fn break_page<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        canvas.add_page();
        self.page += 1;
        self.page_breaks += 1;
        self.x = self.geometry.margin_left;
        self.y = self.geometry.margin_top;
        self.state = PagerState::NewPage;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingCanvas;

    fn setup() -> (LayoutCursor, RecordingCanvas) {
        let geometry = PageGeometry::DEFAULT;
        let mut canvas = RecordingCanvas::new((geometry.margin_left, geometry.margin_top));
        canvas.add_page();
        (LayoutCursor::new(geometry), canvas)
    }

    #[test]
    fn test_block_that_fits_stays_on_page() {
        let (mut cursor, mut canvas) = setup();
        cursor.move_to(10.0, 200.0);

        let placement = cursor.begin_block(&mut canvas, 60.0);
        assert_eq!(placement, Placement::SamePage);
        assert_eq!(cursor.state(), PagerState::Drawing);
        assert_eq!(canvas.position(), (10.0, 200.0));

        cursor.end_block(&mut canvas, 260.0);
        assert_eq!(cursor.state(), PagerState::Positioning);
        assert_eq!(cursor.y(), 260.0);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_overflow_breaks_before_block() {
        let (mut cursor, mut canvas) = setup();
        cursor.move_to(10.0, 255.0);

        let placement = cursor.begin_block(&mut canvas, 6.0);
        assert!(placement.is_new_page());
        assert_eq!(cursor.page(), 2);
        assert_eq!(cursor.page_breaks(), 1);
        assert_eq!(cursor.y(), 20.0);
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.position(), (10.0, 20.0));
    }

    #[test]
    fn test_oversized_block_at_top_does_not_break() {
        let (mut cursor, mut canvas) = setup();

        let placement = cursor.begin_block(&mut canvas, 500.0);
        assert_eq!(placement, Placement::SamePage);
        assert_eq!(canvas.page_count(), 1);
    }

    #[test]
    fn test_exact_fit_is_allowed() {
        let (mut cursor, _) = setup();
        cursor.move_to(10.0, 250.0);
        assert!(cursor.fits(10.0));
        assert!(!cursor.fits(10.5));
    }

    #[test]
    fn test_advance() {
        let (mut cursor, _) = setup();
        cursor.advance(12.5);
        assert_eq!(cursor.y(), 32.5);
        assert_eq!(cursor.x(), 10.0);
    }
}
