//! Page layout calculations
//!
//! Everything here is pure arithmetic in PDF points with the origin at the
//! bottom-left corner of the page. The PDF adapter in [`crate::pdf`] turns the
//! returned rectangles into drawing operations.

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_mm(210.0),
            height: Length::from_mm(297.0),
        }
    }
}

impl Default for PageDimensions {
    fn default() -> Self {
        Self::a4()
    }
}

/// Margins for page content
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub bottom: Length,
    pub left: Length,
    pub right: Length,
}

impl Margins {
    /// Create margins with same value on all sides
    pub fn uniform(margin: Length) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }

    /// No margins at all; images may span the full page width
    pub fn none() -> Self {
        Self::uniform(Length::from_mm(0.0))
    }

    /// Narrow margins (0.5 inches)
    pub fn narrow() -> Self {
        Self::uniform(Length::from_inches(0.5))
    }
}

/// How crops are arranged on pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutMode {
    /// Every placement gets its own page, centered, with an index label
    OnePerPage {
        /// Share of the page height an image may occupy
        height_fraction: f64,
    },
    /// Crops are stacked top-down at full content width until the page is full
    Flowing {
        /// Vertical space between consecutive images
        gap: Length,
    },
}

impl LayoutMode {
    pub fn one_per_page() -> Self {
        LayoutMode::OnePerPage { height_fraction: 0.9 }
    }

    pub fn flowing() -> Self {
        LayoutMode::Flowing { gap: Length::from_mm(4.0) }
    }
}

/// Fixed per-document layout configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub page: PageDimensions,
    pub margins: Margins,
    pub mode: LayoutMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageDimensions::a4(),
            margins: Margins::none(),
            mode: LayoutMode::one_per_page(),
        }
    }
}

impl LayoutConfig {
    /// Flowing layout with narrow margins
    pub fn flowing() -> Self {
        Self {
            page: PageDimensions::a4(),
            margins: Margins::narrow(),
            mode: LayoutMode::flowing(),
        }
    }

    /// Horizontal space between the left and right margins, in points
    pub fn content_width(&self) -> f64 {
        (self.page.width.pt() - self.margins.left.pt() - self.margins.right.pt()).max(0.0)
    }

    /// Maximum height a single image may be drawn at, in points
    pub fn vertical_budget(&self) -> f64 {
        let inside = (self.page.height.pt() - self.margins.top.pt() - self.margins.bottom.pt()).max(0.0);
        match self.mode {
            LayoutMode::OnePerPage { height_fraction } => {
                (self.page.height.pt() * height_fraction).min(inside)
            }
            LayoutMode::Flowing { .. } => inside,
        }
    }

    /// Y coordinate of the top margin
    pub fn top_y(&self) -> f64 {
        self.page.height.pt() - self.margins.top.pt()
    }

    /// Y coordinate of the bottom margin
    pub fn bottom_y(&self) -> f64 {
        self.margins.bottom.pt()
    }
}

/// A rectangle in page coordinates (points, bottom-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scale `(width, height)` by a single factor so it fits inside `max_width × max_height`
///
/// The aspect ratio is preserved. The result may be larger than the source;
/// resolution concerns are handled when the pixels are embedded.
pub fn fit_within(width: f64, height: f64, max_width: f64, max_height: f64) -> (f64, f64) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height).max(0.0);
    (width * scale, height * scale)
}

/// Place one image alone on a page, centered on both axes
pub fn place_single(width: u32, height: u32, config: &LayoutConfig) -> Rect {
    let (draw_w, draw_h) = fit_within(
        width as f64,
        height as f64,
        config.content_width(),
        config.vertical_budget(),
    );

    let x = config.margins.left.pt() + (config.content_width() - draw_w) / 2.0;
    let y = (config.page.height.pt() - draw_h) / 2.0;

    Rect { x, y, width: draw_w, height: draw_h }
}

/// Current vertical write position within an open page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageCursor {
    /// Y coordinate of the highest free point on the page
    pub y: f64,
    /// Nothing has been placed on this page yet
    pub fresh: bool,
}

impl PageCursor {
    /// Cursor for a newly started page
    pub fn at_top(config: &LayoutConfig) -> Self {
        Self { y: config.top_y(), fresh: true }
    }

    /// Space left between the cursor and the bottom margin
    pub fn remaining(&self, config: &LayoutConfig) -> f64 {
        (self.y - config.bottom_y()).max(0.0)
    }
}

/// Where a flowing placement lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowPlacement {
    /// The current page must be finalized and a new one started before drawing
    pub new_page: bool,
    pub rect: Rect,
}

/// Place the next image in flowing mode
///
/// The image is scaled to the content width (and further if it would not fit
/// on an empty page). If it does not fit below the cursor on a page that
/// already holds content, the placement starts a new page.
pub fn place_flowing(
    cursor: PageCursor,
    width: u32,
    height: u32,
    config: &LayoutConfig,
) -> (PageCursor, FlowPlacement) {
    let gap = match config.mode {
        LayoutMode::Flowing { gap } => gap.pt(),
        LayoutMode::OnePerPage { .. } => 0.0,
    };

    let (draw_w, draw_h) = fit_within(
        width as f64,
        height as f64,
        config.content_width(),
        config.vertical_budget(),
    );

    let new_page = !cursor.fresh && draw_h > cursor.remaining(config);
    let top = if new_page { PageCursor::at_top(config).y } else { cursor.y };

    let rect = Rect {
        x: config.margins.left.pt(),
        y: top - draw_h,
        width: draw_w,
        height: draw_h,
    };

    let next = PageCursor { y: rect.y - gap, fresh: false };

    (next, FlowPlacement { new_page, rect })
}

/// Reserve a line of `line_height` points at the cursor, breaking the page if needed
///
/// Returns the baseline for the text and the advanced cursor.
pub fn place_text_line(
    cursor: PageCursor,
    line_height: f64,
    config: &LayoutConfig,
) -> (PageCursor, bool, f64) {
    let new_page = !cursor.fresh && line_height > cursor.remaining(config);
    let top = if new_page { PageCursor::at_top(config).y } else { cursor.y };
    let baseline = top - line_height;
    (PageCursor { y: baseline, fresh: false }, new_page, baseline)
}
