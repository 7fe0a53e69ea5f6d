//! Coordinate transformation between screen and PDF coordinate systems
//!
//! Stored field entries carry a top-left screen position and/or the PDF
//! rectangle corners. Reading them never fails: anything unparseable becomes
//! `0`, and a rectangle missing any corner becomes the unpositioned sentinel.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::lenient::number;
use shared_types::{PdfRect, RawGeometry, ScreenPosition};

/// Read the PDF rectangle from a raw entry
///
/// The four corners are used verbatim when all of them parse as numbers;
/// otherwise the result is [`PdfRect::UNPOSITIONED`].
pub fn to_pdf_rect(raw: &RawGeometry) -> PdfRect {
    let corner = |v: &Option<Value>| v.as_ref().and_then(number);
    match (
        corner(&raw.llx),
        corner(&raw.lly),
        corner(&raw.urx),
        corner(&raw.ury),
    ) {
        (Some(llx), Some(lly), Some(urx), Some(ury)) => PdfRect { llx, lly, urx, ury },
        _ => PdfRect::UNPOSITIONED,
    }
}

/// Read the top-left screen position from a raw entry
///
/// Each axis takes the first parseable of `left`/`scale_X` (`top`/`scale_Y`),
/// defaulting to `0`. Fractions are truncated toward zero.
pub fn derive_position(raw: &RawGeometry) -> ScreenPosition {
    ScreenPosition {
        x: axis(&raw.left, &raw.scale_x),
        y: axis(&raw.top, &raw.scale_y),
    }
}

fn axis(preferred: &Option<Value>, fallback: &Option<Value>) -> i64 {
    preferred
        .as_ref()
        .and_then(number)
        .or_else(|| fallback.as_ref().and_then(number))
        .map(|n| n.trunc() as i64)
        .unwrap_or(0)
}

/// A page as laid out on screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// `[x, y, width, height]` of the page's media box, in points
    pub media_box: [f64; 4],
    /// Rendered page width in pixels
    pub container_width: f64,
    /// Rendered page height in pixels
    pub container_height: f64,
}

impl PageGeometry {
    /// US Letter rendered at `scale` pixels per point
    pub fn letter(scale: f64) -> Self {
        Self {
            media_box: [0.0, 0.0, 612.0, 792.0],
            container_width: 612.0 * scale,
            container_height: 792.0 * scale,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::letter(1.0)
    }
}

/// An axis-aligned box in screen pixels, top-left origin
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Convert DOM coordinates (top-left origin, pixels) to PDF coordinates
/// (bottom-left origin, points)
pub fn dom_to_pdf(dom_x: f64, dom_y: f64, page: &PageGeometry) -> (f64, f64) {
    let [mb_x, mb_y, mb_width, mb_height] = page.media_box;

    let x_pct = dom_x / page.container_width;
    let y_pct = dom_y / page.container_height;

    // Flip Y axis
    let pdf_x = mb_x + (x_pct * mb_width);
    let pdf_y = mb_y + (mb_height - (y_pct * mb_height));

    (pdf_x, pdf_y)
}

/// Convert PDF coordinates to DOM coordinates
pub fn pdf_to_dom(pdf_x: f64, pdf_y: f64, page: &PageGeometry) -> (f64, f64) {
    let [mb_x, mb_y, mb_width, mb_height] = page.media_box;

    let x_pct = (pdf_x - mb_x) / mb_width;
    let y_pct = 1.0 - ((pdf_y - mb_y) / mb_height);

    (x_pct * page.container_width, y_pct * page.container_height)
}

/// Convert an on-screen box into the PDF rectangle it covers
pub fn screen_box_to_pdf_rect(screen: &ScreenBox, page: &PageGeometry) -> PdfRect {
    // The box's bottom-left on screen is (x, y + height)
    let (llx, lly) = dom_to_pdf(screen.x, screen.y + screen.height, page);
    let (urx, ury) = dom_to_pdf(screen.x + screen.width, screen.y, page);
    PdfRect { llx, lly, urx, ury }
}

/// Convert a PDF rectangle into the on-screen box it occupies
pub fn pdf_rect_to_screen_box(rect: &PdfRect, page: &PageGeometry) -> ScreenBox {
    let (left, top) = pdf_to_dom(rect.llx, rect.ury, page);
    let (right, bottom) = pdf_to_dom(rect.urx, rect.lly, page);
    ScreenBox {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    }
}
