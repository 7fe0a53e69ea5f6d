//! Shared PDF handling utilities
//!
//! Coordinate transformation between the screen space a field overlay is
//! drawn in and the PDF space its rectangles are stored in.

pub mod coords;

pub use coords::{
    derive_position, dom_to_pdf, pdf_rect_to_screen_box, pdf_to_dom, screen_box_to_pdf_rect,
    to_pdf_rect, PageGeometry, ScreenBox,
};
