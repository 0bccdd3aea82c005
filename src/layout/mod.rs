//! Grid geometry and pagination for label sheets.
//!
//! This module provides:
//! - Page geometry derived once per run (cell size, code size)
//! - Placement of codes, captions and grid lines within a cell
//! - Splitting an id range into page plans

mod geometry;
mod pagination;

pub use geometry::{Cell, PageGeometry, Segment};
pub use pagination::{LabelItem, PagePlan, Paginator};
