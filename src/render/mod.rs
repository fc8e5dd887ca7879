//! Renderer contract and backends.
//!
//! Every backend implements [`backend::Renderer`] and walks the display list through
//! [`traverse::traverse`], so paint order, visibility and opacity rules are shared.

/// Renderer trait, settings and limits.
pub mod backend;
/// DOM-like element backend.
pub mod dom;
/// Batched GPU backend.
pub mod gpu;
/// Markup element tree and sinks shared by the DOM and SVG backends.
pub mod markup;
/// CPU raster backend on `vello_cpu`.
pub mod raster;
/// SVG backend.
pub mod svg;
/// Display-list traversal and the transform pool.
pub mod traverse;
