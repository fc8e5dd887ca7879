/// Shared value types (sizes, colors, frames).
pub mod core;
/// Error taxonomy.
pub mod error;
pub(crate) mod math;
/// Accumulated 2D transform.
pub mod transform;
