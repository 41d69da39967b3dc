//! Utility types and functions for dxseis.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam and the undefined-value sentinel

mod error;
mod math;

pub use error::*;
pub use math::*;
