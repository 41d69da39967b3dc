//! Math type re-exports and the undefined-value sentinel.
//!
//! Geometry math runs on `glam` double-precision vectors. Undefined samples
//! are carried as a sentinel float, never as an error.

// Re-export glam types used throughout the crate
pub use glam::{DVec2, DVec3};

/// Sentinel value for an undefined sample: IEEE-754 single-precision maximum.
pub const UNDEF: f32 = 3.402_823_47e38;

/// Threshold for undefined tests. Resampling and interpolation introduce
/// round-off, so samples are never compared to [`UNDEF`] by exact equality.
pub const UNDEF_THRESHOLD: f32 = 0.9 * UNDEF;

/// Bytes per stored sample (little-endian f32).
pub const SAMPLE_BYTE_LEN: u64 = 4;

/// True if a sample carries no data.
#[inline]
pub fn is_undefined(v: f32) -> bool {
    v > UNDEF_THRESHOLD
}

/// Round to the nearest integer, halves toward positive infinity.
///
/// Matches the grid-index rounding of the on-disk format's producers,
/// which is not the same as `f64::round` for negative halves.
#[inline]
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
