//! # dxseis
//!
//! Reader, writer and merge tooling for seismic data stored in an
//! OpenDX-derived hybrid text/binary format: regularly-gridded 3D cubes and
//! piecewise-linear 2D lines.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math helpers, the undefined-value sentinel
//! - [`dx`] - Low-level object-description parser for the textual headers
//! - [`core`] - Grid geometry, time axes, trace resampling
//! - [`cube`] - 3D cube stores ([`CubeReader`], [`CubeWriter`])
//! - [`line`] - 2D line stores ([`LineReader`], [`LineWriter`])
//! - [`merge`] - Multi-cube merge and single-source reduction
//!
//! ## Example
//!
//! ```ignore
//! use dxseis::prelude::*;
//!
//! let mut cube = CubeReader::open("survey.dx")?;
//! let trace = cube.trace_at(100, 100)?;
//!
//! dxseis::merge::join_cubes(&["a.dx", "b.dx"], "joined.dx", &mut NoProgress)?;
//! ```

pub mod core;
pub mod cube;
pub mod dx;
pub mod line;
pub mod merge;
pub mod util;

// Re-export commonly used types
pub use crate::core::{join_time_axes, resample_trace, GridGeometry, TimeAxis, TraceStore};
pub use crate::cube::{CubeReader, CubeWriter};
pub use crate::line::{LinePoint, LineReader, LineWriter};
pub use crate::util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::core::{join_time_axes, resample_trace, GridGeometry, TimeAxis, TraceStore};
    pub use crate::cube::{CubeReader, CubeWriter};
    pub use crate::dx::{FileObjectTable, ObjectRecord};
    pub use crate::line::{LinePoint, LineReader, LineWriter};
    pub use crate::merge::{join_cubes, reduce_cube_geometry, MergeReport, NoProgress};
    pub use crate::util::{is_undefined, DVec2, DVec3, Error, Result, UNDEF};
}
