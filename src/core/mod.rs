//! Pure value types and algorithms: grid geometry, time axes, resampling.

mod geometry;
mod resample;
mod time_axis;
mod traits;

pub use geometry::GridGeometry;
pub use resample::resample_trace;
pub use time_axis::{join_time_axes, TimeAxis};
pub use traits::TraceStore;
