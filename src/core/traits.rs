//! Shared surface of the cube and line stores.

use super::time_axis::TimeAxis;

/// Common read surface of the four store types (cube/line, reader/writer).
pub trait TraceStore {
    /// Sampling axis of the stored traces.
    fn time_axis(&self) -> TimeAxis;

    /// Total number of traces in the store.
    fn num_traces(&self) -> u64;

    /// The fully-undefined trace for this store's sample count.
    fn undef_trace(&self) -> &[f32];
}
