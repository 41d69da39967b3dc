//! Linear resampling of a trace onto a new time axis.

use super::time_axis::TimeAxis;
use crate::util::{is_undefined, UNDEF};

/// Resample `trace` (sampled on `old`) onto `new`.
///
/// Output samples outside the old axis range are undefined. A sample whose
/// bracketing pair contains an undefined value is undefined as well: the
/// sentinel is never interpolated across. Interpolation runs in f64, the
/// result is cast back to f32.
pub fn resample_trace(trace: &[f32], old: TimeAxis, new: TimeAxis) -> Vec<f32> {
    debug_assert_eq!(trace.len(), old.n_samples as usize);
    let n_old = old.n_samples as usize;
    (0..new.n_samples)
        .map(|k| {
            let t = new.sample_time(k);
            let idx = (t - old.origin) / old.step;
            if idx < 0.0 || idx > (n_old - 1) as f64 {
                return UNDEF;
            }
            let i = idx.floor() as usize;
            let alpha = idx - i as f64;
            if i == n_old - 1 {
                return trace[i];
            }
            if is_undefined(trace[i]) || is_undefined(trace[i + 1]) {
                return UNDEF;
            }
            (f64::from(trace[i]) * (1.0 - alpha) + f64::from(trace[i + 1]) * alpha) as f32
        })
        .collect()
}
