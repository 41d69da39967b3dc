//! 1D time/depth sampling axis.

/// Regular sampling along the vertical axis of a cube or line.
///
/// `step` is signed; a positive step means the stored samples run downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeAxis {
    pub origin: f64,
    pub step: f64,
    pub n_samples: u32,
}

impl TimeAxis {
    pub fn new(origin: f64, step: f64, n_samples: u32) -> Self {
        assert!(n_samples > 0, "time axis needs at least one sample");
        Self {
            origin,
            step,
            n_samples,
        }
    }

    /// Time of sample `k`.
    #[inline]
    pub fn sample_time(&self, k: u32) -> f64 {
        self.origin + self.step * f64::from(k)
    }

    /// Time of the last sample: `origin + step * (n - 1)`.
    #[inline]
    pub fn last_sample_time(&self) -> f64 {
        self.origin + self.step * f64::from(self.n_samples - 1)
    }
}

/// Joint axis covering two axes at the finer of their two steps.
///
/// The earlier origin is rounded up to the nearest multiple of the joint
/// step; the sample count reaches the later of the two last-sample times,
/// both computed as `origin + step * (n - 1)`. The result is symmetric in
/// its arguments.
pub fn join_time_axes(t1: TimeAxis, t2: TimeAxis) -> TimeAxis {
    let new_step = t1.step.min(t2.step);
    let new_origin = (t1.origin.min(t2.origin) / new_step).ceil() * new_step;
    let last = t1.last_sample_time().max(t2.last_sample_time());
    let new_n = ((last - new_origin) / new_step).floor() as u32 + 1;
    TimeAxis::new(new_origin, new_step, new_n)
}
