//! Affine 2D survey grid geometry.

use glam::{DVec2, DVec3};

use crate::util::round_half_up;

/// Regular 3D survey grid: an origin, two horizontal step vectors and the
/// trace counts along them.
///
/// `v_i` and `v_x` are expected to be mutually orthogonal with zero depth
/// component; this is an assumption of the format, not verified here.
/// The origin's z component carries the time-axis origin of the cube the
/// geometry belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    origin: DVec3,
    v_i: DVec2,
    v_x: DVec2,
    n_i: u32,
    n_x: u32,
    norm_v_i: f64,
    norm_v_x: f64,
}

impl GridGeometry {
    /// Create a grid geometry. Panics when either trace count is zero.
    pub fn new(origin: DVec3, v_i: DVec2, v_x: DVec2, n_i: u32, n_x: u32) -> Self {
        assert!(n_i > 0 && n_x > 0, "grid counts must be positive");
        Self {
            origin,
            v_i,
            v_x,
            n_i,
            n_x,
            norm_v_i: v_i.length(),
            norm_v_x: v_x.length(),
        }
    }

    #[inline]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    #[inline]
    pub fn v_i(&self) -> DVec2 {
        self.v_i
    }

    #[inline]
    pub fn v_x(&self) -> DVec2 {
        self.v_x
    }

    #[inline]
    pub fn n_i(&self) -> u32 {
        self.n_i
    }

    #[inline]
    pub fn n_x(&self) -> u32 {
        self.n_x
    }

    /// Total number of traces in the grid.
    #[inline]
    pub fn num_traces(&self) -> u64 {
        u64::from(self.n_i) * u64::from(self.n_x)
    }

    /// Same grid with a different origin z (time-axis origin).
    pub fn with_origin_z(mut self, z: f64) -> Self {
        self.origin.z = z;
        self
    }

    /// Horizontal origin.
    #[inline]
    pub fn origin_xy(&self) -> DVec2 {
        DVec2::new(self.origin.x, self.origin.y)
    }

    /// True when `p` lies inside the grid footprint.
    ///
    /// The projections onto `v_i`/`v_x` are fractional grid coordinates
    /// (scalar product divided by the squared norm); the upper bound is
    /// half-open, so the far edge of the grid is outside.
    pub fn contains_point(&self, p: DVec2) -> bool {
        let po = p - self.origin_xy();
        let iinl = po.dot(self.v_i) / (self.norm_v_i * self.norm_v_i);
        let ixl = po.dot(self.v_x) / (self.norm_v_x * self.norm_v_x);
        iinl >= 0.0 && iinl < f64::from(self.n_i) && ixl >= 0.0 && ixl < f64::from(self.n_x)
    }

    /// Nearest (inline, crossline) indices for a world coordinate.
    ///
    /// Results outside the grid are returned as-is; callers bound-check.
    pub fn grid_indices(&self, p: DVec2) -> (i64, i64) {
        let rel = p - self.origin_xy();
        let inl_coord = self.v_i.dot(rel) / self.norm_v_i;
        let xln_coord = self.v_x.dot(rel) / self.norm_v_x;
        let inl = round_half_up(inl_coord / self.norm_v_i);
        let xln = round_half_up(xln_coord / self.norm_v_x);
        (inl as i64, xln as i64)
    }

    /// World coordinate of the grid cell `(inl, xln)`.
    pub fn cell_coordinates(&self, inl: i64, xln: i64) -> DVec2 {
        self.origin_xy() + self.v_i * inl as f64 + self.v_x * xln as f64
    }

    /// The four corner coordinates of the grid footprint.
    pub fn corners(&self) -> [DVec3; 4] {
        let vi = self.v_i * f64::from(self.n_i);
        let vx = self.v_x * f64::from(self.n_x);
        let ext = |v: DVec2| self.origin + DVec3::new(v.x, v.y, 0.0);
        [self.origin, ext(vi), ext(vx), ext(vi + vx)]
    }

    /// Row-major iterator over all `(inline, crossline)` cells.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.n_i).flat_map(move |i| (0..self.n_x).map(move |j| (i, j)))
    }

    /// Bounding grid aligned to this geometry's step vectors that covers
    /// `self` and every geometry in `others`.
    ///
    /// Every corner of every input is projected onto `v_i`/`v_x` as a signed
    /// scalar distance (divided by the norm, not the squared norm). The
    /// minimum bound is floored to an exact multiple of the step norms so the
    /// new origin stays on this grid; the counts are rounded up to cover the
    /// maximum bound.
    pub fn wraparound(&self, others: &[GridGeometry]) -> GridGeometry {
        let mut v_min = DVec2::ZERO;
        let mut v_max = DVec2::new(
            self.norm_v_i * f64::from(self.n_i),
            self.norm_v_x * f64::from(self.n_x),
        );
        for g in others {
            for corner in g.corners() {
                let delta = DVec2::new(corner.x - self.origin.x, corner.y - self.origin.y);
                let proj = DVec2::new(
                    self.v_i.dot(delta) / self.norm_v_i,
                    self.v_x.dot(delta) / self.norm_v_x,
                );
                v_min = v_min.min(proj);
                v_max = v_max.max(proj);
            }
        }
        v_min = DVec2::new(
            (v_min.x / self.norm_v_i).floor() * self.norm_v_i,
            (v_min.y / self.norm_v_x).floor() * self.norm_v_x,
        );
        let lowest_corner =
            self.v_i * (v_min.x / self.norm_v_i) + self.v_x * (v_min.y / self.norm_v_x);
        let new_origin = self.origin + DVec3::new(lowest_corner.x, lowest_corner.y, 0.0);
        let new_n_i = ((v_max.x - v_min.x) / self.norm_v_i).ceil() as u32;
        let new_n_x = ((v_max.y - v_min.y) / self.norm_v_x).ceil() as u32;
        GridGeometry::new(new_origin, self.v_i, self.v_x, new_n_i, new_n_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridGeometry {
        GridGeometry::new(
            DVec3::new(10.0, 20.0, 1700.0),
            DVec2::new(0.5, 0.0),
            DVec2::new(0.0, 1.5),
            5,
            6,
        )
    }

    #[test]
    #[should_panic(expected = "grid counts must be positive")]
    fn test_zero_counts_panic() {
        GridGeometry::new(DVec3::ZERO, DVec2::X, DVec2::Y, 0, 1);
    }

    #[test]
    fn test_containment_boundary() {
        let g = grid();
        // origin is inside, the far edge along v_i is not (half-open bound)
        assert!(g.contains_point(DVec2::new(10.0, 20.0)));
        let far = g.origin_xy() + g.v_i() * 5.0;
        assert!(!g.contains_point(far));
        assert!(!g.contains_point(DVec2::new(-1.0, -2.0)));
        assert!(g.contains_point(DVec2::new(11.0, 22.0)));
    }

    #[test]
    fn test_grid_index_round_trip() {
        // orthogonal grid: index -> coordinate -> index is the identity
        let g = GridGeometry::new(
            DVec3::ZERO,
            DVec2::new(1.0 / 2f64.sqrt(), 1.0 / 2f64.sqrt()),
            DVec2::new(1.0 / 2f64.sqrt(), -1.0 / 2f64.sqrt()),
            4,
            3,
        );
        for i in 0..4i64 {
            for j in 0..3i64 {
                let p = g.cell_coordinates(i, j);
                assert_eq!(g.grid_indices(p), (i, j), "cell ({i}, {j})");
            }
        }
    }

    #[test]
    fn test_grid_indices_out_of_range_returned_as_is() {
        let g = GridGeometry::new(DVec3::ZERO, DVec2::X, DVec2::Y, 2, 2);
        assert_eq!(g.grid_indices(DVec2::new(-3.0, 5.0)), (-3, 5));
    }

    #[test]
    fn test_corners() {
        let g = GridGeometry::new(DVec3::new(0.0, 0.0, 100.0), DVec2::X, DVec2::Y, 2, 3);
        let c = g.corners();
        assert_eq!(c[0], DVec3::new(0.0, 0.0, 100.0));
        assert_eq!(c[1], DVec3::new(2.0, 0.0, 100.0));
        assert_eq!(c[2], DVec3::new(0.0, 3.0, 100.0));
        assert_eq!(c[3], DVec3::new(2.0, 3.0, 100.0));
    }

    #[test]
    fn test_wraparound_contained_cube_keeps_extent() {
        let reference = GridGeometry::new(DVec3::new(0.0, 0.0, 100.0), DVec2::X, DVec2::Y, 2, 2);
        let inner = GridGeometry::new(
            DVec3::new(0.5, 0.5, 100.0),
            DVec2::new(0.5, 0.0),
            DVec2::new(0.0, 0.5),
            2,
            2,
        );
        let wrap = reference.wraparound(&[inner]);
        assert_eq!(wrap.n_i(), 2);
        assert_eq!(wrap.n_x(), 2);
        assert_eq!(wrap.origin(), reference.origin());
        assert_eq!(wrap.v_i(), reference.v_i());
        assert_eq!(wrap.v_x(), reference.v_x());
    }

    #[test]
    fn test_wraparound_covers_disjoint_cube() {
        let a = GridGeometry::new(DVec3::new(0.0, 0.0, 100.0), DVec2::X, DVec2::Y, 1, 1);
        let b = GridGeometry::new(DVec3::new(10.0, 0.0, 100.0), DVec2::X, DVec2::Y, 1, 1);
        let wrap = a.wraparound(&[b]);
        assert_eq!(wrap.origin(), a.origin());
        assert_eq!(wrap.n_i(), 11);
        assert_eq!(wrap.n_x(), 1);
        // every corner of b projects inside the wrapped footprint
        for corner in b.corners() {
            let p = DVec2::new(corner.x, corner.y);
            // the far corner sits exactly on the half-open bound
            let po = p - wrap.origin_xy();
            let fi = po.dot(wrap.v_i()) / (wrap.v_i().length_squared());
            assert!(fi >= 0.0 && fi <= f64::from(wrap.n_i()));
        }
    }

    #[test]
    fn test_wraparound_negative_offset_aligns_origin() {
        let reference = GridGeometry::new(
            DVec3::new(0.0, 0.0, 100.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 2.0),
            2,
            2,
        );
        let shifted = GridGeometry::new(
            DVec3::new(-3.0, -1.0, 100.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(0.0, 2.0),
            1,
            1,
        );
        let wrap = reference.wraparound(&[shifted]);
        // origin moved down to a multiple of the step norms
        assert_eq!(wrap.origin(), DVec3::new(-4.0, -2.0, 100.0));
        assert_eq!(wrap.n_i(), 4);
        assert_eq!(wrap.n_x(), 3);
    }
}
