//! Axis-aligned simulation domain with per-axis periodicity.
//!
//! The minimum-image distance defined here is the single geometric metric of
//! the whole pipeline: the neighbor-finding stage and the accumulation
//! kernels must agree on which particle pairs are close, so the WGSL shaders
//! mirror `min_image_delta` with the same if/else formulation.

/// Axis-aligned bounding box with a periodicity flag per axis.
///
/// Immutable for the duration of one summation call; the surrounding
/// simulation may move the bounds between timesteps.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    /// Minimum x extent
    pub xmin: f32,
    /// Maximum x extent
    pub xmax: f32,
    /// Minimum y extent
    pub ymin: f32,
    /// Maximum y extent
    pub ymax: f32,
    /// Minimum z extent
    pub zmin: f32,
    /// Maximum z extent
    pub zmax: f32,
    /// Whether the x axis wraps around
    pub periodic_x: bool,
    /// Whether the y axis wraps around
    pub periodic_y: bool,
    /// Whether the z axis wraps around
    pub periodic_z: bool,
}

/// Shift `d` by one full extent when it exceeds half the extent.
#[inline]
fn wrap_delta(d: f32, extent: f32, periodic: bool) -> f32 {
    if periodic {
        if d > 0.5 * extent {
            return d - extent;
        } else if d < -0.5 * extent {
            return d + extent;
        }
    }
    d
}

impl BoundingBox {
    /// Create a box from its six extents and three periodicity flags.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        xmin: f32,
        xmax: f32,
        ymin: f32,
        ymax: f32,
        zmin: f32,
        zmax: f32,
        periodic_x: bool,
        periodic_y: bool,
        periodic_z: bool,
    ) -> Self {
        debug_assert!(xmax > xmin && ymax > ymin && zmax > zmin);
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
            zmin,
            zmax,
            periodic_x,
            periodic_y,
            periodic_z,
        }
    }

    /// A cube `[lo, hi]^3` with the same periodicity on all axes.
    pub fn cube(lo: f32, hi: f32, periodic: bool) -> Self {
        Self::new(lo, hi, lo, hi, lo, hi, periodic, periodic, periodic)
    }

    /// Per-axis extents (x, y, z).
    pub fn extents(&self) -> (f32, f32, f32) {
        (
            self.xmax - self.xmin,
            self.ymax - self.ymin,
            self.zmax - self.zmin,
        )
    }

    /// Displacement from Q to P under the minimum-image convention.
    ///
    /// On each periodic axis a raw delta beyond half the extent is shifted by
    /// one full extent; non-periodic axes pass through unmodified.
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub fn min_image_delta(
        &self,
        x1: f32,
        y1: f32,
        z1: f32,
        x2: f32,
        y2: f32,
        z2: f32,
    ) -> (f32, f32, f32) {
        let (ex, ey, ez) = self.extents();
        (
            wrap_delta(x1 - x2, ex, self.periodic_x),
            wrap_delta(y1 - y2, ey, self.periodic_y),
            wrap_delta(z1 - z2, ez, self.periodic_z),
        )
    }

    /// Euclidean distance between P and Q under the minimum-image convention.
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub fn distance(&self, x1: f32, y1: f32, z1: f32, x2: f32, y2: f32, z2: f32) -> f32 {
        let (dx, dy, dz) = self.min_image_delta(x1, y1, z1, x2, y2, z2);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Map a position back into the box on periodic axes.
    ///
    /// Used by the time integrator after a drift; non-periodic axes are left
    /// untouched.
    pub fn wrap_position(&self, x: f32, y: f32, z: f32) -> (f32, f32, f32) {
        let (ex, ey, ez) = self.extents();
        let wrap = |v: f32, lo: f32, extent: f32, periodic: bool| -> f32 {
            if !periodic {
                return v;
            }
            let mut w = v;
            while w < lo {
                w += extent;
            }
            while w >= lo + extent {
                w -= extent;
            }
            w
        };
        (
            wrap(x, self.xmin, ex, self.periodic_x),
            wrap(y, self.ymin, ey, self.periodic_y),
            wrap(z, self.zmin, ez, self.periodic_z),
        )
    }
}
