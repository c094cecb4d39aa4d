//! Tabulated radial smoothing kernel.
//!
//! The accumulation kernels evaluate the smoothing kernel once per neighbor
//! pair per field per particle, so the kernel is tabulated once at startup
//! and evaluated by clamped, position-indexed linear interpolation instead of
//! analytically. The table samples the *base* kernel `sinc(pi v / 2)` over
//! the normalized-distance domain [0, 2]; the shape exponent and the
//! normalization constant are applied at evaluation sites.

use std::f32::consts::PI;

use crate::EngineError;

/// Upper bound of the normalized-distance domain (kernel support radius in
/// units of the smoothing length).
pub const SUPPORT_RADIUS: f32 = 2.0;

/// Equal-length tabulations of a radial kernel and its derivative over
/// [0, [`SUPPORT_RADIUS`]], with uniform sample spacing.
///
/// Built once per run and read-only thereafter. Evaluation beyond the upper
/// bound returns the vanishing tail (0) for both value and derivative; the
/// sinc base vanishes at the support edge, so the policy is continuous there.
#[derive(Debug, Clone)]
pub struct KernelTable {
    values: Vec<f32>,
    derivatives: Vec<f32>,
    step: f32,
}

impl KernelTable {
    /// Build a table from externally supplied samples.
    ///
    /// Both sequences must have the same length of at least two samples and
    /// are assumed uniformly spaced over [0, [`SUPPORT_RADIUS`]].
    pub fn from_samples(values: Vec<f32>, derivatives: Vec<f32>) -> Result<Self, EngineError> {
        if values.len() != derivatives.len() || values.len() < 2 {
            return Err(EngineError::TableShape {
                values: values.len(),
                derivatives: derivatives.len(),
            });
        }
        let step = SUPPORT_RADIUS / (values.len() - 1) as f32;
        Ok(Self {
            values,
            derivatives,
            step,
        })
    }

    /// Tabulate the normalized sinc kernel base `sin(pi v / 2) / (pi v / 2)`
    /// and its derivative with `len` samples.
    pub fn sinc(len: usize) -> Self {
        assert!(len >= 2, "kernel table needs at least two samples");
        let step = SUPPORT_RADIUS / (len - 1) as f32;
        let values = (0..len).map(|i| sinc_base(i as f32 * step)).collect();
        let derivatives = (0..len)
            .map(|i| sinc_base_derivative(i as f32 * step))
            .collect();
        Self {
            values,
            derivatives,
            step,
        }
    }

    /// Number of samples in each tabulation.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if the table holds no samples (not constructible, but kept for
    /// API symmetry).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Uniform sample spacing in normalized distance.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Raw value samples (for upload to device memory).
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Raw derivative samples (for upload to device memory).
    pub fn derivatives(&self) -> &[f32] {
        &self.derivatives
    }

    /// Interpolated kernel value at normalized distance `v`.
    #[inline]
    pub fn value_at(&self, v: f32) -> f32 {
        self.sample(&self.values, v)
    }

    /// Interpolated kernel derivative at normalized distance `v`.
    #[inline]
    pub fn derivative_at(&self, v: f32) -> f32 {
        self.sample(&self.derivatives, v)
    }

    /// Position-indexed lookup: `idx = floor(v / step)` clamped to
    /// `[0, len - 2]`, then linear interpolation to the next sample.
    #[inline]
    fn sample(&self, data: &[f32], v: f32) -> f32 {
        debug_assert!(v >= 0.0, "normalized distance must be non-negative");
        if v >= SUPPORT_RADIUS {
            return 0.0;
        }
        let pos = v / self.step;
        let idx = (pos as usize).min(data.len() - 2);
        let frac = pos - idx as f32;
        data[idx] + (data[idx + 1] - data[idx]) * frac
    }
}

/// Base kernel `sin(x) / x` with `x = pi v / 2`, continuous at v = 0.
fn sinc_base(v: f32) -> f32 {
    let x = 0.5 * PI * v;
    if x < 1.0e-4 {
        return 1.0 - x * x / 6.0;
    }
    x.sin() / x
}

/// Derivative of [`sinc_base`] with respect to v.
fn sinc_base_derivative(v: f32) -> f32 {
    let x = 0.5 * PI * v;
    if x < 1.0e-4 {
        // Series expansion: d/dx (sin x / x) = -x/3 + x^3/30 + ...
        return 0.5 * PI * (-x / 3.0 + x * x * x / 30.0);
    }
    0.5 * PI * (x.cos() / x - x.sin() / (x * x))
}

/// Normalization constant K for the 3D kernel `K * sinc(pi v / 2)^n / h^3`,
/// obtained from `4 pi K * integral_0^2 sinc(pi v / 2)^n v^2 dv = 1` by
/// composite Simpson quadrature.
pub fn sinc_3d_normalization(sinc_index: u32) -> f32 {
    let intervals = 4000usize; // even
    let dv = SUPPORT_RADIUS as f64 / intervals as f64;
    let f = |v: f64| -> f64 {
        let w = sinc_base(v as f32) as f64;
        w.powi(sinc_index as i32) * v * v
    };
    let mut sum = f(0.0) + f(SUPPORT_RADIUS as f64);
    for i in 1..intervals {
        let coeff = if i % 2 == 1 { 4.0 } else { 2.0 };
        sum += coeff * f(i as f64 * dv);
    }
    let integral = sum * dv / 3.0;
    (1.0 / (4.0 * std::f64::consts::PI * integral)) as f32
}
