//! Particle field storage using struct-of-arrays layout for GPU-readiness.

/// Struct-of-arrays particle field set.
///
/// All arrays are parallel: index `i` across every array refers to the same
/// particle. Separate x/y/z arrays (rather than a vector type) are used
/// deliberately for straightforward GPU buffer mapping.
///
/// The summation backends read the input arrays and overwrite only the output
/// arrays of the pass being computed (`ro` for density; the `c*` tensor for
/// IAD; `grad_p_*`, `du`, `maxvsignal` for momentum-energy). Particles not
/// owned by any task keep their previous output values.
#[derive(Debug, Clone)]
pub struct ParticleFields {
    // ---- Positions ----
    /// X positions
    pub x: Vec<f32>,
    /// Y positions
    pub y: Vec<f32>,
    /// Z positions
    pub z: Vec<f32>,

    // ---- Velocities ----
    /// X velocities
    pub vx: Vec<f32>,
    /// Y velocities
    pub vy: Vec<f32>,
    /// Z velocities
    pub vz: Vec<f32>,

    // ---- Per-particle scalars ----
    /// Smoothing length
    pub h: Vec<f32>,
    /// Particle mass
    pub m: Vec<f32>,
    /// Density (output of the density pass)
    pub ro: Vec<f32>,
    /// Specific internal energy
    pub u: Vec<f32>,
    /// Pressure (set by the equation of state between passes)
    pub p: Vec<f32>,
    /// Speed of sound (set by the equation of state between passes)
    pub c: Vec<f32>,

    // ---- IAD tensor (output of the IAD pass) ----
    /// Tensor component (1,1)
    pub c11: Vec<f32>,
    /// Tensor component (1,2)
    pub c12: Vec<f32>,
    /// Tensor component (1,3)
    pub c13: Vec<f32>,
    /// Tensor component (2,2)
    pub c22: Vec<f32>,
    /// Tensor component (2,3)
    pub c23: Vec<f32>,
    /// Tensor component (3,3)
    pub c33: Vec<f32>,

    // ---- Momentum-energy outputs ----
    /// Pressure-gradient acceleration, x component (`dv_x/dt = -grad_p_x`)
    pub grad_p_x: Vec<f32>,
    /// Pressure-gradient acceleration, y component
    pub grad_p_y: Vec<f32>,
    /// Pressure-gradient acceleration, z component
    pub grad_p_z: Vec<f32>,
    /// Internal energy change rate
    pub du: Vec<f32>,
    /// Per-particle maximum signal velocity, for the Courant timestep
    pub maxvsignal: Vec<f32>,

    /// Kernel shape exponent, applied to the tabulated base kernel as an
    /// integer power.
    pub sinc_index: u32,
    /// Kernel normalization constant K. Callers set this from
    /// [`crate::table::sinc_3d_normalization`] (or 1.0 for synthetic tables).
    pub k_norm: f32,
}

impl ParticleFields {
    /// Create an empty field set with no particles allocated.
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            vx: Vec::new(),
            vy: Vec::new(),
            vz: Vec::new(),
            h: Vec::new(),
            m: Vec::new(),
            ro: Vec::new(),
            u: Vec::new(),
            p: Vec::new(),
            c: Vec::new(),
            c11: Vec::new(),
            c12: Vec::new(),
            c13: Vec::new(),
            c22: Vec::new(),
            c23: Vec::new(),
            c33: Vec::new(),
            grad_p_x: Vec::new(),
            grad_p_y: Vec::new(),
            grad_p_z: Vec::new(),
            du: Vec::new(),
            maxvsignal: Vec::new(),
            sinc_index: 6,
            k_norm: 1.0,
        }
    }

    /// Resize every array to `n` particles, zero-filling new entries.
    pub fn resize(&mut self, n: usize) {
        for arr in self.arrays_mut() {
            arr.resize(n, 0.0);
        }
    }

    /// Number of particles currently stored.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// `true` if there are no particles.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Append a single particle with the given position, smoothing length,
    /// and mass. All other fields are initialized to zero.
    pub fn push_particle(&mut self, px: f32, py: f32, pz: f32, h: f32, m: f32) {
        let n = self.len();
        self.resize(n + 1);
        self.x[n] = px;
        self.y[n] = py;
        self.z[n] = pz;
        self.h[n] = h;
        self.m[n] = m;
    }

    /// Check the parallel-array invariant and return the common length.
    pub(crate) fn check_lengths(&self) -> Result<usize, crate::EngineError> {
        let n = self.x.len();
        let named: [(&'static str, usize); 22] = [
            ("y", self.y.len()),
            ("z", self.z.len()),
            ("vx", self.vx.len()),
            ("vy", self.vy.len()),
            ("vz", self.vz.len()),
            ("h", self.h.len()),
            ("m", self.m.len()),
            ("ro", self.ro.len()),
            ("u", self.u.len()),
            ("p", self.p.len()),
            ("c", self.c.len()),
            ("c11", self.c11.len()),
            ("c12", self.c12.len()),
            ("c13", self.c13.len()),
            ("c22", self.c22.len()),
            ("c23", self.c23.len()),
            ("c33", self.c33.len()),
            ("grad_p_x", self.grad_p_x.len()),
            ("grad_p_y", self.grad_p_y.len()),
            ("grad_p_z", self.grad_p_z.len()),
            ("du", self.du.len()),
            ("maxvsignal", self.maxvsignal.len()),
        ];
        for (field, len) in named {
            if len != n {
                return Err(crate::EngineError::FieldLengthMismatch {
                    field,
                    len,
                    expected: n,
                });
            }
        }
        Ok(n)
    }

    fn arrays_mut(&mut self) -> [&mut Vec<f32>; 23] {
        [
            &mut self.x,
            &mut self.y,
            &mut self.z,
            &mut self.vx,
            &mut self.vy,
            &mut self.vz,
            &mut self.h,
            &mut self.m,
            &mut self.ro,
            &mut self.u,
            &mut self.p,
            &mut self.c,
            &mut self.c11,
            &mut self.c12,
            &mut self.c13,
            &mut self.c22,
            &mut self.c23,
            &mut self.c33,
            &mut self.grad_p_x,
            &mut self.grad_p_y,
            &mut self.grad_p_z,
            &mut self.du,
            &mut self.maxvsignal,
        ]
    }
}

impl Default for ParticleFields {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields() {
        let f = ParticleFields::new();
        assert_eq!(f.len(), 0);
        assert!(f.is_empty());
        assert!(f.check_lengths().is_ok());
    }

    #[test]
    fn push_and_len() {
        let mut f = ParticleFields::new();
        f.push_particle(1.0, 2.0, 3.0, 0.1, 0.5);
        assert_eq!(f.len(), 1);
        assert_eq!(f.x[0], 1.0);
        assert_eq!(f.h[0], 0.1);
        assert_eq!(f.m[0], 0.5);
        assert_eq!(f.ro[0], 0.0);
        assert_eq!(f.du[0], 0.0);
    }

    #[test]
    fn length_mismatch_detected() {
        let mut f = ParticleFields::new();
        f.resize(4);
        f.ro.pop();
        let err = f.check_lengths().unwrap_err();
        assert!(err.to_string().contains("ro"));
    }
}
