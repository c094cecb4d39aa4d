//! Ideal-gas equation of state.
//!
//! Applied between the density and IAD passes: pressure and sound speed are
//! per-particle transforms of the freshly summed density and the current
//! internal energy.

use kernel::ParticleFields;

/// Adiabatic index of a monatomic ideal gas.
pub const DEFAULT_GAMMA: f32 = 5.0 / 3.0;

/// Ideal-gas equation of state:
///
/// ```text
/// P = (gamma - 1) * rho * u
/// c = sqrt(gamma * P / rho)
/// ```
///
/// Writes `fields.p` and `fields.c` for every particle.
pub fn ideal_gas(fields: &mut ParticleFields, gamma: f32) {
    for i in 0..fields.len() {
        let u = fields.u[i].max(0.0);
        let p = (gamma - 1.0) * fields.ro[i] * u;
        fields.p[i] = p;
        fields.c[i] = (gamma * p / fields.ro[i]).sqrt();
    }
}
