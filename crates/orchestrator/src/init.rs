//! Initial condition generation: lattice fill and the Noh implosion setup.

use kernel::{sinc_3d_normalization, BoundingBox, ParticleFields};

use crate::config::SimulationConfig;

/// Place particles on a regular lattice filling the configured domain and
/// initialize masses, smoothing lengths, and thermodynamic fields.
///
/// Mass is `total_mass / n`; the smoothing length targets `ng0` neighbors.
pub fn lattice(config: &SimulationConfig) -> (ParticleFields, BoundingBox) {
    let bbox = config.bounding_box();
    let n_side = config.n_side as usize;
    let n = n_side * n_side * n_side;

    let h = config.initial_smoothing_length();
    let mass = config.total_mass / n as f32;
    let ro_guess = config.total_mass / config.volume();

    let (ex, ey, ez) = bbox.extents();
    let dx = ex / n_side as f32;
    let dy = ey / n_side as f32;
    let dz = ez / n_side as f32;

    let mut fields = ParticleFields::new();
    for ix in 0..n_side {
        for iy in 0..n_side {
            for iz in 0..n_side {
                fields.push_particle(
                    bbox.xmin + (ix as f32 + 0.5) * dx,
                    bbox.ymin + (iy as f32 + 0.5) * dy,
                    bbox.zmin + (iz as f32 + 0.5) * dz,
                    h,
                    mass,
                );
            }
        }
    }

    for i in 0..n {
        fields.u[i] = config.initial_energy;
        fields.ro[i] = ro_guess;
    }
    fields.sinc_index = config.sinc_index;
    fields.k_norm = sinc_3d_normalization(config.sinc_index);

    tracing::info!(
        "lattice init: {} particles, h = {:.4}, m = {:.3e}",
        n,
        h,
        mass
    );

    (fields, bbox)
}

/// Noh implosion velocity field: unit speed directed at the domain center.
///
/// Particles at the center itself stay at rest.
pub fn apply_noh_velocity(fields: &mut ParticleFields, bbox: &BoundingBox) {
    let cx = 0.5 * (bbox.xmin + bbox.xmax);
    let cy = 0.5 * (bbox.ymin + bbox.ymax);
    let cz = 0.5 * (bbox.zmin + bbox.zmax);

    for i in 0..fields.len() {
        let rx = fields.x[i] - cx;
        let ry = fields.y[i] - cy;
        let rz = fields.z[i] - cz;
        let r = (rx * rx + ry * ry + rz * rz).sqrt();
        if r > 1.0e-12 {
            fields.vx[i] = -rx / r;
            fields.vy[i] = -ry / r;
            fields.vz[i] = -rz / r;
        }
    }
}
