//! Per-pair accumulation formulas and the CPU summation loops.
//!
//! All three passes share one execution shape: one logical worker per owned
//! particle, a local accumulator, a loop over that particle's valid neighbors
//! (bounded by the stored count, never the padded capacity), and a single
//! write to the owned particle's output slot. They differ only in the
//! per-neighbor formula and output arity. The WGSL shaders in `gpu/shaders/`
//! mirror these loops statement for statement so both backends agree.
//!
//! Governing equations beyond density follow the integral approach to
//! derivatives (IAD): the pressure gradient is formed from tensor-corrected
//! kernel values rather than the kernel derivative, with Monaghan artificial
//! viscosity on approaching pairs.

use crate::bbox::BoundingBox;
use crate::field::ParticleFields;
use crate::table::KernelTable;
use crate::task::Task;

/// Monaghan artificial viscosity, linear coefficient.
const VISC_ALPHA: f32 = 1.0;
/// Monaghan artificial viscosity, quadratic coefficient.
const VISC_BETA: f32 = 2.0;
/// Softening fraction of h^2 in the viscosity denominator.
const VISC_EPSILON: f32 = 0.01;

/// Normalized kernel weight `K * W(v)^sinc / h^3`.
#[inline]
fn wharmonic(table: &KernelTable, v: f32, h: f32, sinc_index: u32, k_norm: f32) -> f32 {
    k_norm * table.value_at(v).powi(sinc_index as i32) / (h * h * h)
}

/// Density summation: self term plus tabulated-kernel neighbor terms.
///
/// `ro_i = m_i * K / h_i^3 + sum_j m_j * K * W(r_ij / h_i)^sinc / h_i^3`
///
/// Assumes the task batch has already been validated.
pub fn compute_density(
    tasks: &[Task],
    fields: &mut ParticleFields,
    table: &KernelTable,
    bbox: &BoundingBox,
) {
    let sinc_index = fields.sinc_index;
    let k_norm = fields.k_norm;

    for task in tasks {
        for k in 0..task.len() {
            let i = task.clist[k] as usize;
            let hi = fields.h[i];
            // W(0) = 1, so the self term carries no kernel power.
            let mut ro = fields.m[i] * k_norm / (hi * hi * hi);

            for &j in task.neighbors_of(k) {
                let j = j as usize;
                let dist = bbox.distance(
                    fields.x[i],
                    fields.y[i],
                    fields.z[i],
                    fields.x[j],
                    fields.y[j],
                    fields.z[j],
                );
                ro += wharmonic(table, dist / hi, hi, sinc_index, k_norm) * fields.m[j];
            }
            fields.ro[i] = ro;
        }
    }
}

/// IAD tensor: accumulate the symmetric moment matrix
/// `tau_ab = sum_j (m_j / ro_j) * d_a * d_b * w_ij` and store its inverse.
///
/// A near-singular matrix (fewer than three non-coplanar neighbors) falls
/// back to a zero tensor, so the affected particle contributes no pressure
/// gradient instead of dividing by ~0.
pub fn compute_iad(
    tasks: &[Task],
    fields: &mut ParticleFields,
    table: &KernelTable,
    bbox: &BoundingBox,
) {
    let sinc_index = fields.sinc_index;
    let k_norm = fields.k_norm;

    for task in tasks {
        for k in 0..task.len() {
            let i = task.clist[k] as usize;
            let hi = fields.h[i];

            let (mut t11, mut t12, mut t13) = (0.0_f32, 0.0_f32, 0.0_f32);
            let (mut t22, mut t23, mut t33) = (0.0_f32, 0.0_f32, 0.0_f32);

            for &j in task.neighbors_of(k) {
                let j = j as usize;
                let (dx, dy, dz) = bbox.min_image_delta(
                    fields.x[i],
                    fields.y[i],
                    fields.z[i],
                    fields.x[j],
                    fields.y[j],
                    fields.z[j],
                );
                let dist = (dx * dx + dy * dy + dz * dz).sqrt();
                let w = wharmonic(table, dist / hi, hi, sinc_index, k_norm);
                let mj_roj = fields.m[j] / fields.ro[j];

                t11 += mj_roj * dx * dx * w;
                t12 += mj_roj * dx * dy * w;
                t13 += mj_roj * dx * dz * w;
                t22 += mj_roj * dy * dy * w;
                t23 += mj_roj * dy * dz * w;
                t33 += mj_roj * dz * dz * w;
            }

            let det = t11 * (t22 * t33 - t23 * t23) - t12 * (t12 * t33 - t13 * t23)
                + t13 * (t12 * t23 - t13 * t22);

            if det.abs() > 1.0e-20 {
                let inv = 1.0 / det;
                fields.c11[i] = (t22 * t33 - t23 * t23) * inv;
                fields.c12[i] = (t13 * t23 - t12 * t33) * inv;
                fields.c13[i] = (t12 * t23 - t13 * t22) * inv;
                fields.c22[i] = (t11 * t33 - t13 * t13) * inv;
                fields.c23[i] = (t13 * t12 - t11 * t23) * inv;
                fields.c33[i] = (t11 * t22 - t12 * t12) * inv;
            } else {
                fields.c11[i] = 0.0;
                fields.c12[i] = 0.0;
                fields.c13[i] = 0.0;
                fields.c22[i] = 0.0;
                fields.c23[i] = 0.0;
                fields.c33[i] = 0.0;
            }
        }
    }
}

/// Momentum and energy update with IAD gradient terms.
///
/// Per pair: symmetrized tensor-corrected kernel terms
/// `termA_i = -(C_i . d) * w_i`, pressure factors `p / ro^2`, Monaghan
/// artificial viscosity on approaching pairs, and the signal velocity
/// `c_i + c_j - 3 * min(0, rv / r)` tracked as a per-particle maximum.
/// Writes `grad_p_{x,y,z}` (so that `dv/dt = -grad_p`), `du`, and
/// `maxvsignal`.
pub fn compute_momentum_energy(
    tasks: &[Task],
    fields: &mut ParticleFields,
    table: &KernelTable,
    bbox: &BoundingBox,
) {
    let sinc_index = fields.sinc_index;
    let k_norm = fields.k_norm;

    for task in tasks {
        for k in 0..task.len() {
            let i = task.clist[k] as usize;
            let hi = fields.h[i];
            let pro_i = fields.p[i] / (fields.ro[i] * fields.ro[i]);

            let (mut gpx, mut gpy, mut gpz) = (0.0_f32, 0.0_f32, 0.0_f32);
            let mut edot = 0.0_f32;
            let mut maxv = 0.0_f32;

            for &j in task.neighbors_of(k) {
                let j = j as usize;
                let (dx, dy, dz) = bbox.min_image_delta(
                    fields.x[i],
                    fields.y[i],
                    fields.z[i],
                    fields.x[j],
                    fields.y[j],
                    fields.z[j],
                );
                let r2 = dx * dx + dy * dy + dz * dz;
                let dist = r2.sqrt();
                if dist < 1.0e-12 {
                    continue;
                }
                let hj = fields.h[j];

                let w1 = wharmonic(table, dist / hi, hi, sinc_index, k_norm);
                let w2 = wharmonic(table, dist / hj, hj, sinc_index, k_norm);

                let a1_i = -(fields.c11[i] * dx + fields.c12[i] * dy + fields.c13[i] * dz) * w1;
                let a2_i = -(fields.c12[i] * dx + fields.c22[i] * dy + fields.c23[i] * dz) * w1;
                let a3_i = -(fields.c13[i] * dx + fields.c23[i] * dy + fields.c33[i] * dz) * w1;

                let a1_j = -(fields.c11[j] * dx + fields.c12[j] * dy + fields.c13[j] * dz) * w2;
                let a2_j = -(fields.c12[j] * dx + fields.c22[j] * dy + fields.c23[j] * dz) * w2;
                let a3_j = -(fields.c13[j] * dx + fields.c23[j] * dy + fields.c33[j] * dz) * w2;

                let dvx = fields.vx[i] - fields.vx[j];
                let dvy = fields.vy[i] - fields.vy[j];
                let dvz = fields.vz[i] - fields.vz[j];
                let rv = dvx * dx + dvy * dy + dvz * dz;
                let wij = rv / dist;

                let visc = if rv < 0.0 {
                    let h_ij = 0.5 * (hi + hj);
                    let c_ij = 0.5 * (fields.c[i] + fields.c[j]);
                    let ro_ij = 0.5 * (fields.ro[i] + fields.ro[j]);
                    let mu = h_ij * rv / (r2 + VISC_EPSILON * h_ij * h_ij);
                    (-VISC_ALPHA * c_ij * mu + VISC_BETA * mu * mu) / ro_ij
                } else {
                    0.0
                };

                let v_sig = fields.c[i] + fields.c[j] - 3.0 * wij.min(0.0);
                maxv = maxv.max(v_sig);

                let pro_j = fields.p[j] / (fields.ro[j] * fields.ro[j]);
                let mj = fields.m[j];

                gpx += mj * (pro_i * a1_i + pro_j * a1_j + 0.5 * visc * (a1_i + a1_j));
                gpy += mj * (pro_i * a2_i + pro_j * a2_j + 0.5 * visc * (a2_i + a2_j));
                gpz += mj * (pro_i * a3_i + pro_j * a3_j + 0.5 * visc * (a3_i + a3_j));
                edot += mj * (pro_i + 0.5 * visc) * (dvx * a1_i + dvy * a2_i + dvz * a3_i);
            }

            fields.grad_p_x[i] = gpx;
            fields.grad_p_y[i] = gpy;
            fields.grad_p_z[i] = gpz;
            fields.du[i] = 0.5 * edot;
            fields.maxvsignal[i] = maxv;
        }
    }
}
