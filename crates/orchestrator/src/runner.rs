//! The outer timestep loop driving the summation engine.
//!
//! One step runs the pass sequence the engine contract expects: task
//! construction, density, equation of state, IAD tensor, momentum-energy,
//! then a Courant timestep from the per-particle signal velocities and a
//! semi-implicit update of velocities, positions, and internal energy.

use kernel::{
    BoundingBox, EngineError, KernelTable, ParticleFields, SummationBackend,
};

use crate::config::SimulationConfig;
use crate::{eos, init, neighbors};

/// Floor on the internal energy to keep the equation of state defined.
const U_FLOOR: f32 = 1.0e-12;

/// Fallback timestep when no particle reports a signal velocity.
const DT_FALLBACK: f32 = 1.0e-4;

/// A running simulation: fields, domain, kernel table, and the summation
/// backend the passes are dispatched to.
pub struct Simulation {
    config: SimulationConfig,
    fields: ParticleFields,
    bbox: BoundingBox,
    table: KernelTable,
    backend: Box<dyn SummationBackend>,
    time: f64,
    steps: u64,
}

impl Simulation {
    /// Initialize a simulation from a validated configuration: lattice init
    /// plus kernel table construction.
    pub fn new(
        config: SimulationConfig,
        backend: Box<dyn SummationBackend>,
    ) -> Result<Self, String> {
        config.validate()?;
        let (fields, bbox) = init::lattice(&config);
        let table = KernelTable::sinc(config.table_len);
        Ok(Self {
            config,
            fields,
            bbox,
            table,
            backend,
            time: 0.0,
            steps: 0,
        })
    }

    /// Current particle fields.
    pub fn fields(&self) -> &ParticleFields {
        &self.fields
    }

    /// Mutable particle fields, for scenario setup before the first step.
    pub fn fields_mut(&mut self) -> &mut ParticleFields {
        &mut self.fields
    }

    /// The simulation domain.
    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Simulated time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of completed timesteps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Total energy (kinetic + internal), for conservation diagnostics.
    pub fn total_energy(&self) -> f64 {
        let mut energy = 0.0_f64;
        for i in 0..self.fields.len() {
            let m = self.fields.m[i] as f64;
            let vx = self.fields.vx[i] as f64;
            let vy = self.fields.vy[i] as f64;
            let vz = self.fields.vz[i] as f64;
            energy += 0.5 * m * (vx * vx + vy * vy + vz * vz);
            energy += m * self.fields.u[i] as f64;
        }
        energy
    }

    /// Execute one timestep; returns the dt taken.
    pub fn step(&mut self) -> Result<f32, EngineError> {
        let tasks = neighbors::build_tasks(
            &self.fields,
            &self.bbox,
            self.config.ngmax,
            self.config.task_size as usize,
        )?;

        self.backend
            .compute_density(&tasks, &mut self.fields, &self.table, &self.bbox)?;
        eos::ideal_gas(&mut self.fields, self.config.gamma);
        self.backend
            .compute_iad(&tasks, &mut self.fields, &self.table, &self.bbox)?;
        self.backend
            .compute_momentum_energy(&tasks, &mut self.fields, &self.table, &self.bbox)?;

        let dt = self.courant_timestep();
        self.integrate(dt);
        self.nudge_smoothing_lengths(&tasks);

        self.time += dt as f64;
        self.steps += 1;
        Ok(dt)
    }

    /// Courant condition on the signal velocity: `dt = C * min(h / v_sig)`.
    fn courant_timestep(&self) -> f32 {
        let mut dt = f32::MAX;
        for i in 0..self.fields.len() {
            let v_sig = self.fields.maxvsignal[i];
            if v_sig > 0.0 {
                dt = dt.min(self.fields.h[i] / v_sig);
            }
        }
        if dt == f32::MAX {
            DT_FALLBACK
        } else {
            self.config.courant * dt
        }
    }

    /// Semi-implicit update: kick velocities by the pressure-gradient
    /// acceleration, drift positions (wrapping on periodic axes), advance
    /// internal energy.
    fn integrate(&mut self, dt: f32) {
        for i in 0..self.fields.len() {
            self.fields.vx[i] -= self.fields.grad_p_x[i] * dt;
            self.fields.vy[i] -= self.fields.grad_p_y[i] * dt;
            self.fields.vz[i] -= self.fields.grad_p_z[i] * dt;

            let (x, y, z) = self.bbox.wrap_position(
                self.fields.x[i] + self.fields.vx[i] * dt,
                self.fields.y[i] + self.fields.vy[i] * dt,
                self.fields.z[i] + self.fields.vz[i] * dt,
            );
            self.fields.x[i] = x;
            self.fields.y[i] = y;
            self.fields.z[i] = z;

            self.fields.u[i] = (self.fields.u[i] + self.fields.du[i] * dt).max(U_FLOOR);
        }
    }

    /// Pull each smoothing length toward the `ng0` neighbor target:
    /// `h <- h/2 * (1 + cbrt(ng0 / ng))`.
    fn nudge_smoothing_lengths(&mut self, tasks: &[kernel::Task]) {
        let ng0 = self.config.ng0 as f32;
        for task in tasks {
            for k in 0..task.len() {
                let i = task.clist[k] as usize;
                let ng = task.neighbor_counts[k].max(1) as f32;
                self.fields.h[i] *= 0.5 * (1.0 + (ng0 / ng).cbrt());
            }
        }
    }
}
