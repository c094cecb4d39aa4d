//! Noh implosion demo: lattice of cold gas falling toward the domain
//! center, run for a configured number of timesteps.
//!
//! Usage: `noh [config.json]` -- without an argument a built-in small
//! configuration is used.

use std::error::Error;

use orchestrator::{default_backend, init, Simulation, SimulationConfig};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load(&path)?,
        None => SimulationConfig::default(),
    };
    let max_steps = config.max_timesteps.unwrap_or(20);
    tracing::info!(
        "starting '{}': {}^3 particles, {} steps",
        config.name,
        config.n_side,
        max_steps
    );

    let mut sim = Simulation::new(config, default_backend())?;
    let bbox = *sim.bounding_box();
    init::apply_noh_velocity(sim.fields_mut(), &bbox);

    let initial_energy = sim.total_energy();

    for step in 0..max_steps {
        let dt = sim.step()?;
        let fields = sim.fields();
        let max_ro = fields.ro.iter().cloned().fold(0.0_f32, f32::max);
        let energy = sim.total_energy();
        tracing::info!(
            "step {:>4}  t = {:.5}  dt = {:.3e}  max ro = {:.4}  E/E0 = {:.6}",
            step + 1,
            sim.time(),
            dt,
            max_ro,
            energy / initial_energy,
        );
    }

    Ok(())
}
