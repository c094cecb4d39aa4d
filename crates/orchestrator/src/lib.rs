//! Simulation orchestration around the summation engine.
//!
//! This crate supplies everything the engine treats as an external
//! collaborator:
//! - [`config`] -- JSON configuration with validation.
//! - [`init`] -- lattice initial conditions and the Noh implosion setup.
//! - [`neighbors`] -- uniform-grid neighbor search producing the task batch.
//! - [`eos`] -- ideal-gas equation of state between passes.
//! - [`runner`] -- the outer timestep loop.

#![warn(missing_docs)]

pub mod config;
pub mod eos;
pub mod init;
pub mod neighbors;
pub mod runner;

pub use config::SimulationConfig;
pub use runner::Simulation;

use kernel::{CpuBackend, SummationBackend};

/// Pick the best available summation backend: GPU when an adapter exists,
/// otherwise the CPU reference.
pub fn default_backend() -> Box<dyn SummationBackend> {
    #[cfg(feature = "gpu")]
    {
        match kernel::GpuBackend::new() {
            Ok(backend) => {
                tracing::info!("using GPU summation backend");
                return Box::new(backend);
            }
            Err(e) => {
                tracing::info!("falling back to CPU summation backend: {e}");
            }
        }
    }
    Box::new(CpuBackend::new())
}
