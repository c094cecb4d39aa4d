//! Task-streamed SPH neighbor-summation engine.
//!
//! This crate computes per-particle physical quantities (density, the IAD
//! gradient-correction tensor, momentum/energy change) from precomputed
//! neighbor lists, using a tabulated radial kernel. The particle set is
//! partitioned into bounded-size chunks ("tasks") by an external
//! neighbor-finding stage; a summation backend processes the chunks and
//! writes results into the owned particles' output slots in place.
//!
//! # Modules
//! - [`field`] -- Struct-of-arrays particle field storage.
//! - [`bbox`] -- Domain box with periodic minimum-image distance.
//! - [`table`] -- Tabulated kernel value/derivative with interpolated lookup.
//! - [`task`] -- The task chunk contract and batch validation.
//! - [`sph`] -- Per-pair formulas and the CPU summation loops.
//! - [`gpu`] -- wgpu compute backend streaming tasks through alternating
//!   lane buffers (feature `gpu`).

#![warn(missing_docs)]

pub mod bbox;
pub mod field;
pub mod sph;
pub mod table;
pub mod task;

#[cfg(feature = "gpu")]
#[allow(missing_docs)]
pub mod gpu;

pub use bbox::BoundingBox;
pub use field::ParticleFields;
pub use table::{sinc_3d_normalization, KernelTable};
pub use task::Task;

#[cfg(feature = "gpu")]
pub use gpu::GpuBackend;

use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors arising from summation calls: caller contract violations and GPU
/// initialization/allocation/launch failures.
///
/// Contract violations are reported instead of silently tolerated; device
/// failures are fatal to the current call, and every failure path releases
/// the device resources acquired so far (buffers are call-local and dropped
/// on all exits).
#[derive(Debug)]
pub enum EngineError {
    /// The task batch was empty; the shared `ngmax` would be undefined.
    EmptyTaskList,
    /// Tasks in one batch carried different `ngmax` values.
    MixedNgmax {
        /// `ngmax` of the first task.
        expected: u32,
        /// Conflicting value found later in the batch.
        found: u32,
    },
    /// A neighbor row exceeds the `ngmax` capacity bound.
    NeighborOverflow {
        /// Owned particle whose row overflowed.
        particle: u32,
        /// Stored neighbor count.
        count: u32,
        /// Row capacity.
        ngmax: u32,
    },
    /// A particle index points outside the field arrays.
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Length of the field arrays.
        len: usize,
    },
    /// A task's neighbor/count arrays do not match its chunk size.
    TaskLayout {
        /// Owned particle count.
        chunk: usize,
        /// Row capacity.
        ngmax: u32,
        /// Actual flattened neighbor array length.
        neighbors: usize,
        /// Actual count array length.
        counts: usize,
    },
    /// A field array diverged from the common particle count.
    FieldLengthMismatch {
        /// Name of the offending array.
        field: &'static str,
        /// Its length.
        len: usize,
        /// The common length.
        expected: usize,
    },
    /// Kernel table value/derivative sequences are unusable.
    TableShape {
        /// Value sample count.
        values: usize,
        /// Derivative sample count.
        derivatives: usize,
    },
    /// No compatible GPU adapter was found.
    NoAdapter,
    /// GPU device creation failed (wraps the underlying error message).
    DeviceCreation(String),
    /// Device buffer allocation failed (memory exhaustion).
    DeviceAllocation(String),
    /// A kernel launch or transfer was rejected by the device.
    KernelLaunch(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTaskList => {
                write!(f, "empty task batch: shared ngmax is undefined")
            }
            Self::MixedNgmax { expected, found } => {
                write!(f, "tasks disagree on ngmax: {expected} vs {found}")
            }
            Self::NeighborOverflow {
                particle,
                count,
                ngmax,
            } => write!(
                f,
                "particle {particle} has {count} neighbors, over the ngmax bound {ngmax}"
            ),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "particle index {index} outside field arrays of length {len}")
            }
            Self::TaskLayout {
                chunk,
                ngmax,
                neighbors,
                counts,
            } => write!(
                f,
                "task layout corrupt: chunk {chunk} x ngmax {ngmax} but {neighbors} neighbor \
                 entries and {counts} counts"
            ),
            Self::FieldLengthMismatch {
                field,
                len,
                expected,
            } => write!(
                f,
                "field array `{field}` has length {len}, expected {expected}"
            ),
            Self::TableShape {
                values,
                derivatives,
            } => write!(
                f,
                "kernel table needs equal value/derivative sample counts of at least 2, \
                 got {values}/{derivatives}"
            ),
            Self::NoAdapter => write!(f, "no GPU adapter found"),
            Self::DeviceCreation(e) => write!(f, "failed to create GPU device: {e}"),
            Self::DeviceAllocation(e) => write!(f, "GPU buffer allocation failed: {e}"),
            Self::KernelLaunch(e) => write!(f, "GPU kernel launch failed: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

// ---------------------------------------------------------------------------
// SummationBackend trait
// ---------------------------------------------------------------------------

/// The seam between summation implementations (CPU reference, GPU engine).
///
/// Each method is a stateless-per-call transform
/// `(tasks, fields, table, box) -> output arrays`, mutating only the output
/// arrays of its pass. Particles not owned by any task keep their previous
/// output values. Task order never affects results, only scheduling: each
/// owned particle belongs to exactly one task and is written exactly once.
/// Two calls with identical inputs produce bitwise-identical output.
pub trait SummationBackend {
    /// Density summation; writes `fields.ro`.
    fn compute_density(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError>;

    /// IAD gradient-correction tensor; writes `fields.c11 .. fields.c33`.
    fn compute_iad(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError>;

    /// Momentum and energy update; writes `fields.grad_p_*`, `fields.du`,
    /// and `fields.maxvsignal`.
    fn compute_momentum_energy(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// CpuBackend -- reference implementation of SummationBackend
// ---------------------------------------------------------------------------

/// Reference CPU implementation of the summation passes.
///
/// Runs the loops in `sph` directly over the task batch. Used as the parity
/// reference for the GPU backend and as the fallback when no adapter exists.
#[derive(Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Create a CPU backend.
    pub fn new() -> Self {
        Self
    }

    fn validate(
        tasks: &[Task],
        fields: &ParticleFields,
    ) -> Result<(), EngineError> {
        let n = fields.check_lengths()?;
        task::validate_batch(tasks, n)?;
        Ok(())
    }
}

impl SummationBackend for CpuBackend {
    fn compute_density(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        Self::validate(tasks, fields)?;
        sph::compute_density(tasks, fields, table, bbox);
        Ok(())
    }

    fn compute_iad(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        Self::validate(tasks, fields)?;
        sph::compute_iad(tasks, fields, table, bbox);
        Ok(())
    }

    fn compute_momentum_energy(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        Self::validate(tasks, fields)?;
        sph::compute_momentum_energy(tasks, fields, table, bbox);
        Ok(())
    }
}
