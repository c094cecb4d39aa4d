//! Uniform-grid neighbor search and task construction.
//!
//! This is the stage that supplies the engine's task contract: a counting
//! sort of particles into cells covering the domain, a 3x3x3 cell sweep per
//! particle (wrapping on periodic axes), and chunking of the resulting
//! neighbor lists into bounded-size tasks. Distance filtering uses
//! `BoundingBox::distance`, the same minimum-image metric the accumulation
//! kernels apply, so both stages agree on which pairs are close.

use kernel::{BoundingBox, EngineError, ParticleFields, Task};

/// Uniform-grid spatial hash for O(1) neighbor cell lookup.
///
/// Cells exactly tile the domain (per-axis cell size = extent / cell count)
/// so wrapped cell indices on periodic axes stay consistent with the
/// minimum-image metric. The data layout is sorted-index + cell-offset
/// arrays rather than a hash map, so a rebuild is allocation-light.
pub struct UniformGrid {
    dims: [i64; 3],
    cell: [f32; 3],
    min: [f32; 3],
    periodic: [bool; 3],
    sorted_indices: Vec<u32>,
    cell_offsets: Vec<u32>,
    cell_counts: Vec<u32>,
}

impl UniformGrid {
    /// Create a grid over `bbox` with cells no smaller than `search_radius`.
    pub fn new(bbox: &BoundingBox, search_radius: f32) -> Self {
        assert!(search_radius > 0.0, "search_radius must be positive");
        let (ex, ey, ez) = bbox.extents();
        let dim = |extent: f32| -> i64 { ((extent / search_radius).floor() as i64).max(1) };
        let dims = [dim(ex), dim(ey), dim(ez)];
        let total = (dims[0] * dims[1] * dims[2]) as usize;
        Self {
            dims,
            cell: [
                ex / dims[0] as f32,
                ey / dims[1] as f32,
                ez / dims[2] as f32,
            ],
            min: [bbox.xmin, bbox.ymin, bbox.zmin],
            periodic: [bbox.periodic_x, bbox.periodic_y, bbox.periodic_z],
            sorted_indices: Vec::new(),
            cell_offsets: vec![0; total],
            cell_counts: vec![0; total],
        }
    }

    #[inline]
    fn axis_cell(&self, v: f32, axis: usize) -> i64 {
        (((v - self.min[axis]) / self.cell[axis]) as i64).clamp(0, self.dims[axis] - 1)
    }

    #[inline]
    fn cell_hash(&self, cx: i64, cy: i64, cz: i64) -> usize {
        (cx + cy * self.dims[0] + cz * self.dims[0] * self.dims[1]) as usize
    }

    /// Rebuild the grid from current particle positions.
    pub fn update(&mut self, x: &[f32], y: &[f32], z: &[f32]) {
        let n = x.len();
        debug_assert_eq!(n, y.len());
        debug_assert_eq!(n, z.len());
        let total = self.cell_counts.len();

        // 1. Count particles per cell
        self.cell_counts.clear();
        self.cell_counts.resize(total, 0);
        for i in 0..n {
            let cell = self.cell_hash(
                self.axis_cell(x[i], 0),
                self.axis_cell(y[i], 1),
                self.axis_cell(z[i], 2),
            );
            self.cell_counts[cell] += 1;
        }

        // 2. Prefix-sum to get cell offsets
        self.cell_offsets.clear();
        self.cell_offsets.resize(total, 0);
        let mut running = 0u32;
        for c in 0..total {
            self.cell_offsets[c] = running;
            running += self.cell_counts[c];
        }

        // 3. Scatter particle indices into sorted order
        self.sorted_indices.resize(n, 0);
        let mut write_heads = self.cell_offsets.clone();
        for i in 0..n {
            let cell = self.cell_hash(
                self.axis_cell(x[i], 0),
                self.axis_cell(y[i], 1),
                self.axis_cell(z[i], 2),
            );
            let pos = write_heads[cell] as usize;
            self.sorted_indices[pos] = i as u32;
            write_heads[cell] += 1;
        }
    }

    /// The distinct cell indices of {c-1, c, c+1} on one axis, wrapping on
    /// periodic axes. Deduplicated so thin grids (1 or 2 cells across) never
    /// visit a cell twice.
    fn axis_candidates(&self, c: i64, axis: usize) -> Vec<i64> {
        let mut out = Vec::with_capacity(3);
        for d in -1..=1_i64 {
            let raw = c + d;
            let wrapped = if self.periodic[axis] {
                raw.rem_euclid(self.dims[axis])
            } else if raw < 0 || raw >= self.dims[axis] {
                continue;
            } else {
                raw
            };
            if !out.contains(&wrapped) {
                out.push(wrapped);
            }
        }
        out
    }

    /// Invoke `f` for every particle within `radius` of particle `i` under
    /// the box metric.
    #[allow(clippy::too_many_arguments)]
    pub fn for_each_neighbor<F>(
        &self,
        i: usize,
        x: &[f32],
        y: &[f32],
        z: &[f32],
        bbox: &BoundingBox,
        radius: f32,
        mut f: F,
    ) where
        F: FnMut(u32),
    {
        let cx = self.axis_cell(x[i], 0);
        let cy = self.axis_cell(y[i], 1);
        let cz = self.axis_cell(z[i], 2);

        for &nz in &self.axis_candidates(cz, 2) {
            for &ny in &self.axis_candidates(cy, 1) {
                for &nx in &self.axis_candidates(cx, 0) {
                    let cell = self.cell_hash(nx, ny, nz);
                    let start = self.cell_offsets[cell] as usize;
                    let count = self.cell_counts[cell] as usize;
                    for s in start..start + count {
                        let j = self.sorted_indices[s];
                        if j as usize == i {
                            continue;
                        }
                        let dist = bbox.distance(
                            x[i],
                            y[i],
                            z[i],
                            x[j as usize],
                            y[j as usize],
                            z[j as usize],
                        );
                        if dist < radius {
                            f(j);
                        }
                    }
                }
            }
        }
    }
}

/// Build the task batch for one summation call: every particle appears in
/// exactly one task, in index order, chunked to at most `task_size` owned
/// particles per task.
///
/// A particle collecting more than `ngmax` neighbors is a configuration
/// error (`ngmax` too small for the particle distribution) and is reported,
/// never truncated.
pub fn build_tasks(
    fields: &ParticleFields,
    bbox: &BoundingBox,
    ngmax: u32,
    task_size: usize,
) -> Result<Vec<Task>, EngineError> {
    let n = fields.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let h_max = fields.h.iter().cloned().fold(0.0_f32, f32::max);
    let grid_radius = 2.0 * h_max;

    let mut grid = UniformGrid::new(bbox, grid_radius);
    grid.update(&fields.x, &fields.y, &fields.z);

    let mut tasks = Vec::with_capacity(n.div_ceil(task_size.max(1)));
    let mut current = Task::new(ngmax);
    let mut scratch: Vec<u32> = Vec::with_capacity(ngmax as usize);

    for i in 0..n {
        scratch.clear();
        grid.for_each_neighbor(
            i,
            &fields.x,
            &fields.y,
            &fields.z,
            bbox,
            2.0 * fields.h[i],
            |j| scratch.push(j),
        );
        current.push(i as u32, &scratch)?;
        if current.len() == task_size {
            tasks.push(std::mem::replace(&mut current, Task::new(ngmax)));
        }
    }
    if !current.is_empty() {
        tasks.push(current);
    }

    tracing::debug!(
        "built {} tasks for {} particles (grid radius {:.4})",
        tasks.len(),
        n,
        grid_radius
    );
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::sinc_3d_normalization;

    fn lattice(n_side: usize, periodic: bool) -> (ParticleFields, BoundingBox) {
        let bbox = BoundingBox::cube(0.0, n_side as f32, periodic);
        let mut fields = ParticleFields::new();
        for ix in 0..n_side {
            for iy in 0..n_side {
                for iz in 0..n_side {
                    fields.push_particle(
                        ix as f32 + 0.5,
                        iy as f32 + 0.5,
                        iz as f32 + 0.5,
                        1.3,
                        1.0,
                    );
                }
            }
        }
        fields.sinc_index = 6;
        fields.k_norm = sinc_3d_normalization(6);
        (fields, bbox)
    }

    fn brute_force_neighbors(
        fields: &ParticleFields,
        bbox: &BoundingBox,
        i: usize,
    ) -> Vec<u32> {
        let mut out = Vec::new();
        for j in 0..fields.len() {
            if j == i {
                continue;
            }
            let dist = bbox.distance(
                fields.x[i],
                fields.y[i],
                fields.z[i],
                fields.x[j],
                fields.y[j],
                fields.z[j],
            );
            if dist < 2.0 * fields.h[i] {
                out.push(j as u32);
            }
        }
        out
    }

    #[test]
    fn grid_matches_brute_force_periodic() {
        let (fields, bbox) = lattice(4, true);
        let tasks = build_tasks(&fields, &bbox, 128, 64).unwrap();

        let mut k_global = 0;
        for task in &tasks {
            for k in 0..task.len() {
                let i = task.clist[k] as usize;
                let mut found: Vec<u32> = task.neighbors_of(k).to_vec();
                found.sort_unstable();
                let mut expected = brute_force_neighbors(&fields, &bbox, i);
                expected.sort_unstable();
                assert_eq!(found, expected, "particle {i} neighbor set");
                k_global += 1;
            }
        }
        assert_eq!(k_global, fields.len());
    }

    #[test]
    fn grid_matches_brute_force_open() {
        let (fields, bbox) = lattice(4, false);
        let tasks = build_tasks(&fields, &bbox, 128, 1000).unwrap();
        assert_eq!(tasks.len(), 1);

        let task = &tasks[0];
        for k in 0..task.len() {
            let i = task.clist[k] as usize;
            let mut found: Vec<u32> = task.neighbors_of(k).to_vec();
            found.sort_unstable();
            let mut expected = brute_force_neighbors(&fields, &bbox, i);
            expected.sort_unstable();
            assert_eq!(found, expected, "particle {i} neighbor set");
        }
    }

    #[test]
    fn every_particle_owned_exactly_once() {
        let (fields, bbox) = lattice(3, true);
        // Chunk size that does not divide the particle count evenly.
        let tasks = build_tasks(&fields, &bbox, 128, 7).unwrap();
        assert!(tasks.len() > 1);
        assert!(tasks.last().unwrap().len() <= 7);

        let mut seen = vec![false; fields.len()];
        for task in &tasks {
            for &i in &task.clist {
                assert!(!seen[i as usize], "particle {i} owned twice");
                seen[i as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "every particle must be owned");
    }

    #[test]
    fn overflow_is_reported_not_truncated() {
        let (fields, bbox) = lattice(4, true);
        let err = build_tasks(&fields, &bbox, 2, 64).unwrap_err();
        assert!(matches!(err, EngineError::NeighborOverflow { ngmax: 2, .. }));
    }
}
