//! Task data contract: bounded chunks of particles with padded neighbor rows.
//!
//! Tasks are produced fresh each timestep by the neighbor-finding stage and
//! consumed exactly once by a summation backend. They own no device
//! resources. The neighbor array is fixed-capacity with an explicit per-row
//! length: only the first `neighbor_counts[k]` entries of row `k` are valid,
//! and accumulation loops are bounded by the count, never the capacity.

use crate::EngineError;

/// An ordered chunk of owned particle indices plus their flattened,
/// `ngmax`-padded neighbor rows.
#[derive(Debug, Clone)]
pub struct Task {
    /// Owned particle indices into the global field arrays.
    pub clist: Vec<u32>,
    /// Flattened neighbor indices, `clist.len() * ngmax` entries; row `k`
    /// occupies `[k * ngmax, (k + 1) * ngmax)` and is valid up to
    /// `neighbor_counts[k]`. Padding entries are unspecified.
    pub neighbors: Vec<u32>,
    /// Number of valid neighbors per owned particle.
    pub neighbor_counts: Vec<u32>,
    /// Row capacity; a safe upper bound on the neighbor count, uniform across
    /// all tasks of one call.
    pub ngmax: u32,
}

impl Task {
    /// Create an empty task with row capacity `ngmax`.
    pub fn new(ngmax: u32) -> Self {
        Self {
            clist: Vec::new(),
            neighbors: Vec::new(),
            neighbor_counts: Vec::new(),
            ngmax,
        }
    }

    /// Number of owned particles.
    pub fn len(&self) -> usize {
        self.clist.len()
    }

    /// `true` if the task owns no particles.
    pub fn is_empty(&self) -> bool {
        self.clist.is_empty()
    }

    /// Append an owned particle and its neighbor list, padding the row to
    /// `ngmax`.
    ///
    /// A neighbor list longer than `ngmax` is a contract violation by the
    /// neighbor-finding stage and is rejected rather than truncated.
    pub fn push(&mut self, index: u32, neighbors: &[u32]) -> Result<(), EngineError> {
        if neighbors.len() > self.ngmax as usize {
            return Err(EngineError::NeighborOverflow {
                particle: index,
                count: neighbors.len() as u32,
                ngmax: self.ngmax,
            });
        }
        self.clist.push(index);
        self.neighbor_counts.push(neighbors.len() as u32);
        self.neighbors.extend_from_slice(neighbors);
        self.neighbors
            .resize(self.clist.len() * self.ngmax as usize, 0);
        Ok(())
    }

    /// The valid neighbor indices of owned particle `k`.
    pub fn neighbors_of(&self, k: usize) -> &[u32] {
        let start = k * self.ngmax as usize;
        &self.neighbors[start..start + self.neighbor_counts[k] as usize]
    }
}

/// Check a whole task batch against the contract and return
/// `(max_chunk, ngmax)` for device buffer sizing.
///
/// `max_chunk` is the largest owned-particle count across *all* tasks, so
/// per-lane buffers sized from it fit every task. Violations — empty batch,
/// heterogeneous `ngmax`, malformed row layout, neighbor counts over
/// capacity, indices outside `[0, n)` — are reported as typed errors instead
/// of being silently tolerated.
pub fn validate_batch(tasks: &[Task], n: usize) -> Result<(usize, u32), EngineError> {
    let first = tasks.first().ok_or(EngineError::EmptyTaskList)?;
    let ngmax = first.ngmax;

    let mut max_chunk = 0usize;
    for task in tasks {
        if task.ngmax != ngmax {
            return Err(EngineError::MixedNgmax {
                expected: ngmax,
                found: task.ngmax,
            });
        }
        let chunk = task.clist.len();
        if task.neighbor_counts.len() != chunk
            || task.neighbors.len() != chunk * ngmax as usize
        {
            return Err(EngineError::TaskLayout {
                chunk,
                ngmax,
                neighbors: task.neighbors.len(),
                counts: task.neighbor_counts.len(),
            });
        }
        for k in 0..chunk {
            let count = task.neighbor_counts[k];
            if count > ngmax {
                return Err(EngineError::NeighborOverflow {
                    particle: task.clist[k],
                    count,
                    ngmax,
                });
            }
            if task.clist[k] as usize >= n {
                return Err(EngineError::IndexOutOfRange {
                    index: task.clist[k],
                    len: n,
                });
            }
            for &j in task.neighbors_of(k) {
                if j as usize >= n {
                    return Err(EngineError::IndexOutOfRange { index: j, len: n });
                }
            }
        }
        max_chunk = max_chunk.max(chunk);
    }
    Ok((max_chunk, ngmax))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pads_rows() {
        let mut t = Task::new(4);
        t.push(0, &[1, 2]).unwrap();
        t.push(1, &[0]).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.neighbors.len(), 8);
        assert_eq!(t.neighbors_of(0), &[1, 2]);
        assert_eq!(t.neighbors_of(1), &[0]);
    }

    #[test]
    fn push_rejects_overflow() {
        let mut t = Task::new(2);
        let err = t.push(0, &[1, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::NeighborOverflow {
                count: 3,
                ngmax: 2,
                ..
            }
        ));
        assert!(t.is_empty());
    }

    #[test]
    fn validate_empty_batch() {
        assert!(matches!(
            validate_batch(&[], 10),
            Err(EngineError::EmptyTaskList)
        ));
    }

    #[test]
    fn validate_mixed_ngmax() {
        let a = Task::new(4);
        let b = Task::new(8);
        assert!(matches!(
            validate_batch(&[a, b], 10),
            Err(EngineError::MixedNgmax {
                expected: 4,
                found: 8
            })
        ));
    }

    #[test]
    fn validate_reports_true_maximum() {
        let mut small = Task::new(4);
        small.push(0, &[1]).unwrap();
        let mut large = Task::new(4);
        for i in 0..7 {
            large.push(i, &[]).unwrap();
        }
        let (max_chunk, ngmax) = validate_batch(&[small, large], 10).unwrap();
        assert_eq!(max_chunk, 7);
        assert_eq!(ngmax, 4);
    }

    #[test]
    fn validate_catches_bad_indices() {
        let mut t = Task::new(4);
        t.push(9, &[3]).unwrap();
        assert!(validate_batch(std::slice::from_ref(&t), 10).is_ok());
        assert!(matches!(
            validate_batch(std::slice::from_ref(&t), 9),
            Err(EngineError::IndexOutOfRange { index: 9, len: 9 })
        ));

        let mut t = Task::new(4);
        t.push(0, &[12]).unwrap();
        assert!(matches!(
            validate_batch(&[t], 10),
            Err(EngineError::IndexOutOfRange { index: 12, len: 10 })
        ));
    }

    #[test]
    fn validate_catches_corrupt_counts() {
        let mut t = Task::new(2);
        t.push(0, &[1]).unwrap();
        t.neighbor_counts[0] = 3; // exceeds capacity
        assert!(matches!(
            validate_batch(&[t], 10),
            Err(EngineError::NeighborOverflow { count: 3, .. })
        ));
    }

    #[test]
    fn validate_catches_corrupt_layout() {
        let mut t = Task::new(2);
        t.push(0, &[1]).unwrap();
        t.neighbors.pop();
        assert!(matches!(
            validate_batch(&[t], 10),
            Err(EngineError::TaskLayout { .. })
        ));
    }
}
