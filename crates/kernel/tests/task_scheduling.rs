//! Scheduling-level engine properties: task order independence, idempotence,
//! untouched coverage gaps, and loud failure on contract violations.

use kernel::{
    sinc_3d_normalization, BoundingBox, CpuBackend, EngineError, KernelTable, ParticleFields,
    SummationBackend, Task,
};

fn lattice_fields(n_side: usize, spacing: f32) -> (ParticleFields, BoundingBox) {
    let extent = n_side as f32 * spacing;
    let bbox = BoundingBox::cube(0.0, extent, true);
    let mut fields = ParticleFields::new();
    for ix in 0..n_side {
        for iy in 0..n_side {
            for iz in 0..n_side {
                fields.push_particle(
                    (ix as f32 + 0.5) * spacing,
                    (iy as f32 + 0.5) * spacing,
                    (iz as f32 + 0.5) * spacing,
                    1.3 * spacing,
                    1.0,
                );
            }
        }
    }
    fields.sinc_index = 6;
    fields.k_norm = sinc_3d_normalization(6);
    (fields, bbox)
}

fn brute_force_tasks(
    fields: &ParticleFields,
    bbox: &BoundingBox,
    ngmax: u32,
    chunk: usize,
) -> Vec<Task> {
    let n = fields.len();
    let mut tasks = Vec::new();
    let mut current = Task::new(ngmax);
    for i in 0..n {
        let mut neighbors = Vec::new();
        for j in 0..n {
            if i == j {
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
                neighbors.push(j as u32);
            }
        }
        current.push(i as u32, &neighbors).unwrap();
        if current.len() == chunk {
            tasks.push(std::mem::replace(&mut current, Task::new(ngmax)));
        }
    }
    if !current.is_empty() {
        tasks.push(current);
    }
    tasks
}

fn bits(v: &[f32]) -> Vec<u32> {
    v.iter().map(|x| x.to_bits()).collect()
}

#[test]
fn task_order_never_changes_results() {
    let (fields, bbox) = lattice_fields(4, 1.0);
    let table = KernelTable::sinc(5000);
    // Uneven chunk size so the last task is smaller than the rest.
    let tasks = brute_force_tasks(&fields, &bbox, 96, 7);
    assert!(tasks.len() > 2);

    let mut forward = fields.clone();
    CpuBackend::new()
        .compute_density(&tasks, &mut forward, &table, &bbox)
        .unwrap();

    let reversed: Vec<Task> = tasks.iter().rev().cloned().collect();
    let mut backward = fields.clone();
    CpuBackend::new()
        .compute_density(&reversed, &mut backward, &table, &bbox)
        .unwrap();

    assert_eq!(
        bits(&forward.ro),
        bits(&backward.ro),
        "task submission order must not change any particle's output"
    );
}

#[test]
fn repeated_calls_are_bitwise_identical() {
    let (mut fields, bbox) = lattice_fields(4, 1.0);
    let table = KernelTable::sinc(5000);
    let tasks = brute_force_tasks(&fields, &bbox, 96, 16);

    let mut backend = CpuBackend::new();
    backend
        .compute_density(&tasks, &mut fields, &table, &bbox)
        .unwrap();
    let first = bits(&fields.ro);

    backend
        .compute_density(&tasks, &mut fields, &table, &bbox)
        .unwrap();
    assert_eq!(first, bits(&fields.ro), "engine calls must be idempotent");

    // The full pipeline is deterministic end to end as well.
    for i in 0..fields.len() {
        fields.p[i] = 0.4 * fields.ro[i];
        fields.c[i] = 1.1;
    }
    backend
        .compute_iad(&tasks, &mut fields, &table, &bbox)
        .unwrap();
    let iad_first = bits(&fields.c11);
    backend
        .compute_iad(&tasks, &mut fields, &table, &bbox)
        .unwrap();
    assert_eq!(iad_first, bits(&fields.c11));

    backend
        .compute_momentum_energy(&tasks, &mut fields, &table, &bbox)
        .unwrap();
    let grad_first = bits(&fields.grad_p_x);
    backend
        .compute_momentum_energy(&tasks, &mut fields, &table, &bbox)
        .unwrap();
    assert_eq!(grad_first, bits(&fields.grad_p_x));
}

#[test]
fn particles_without_tasks_are_left_untouched() {
    let (mut fields, bbox) = lattice_fields(3, 1.0);
    let table = KernelTable::sinc(2000);
    let n = fields.len();

    // Cover only the first half of the particle set.
    let covered = n / 2;
    let mut task = Task::new(8);
    for i in 0..covered {
        task.push(i as u32, &[]).unwrap();
    }

    let sentinel = -7.5_f32;
    for ro in fields.ro.iter_mut() {
        *ro = sentinel;
    }

    CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap();

    for i in 0..covered {
        assert!(fields.ro[i] > 0.0, "owned particle {i} must be written");
    }
    for i in covered..n {
        assert_eq!(fields.ro[i], sentinel, "unowned particle {i} must be untouched");
    }
}

#[test]
fn empty_task_batch_fails_loudly() {
    let (mut fields, bbox) = lattice_fields(2, 1.0);
    let table = KernelTable::sinc(100);
    let err = CpuBackend::new()
        .compute_density(&[], &mut fields, &table, &bbox)
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyTaskList));
}

#[test]
fn mixed_ngmax_fails_loudly() {
    let (mut fields, bbox) = lattice_fields(2, 1.0);
    let table = KernelTable::sinc(100);

    let mut a = Task::new(4);
    a.push(0, &[]).unwrap();
    let mut b = Task::new(8);
    b.push(1, &[]).unwrap();

    let err = CpuBackend::new()
        .compute_density(&[a, b], &mut fields, &table, &bbox)
        .unwrap_err();
    assert!(matches!(err, EngineError::MixedNgmax { expected: 4, found: 8 }));
}

#[test]
fn corrupted_neighbor_count_fails_loudly() {
    // A count past ngmax would read padding; the engine must refuse rather
    // than silently truncate or overrun.
    let (mut fields, bbox) = lattice_fields(2, 1.0);
    let table = KernelTable::sinc(100);

    let mut task = Task::new(2);
    task.push(0, &[1]).unwrap();
    task.neighbor_counts[0] = 5;

    let err = CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::NeighborOverflow { count: 5, ngmax: 2, .. }
    ));
}

#[test]
fn out_of_range_indices_fail_loudly() {
    let (mut fields, bbox) = lattice_fields(2, 1.0);
    let table = KernelTable::sinc(100);
    let n = fields.len() as u32;

    let mut task = Task::new(2);
    task.push(n, &[]).unwrap(); // owned index past the field arrays
    let err = CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap_err();
    assert!(matches!(err, EngineError::IndexOutOfRange { .. }));

    let mut task = Task::new(2);
    task.push(0, &[n + 3]).unwrap(); // neighbor index past the field arrays
    let err = CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap_err();
    assert!(matches!(err, EngineError::IndexOutOfRange { .. }));
}

#[test]
fn mismatched_field_arrays_fail_loudly() {
    let (mut fields, bbox) = lattice_fields(2, 1.0);
    let table = KernelTable::sinc(100);
    fields.ro.pop();

    let mut task = Task::new(2);
    task.push(0, &[]).unwrap();
    let err = CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::FieldLengthMismatch { field: "ro", .. }
    ));
}
