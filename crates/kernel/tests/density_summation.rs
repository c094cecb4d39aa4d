//! Density pass properties: exact self term, the trivial-table two-particle
//! scenario, and periodic-boundary neighbor contributions.

use kernel::{
    sinc_3d_normalization, BoundingBox, CpuBackend, KernelTable, ParticleFields,
    SummationBackend, Task,
};

/// Build tasks of `chunk` particles each from an all-pairs neighbor search
/// using the box metric (the same metric the engine applies).
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

#[test]
fn zero_neighbors_yield_exact_self_term() {
    let mut fields = ParticleFields::new();
    fields.push_particle(5.0, 5.0, 5.0, 0.8, 2.5);
    fields.sinc_index = 6;
    fields.k_norm = 0.42;

    let table = KernelTable::sinc(1000);
    let bbox = BoundingBox::cube(0.0, 10.0, false);
    let mut task = Task::new(8);
    task.push(0, &[]).unwrap();

    CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap();

    let h = 0.8_f32;
    let expected = 2.5_f32 * 0.42 / (h * h * h);
    assert_eq!(fields.ro[0], expected, "self term must be exact");
}

#[test]
fn trivial_table_two_particle_density_is_two() {
    // Kernel value 1 everywhere, K = 1, sinc index 1, unit mass and h,
    // particles one unit apart: self term 1 plus neighbor term 1.
    let table = KernelTable::from_samples(vec![1.0; 32], vec![0.0; 32]).unwrap();
    let bbox = BoundingBox::cube(0.0, 10.0, false);

    let mut fields = ParticleFields::new();
    fields.push_particle(4.0, 5.0, 5.0, 1.0, 1.0);
    fields.push_particle(5.0, 5.0, 5.0, 1.0, 1.0);
    fields.sinc_index = 1;
    fields.k_norm = 1.0;

    let mut task = Task::new(4);
    task.push(0, &[1]).unwrap();
    task.push(1, &[0]).unwrap();

    CpuBackend::new()
        .compute_density(&[task], &mut fields, &table, &bbox)
        .unwrap();

    assert_eq!(fields.ro[0], 2.0);
    assert_eq!(fields.ro[1], 2.0);
}

#[test]
fn periodic_pair_contributes_across_boundary() {
    let table = KernelTable::sinc(2000);
    let sinc_index = 6;
    let k_norm = sinc_3d_normalization(sinc_index);

    let make_fields = || {
        let mut f = ParticleFields::new();
        f.push_particle(9.9, 5.0, 5.0, 1.0, 1.0);
        f.push_particle(0.1, 5.0, 5.0, 1.0, 1.0);
        f.sinc_index = sinc_index;
        f.k_norm = k_norm;
        f
    };
    let make_task = || {
        let mut t = Task::new(4);
        t.push(0, &[1]).unwrap();
        t.push(1, &[0]).unwrap();
        vec![t]
    };

    // Periodic box: the pair is 0.2 apart through the boundary.
    let mut periodic = make_fields();
    let bbox = BoundingBox::cube(0.0, 10.0, true);
    CpuBackend::new()
        .compute_density(&make_task(), &mut periodic, &table, &bbox)
        .unwrap();

    // Open box: the raw separation 9.8 is far outside kernel support.
    let mut open = make_fields();
    let bbox = BoundingBox::cube(0.0, 10.0, false);
    CpuBackend::new()
        .compute_density(&make_task(), &mut open, &table, &bbox)
        .unwrap();

    let self_term = k_norm; // m = h = 1
    assert!(
        periodic.ro[0] > self_term * 1.5,
        "wrapped neighbor at distance 0.2 should contribute strongly: {}",
        periodic.ro[0]
    );
    assert_eq!(
        open.ro[0], self_term,
        "neighbor beyond support must contribute nothing"
    );
}

#[test]
fn uniform_periodic_lattice_density_is_uniform() {
    let n_side = 5usize;
    let spacing = 1.0_f32;
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

    let table = KernelTable::sinc(20_000);
    let tasks = brute_force_tasks(&fields, &bbox, 128, 17);

    CpuBackend::new()
        .compute_density(&tasks, &mut fields, &table, &bbox)
        .unwrap();

    // Every lattice site is equivalent under periodicity, so densities agree.
    let first = fields.ro[0];
    assert!(first > 0.0 && first.is_finite());
    for (i, &ro) in fields.ro.iter().enumerate() {
        assert!(
            ((ro - first) / first).abs() < 1.0e-5,
            "site {i} density {ro} deviates from {first}"
        );
    }
}
