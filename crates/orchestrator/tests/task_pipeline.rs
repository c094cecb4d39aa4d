//! End-to-end pipeline: neighbor stage -> task batch -> summation passes,
//! verifying the geometric agreement between the two stages and the
//! stability of a short simulation run.

use kernel::{CpuBackend, SummationBackend};
use orchestrator::{config::DomainBounds, init, neighbors, Simulation, SimulationConfig};

fn test_config(n_side: u32, periodic: bool) -> SimulationConfig {
    SimulationConfig {
        name: "pipeline".to_string(),
        n_side,
        domain: DomainBounds {
            min: [0.0, 0.0, 0.0],
            max: [1.0, 1.0, 1.0],
        },
        periodic: [periodic; 3],
        ng0: 20,
        ngmax: 120,
        table_len: 2000,
        max_timesteps: Some(3),
        ..Default::default()
    }
}

#[test]
fn tasks_feed_the_engine_directly() {
    let config = test_config(5, true);
    let (mut fields, bbox) = init::lattice(&config);
    let table = kernel::KernelTable::sinc(config.table_len);

    let tasks = neighbors::build_tasks(&fields, &bbox, config.ngmax, 31).unwrap();
    assert!(tasks.len() > 1, "chunking should produce several tasks");

    CpuBackend::new()
        .compute_density(&tasks, &mut fields, &table, &bbox)
        .unwrap();

    // A uniform periodic lattice has one density everywhere, close to the
    // mean density m * n / V.
    let expected = config.total_mass / config.volume();
    for (i, &ro) in fields.ro.iter().enumerate() {
        assert!(
            ((ro - expected) / expected).abs() < 0.2,
            "site {i}: density {ro} far from mean {expected}"
        );
    }
}

#[test]
fn neighbor_counts_reach_the_target() {
    let config = test_config(6, true);
    let (fields, bbox) = init::lattice(&config);
    let tasks = neighbors::build_tasks(&fields, &bbox, config.ngmax, 4096).unwrap();

    // The initial smoothing length is sized for ~ng0 neighbors; on a uniform
    // periodic lattice every particle should land in that neighborhood.
    let ng0 = config.ng0 as f32;
    for task in &tasks {
        for k in 0..task.len() {
            let ng = task.neighbor_counts[k] as f32;
            assert!(
                ng > 0.3 * ng0 && ng < 3.0 * ng0,
                "particle {} has {} neighbors, target {}",
                task.clist[k],
                ng,
                ng0
            );
        }
    }
}

#[test]
fn short_noh_run_compresses_the_center() {
    let config = test_config(6, false);
    let mut sim = Simulation::new(config, Box::new(CpuBackend::new())).unwrap();
    let bbox = *sim.bounding_box();
    init::apply_noh_velocity(sim.fields_mut(), &bbox);

    let initial_max_ro: f32 = {
        sim.step().unwrap();
        sim.fields().ro.iter().cloned().fold(0.0, f32::max)
    };

    for _ in 0..2 {
        sim.step().unwrap();
    }

    let final_max_ro = sim.fields().ro.iter().cloned().fold(0.0_f32, f32::max);
    assert!(
        final_max_ro >= initial_max_ro * 0.99,
        "infall should not rarefy the gas: {initial_max_ro} -> {final_max_ro}"
    );
    for &ro in &sim.fields().ro {
        assert!(ro.is_finite() && ro > 0.0);
    }
    assert!(sim.total_energy().is_finite());
}
