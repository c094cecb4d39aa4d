//! Configuration parsing and validation for summation-engine simulations.

use kernel::BoundingBox;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fs;

/// Main simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Human-readable simulation name
    pub name: String,
    /// Particles per axis of the initial lattice
    pub n_side: u32,
    /// Simulation domain bounds
    pub domain: DomainBounds,
    /// Per-axis periodicity flags [x, y, z]
    #[serde(default)]
    pub periodic: [bool; 3],
    /// Target neighbor count used for the initial smoothing length
    #[serde(default = "default_ng0")]
    pub ng0: u32,
    /// Neighbor row capacity handed to the task builder
    #[serde(default = "default_ngmax")]
    pub ngmax: u32,
    /// Owned-particle chunk bound per task
    #[serde(default = "default_task_size")]
    pub task_size: u32,
    /// Kernel shape exponent
    #[serde(default = "default_sinc_index")]
    pub sinc_index: u32,
    /// Kernel table sample count
    #[serde(default = "default_table_len")]
    pub table_len: usize,
    /// Adiabatic index for the ideal-gas equation of state
    #[serde(default = "default_gamma")]
    pub gamma: f32,
    /// Courant factor for the signal-velocity timestep
    #[serde(default = "default_courant")]
    pub courant: f32,
    /// Total mass distributed over the lattice
    #[serde(default = "default_total_mass")]
    pub total_mass: f32,
    /// Initial specific internal energy
    #[serde(default = "default_initial_energy")]
    pub initial_energy: f32,
    /// Stop after this many timesteps
    pub max_timesteps: Option<u64>,
}

/// Domain bounding box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainBounds {
    /// Minimum corner [x, y, z]
    pub min: [f32; 3],
    /// Maximum corner [x, y, z]
    pub max: [f32; 3],
}

// Default values
fn default_ng0() -> u32 {
    100
}

fn default_ngmax() -> u32 {
    150
}

fn default_task_size() -> u32 {
    4096
}

fn default_sinc_index() -> u32 {
    6
}

fn default_table_len() -> usize {
    20_000
}

fn default_gamma() -> f32 {
    5.0 / 3.0
}

fn default_courant() -> f32 {
    0.3
}

fn default_total_mass() -> f32 {
    1.0
}

fn default_initial_energy() -> f32 {
    1.0e-6
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: "noh".to_string(),
            n_side: 10,
            domain: DomainBounds {
                min: [-0.5, -0.5, -0.5],
                max: [0.5, 0.5, 0.5],
            },
            periodic: [false; 3],
            ng0: default_ng0(),
            ngmax: default_ngmax(),
            task_size: default_task_size(),
            sinc_index: default_sinc_index(),
            table_len: default_table_len(),
            gamma: default_gamma(),
            courant: default_courant(),
            total_mass: default_total_mass(),
            initial_energy: default_initial_energy(),
            max_timesteps: Some(20),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &str) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {}", path, e))?;

        let config: SimulationConfig = serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse config JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        for axis in 0..3 {
            if self.domain.min[axis] >= self.domain.max[axis] {
                return Err(format!(
                    "Domain min must be less than max on axis {axis}"
                ));
            }
        }
        if self.n_side < 2 {
            return Err("n_side must be at least 2".to_string());
        }
        if self.ng0 == 0 {
            return Err("ng0 must be at least 1".to_string());
        }
        if self.ngmax < self.ng0 {
            return Err("ngmax must be at least ng0".to_string());
        }
        if self.task_size == 0 {
            return Err("task_size must be at least 1".to_string());
        }
        if self.sinc_index == 0 {
            return Err("sinc_index must be at least 1".to_string());
        }
        if self.table_len < 2 {
            return Err("table_len must be at least 2".to_string());
        }
        if self.gamma <= 1.0 {
            return Err("gamma must exceed 1".to_string());
        }
        if self.courant <= 0.0 || self.courant > 1.0 {
            return Err("courant must be in range (0, 1]".to_string());
        }
        if self.total_mass <= 0.0 {
            return Err("total_mass must be positive".to_string());
        }
        if self.initial_energy <= 0.0 {
            return Err("initial_energy must be positive".to_string());
        }
        if let Some(max_timesteps) = self.max_timesteps {
            if max_timesteps == 0 {
                return Err("max_timesteps must be at least 1".to_string());
            }
        }
        Ok(())
    }

    /// The configured domain as an engine bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.domain.min[0],
            self.domain.max[0],
            self.domain.min[1],
            self.domain.max[1],
            self.domain.min[2],
            self.domain.max[2],
            self.periodic[0],
            self.periodic[1],
            self.periodic[2],
        )
    }

    /// Domain volume.
    pub fn volume(&self) -> f32 {
        (self.domain.max[0] - self.domain.min[0])
            * (self.domain.max[1] - self.domain.min[1])
            * (self.domain.max[2] - self.domain.min[2])
    }

    /// Initial smoothing length containing ~`ng0` neighbors on the lattice:
    /// `h = 0.5 * cbrt(3 ng0 V / (4 pi n))`.
    pub fn initial_smoothing_length(&self) -> f32 {
        let n = (self.n_side as f32).powi(3);
        0.5 * (3.0 / (4.0 * PI) * self.ng0 as f32 * self.volume() / n).cbrt()
    }
}
