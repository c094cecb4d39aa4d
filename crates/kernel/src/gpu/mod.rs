//! GPU (Metal/Vulkan via wgpu) implementation of the summation backend.
//!
//! `GpuBackend` implements [`SummationBackend`] using wgpu compute shaders,
//! one per physics field (density, IAD tensor, momentum-energy), all sharing
//! the same orchestration:
//!
//! 1. Validate the task batch and size the lane pool from the largest chunk.
//! 2. Upload whole-particle-set inputs, the kernel table, and the output
//!    arrays' current contents once per call.
//! 3. Stream tasks round-robin through [`LANES`] alternating lane slots:
//!    stage the task's index/neighbor data into the lane, dispatch the pass
//!    kernel with one thread per owned particle.
//! 4. Retrieve results with one staging copy and a single
//!    `device.poll(Maintain::Wait)` — the engine's sole synchronization
//!    point, an explicit wait-on-everything barrier rather than a
//!    default-stream side effect.
//!
//! Device failures are fenced with error scopes: allocation runs under an
//! `OutOfMemory` scope, the task loop under a `Validation` scope, so
//! failures surface close to their cause instead of corrupting later output.
//! All buffers are call-local and dropped on every exit path.
//!
//! # Bind group layout (all passes)
//! - Group 0: particle geometry — positions, smoothing length, mass
//! - Group 1: kernel lookup table — values, derivatives
//! - Group 2: lane slot — task params (uniform), clist, neighbors, counts
//! - Group 3: pass-specific field inputs and outputs

pub mod buffers;

use self::buffers::{
    create_staging_buf, create_storage_buf, read_staged_f32, GpuTaskParams, TaskLane,
};

use crate::bbox::BoundingBox;
use crate::field::ParticleFields;
use crate::table::KernelTable;
use crate::task::{self, Task};
use crate::{EngineError, SummationBackend};

/// Number of alternating lane slots tasks are streamed through.
pub const LANES: usize = 2;

/// Threads per workgroup in all accumulation shaders.
const WORKGROUP_SIZE: u32 = 256;

/// The three accumulation passes sharing one orchestration skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Density,
    Iad,
    MomentumEnergy,
}

impl Pass {
    fn label(self) -> &'static str {
        match self {
            Pass::Density => "density",
            Pass::Iad => "iad",
            Pass::MomentumEnergy => "momentum_energy",
        }
    }
}

/// GPU summation backend using wgpu compute shaders.
pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,

    pipeline_density: wgpu::ComputePipeline,
    pipeline_iad: wgpu::ComputePipeline,
    pipeline_momentum: wgpu::ComputePipeline,

    bgl_geometry: wgpu::BindGroupLayout,
    bgl_table: wgpu::BindGroupLayout,
    bgl_lane: wgpu::BindGroupLayout,
    bgl_density_fields: wgpu::BindGroupLayout,
    bgl_iad_fields: wgpu::BindGroupLayout,
    bgl_momentum_fields: wgpu::BindGroupLayout,
}

/// Check whether a GPU adapter is available without creating a device.
pub fn gpu_available() -> bool {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }));
    adapter.is_some()
}

impl GpuBackend {
    /// Create a GPU backend: probe an adapter, create the device, compile
    /// the three accumulation shaders and their pipelines.
    ///
    /// Returns `Err(EngineError::NoAdapter)` when no GPU is present, allowing
    /// callers to fall back to [`crate::CpuBackend`].
    pub fn new() -> Result<Self, EngineError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok_or(EngineError::NoAdapter)?;

        tracing::info!("GPU adapter: {:?}", adapter.get_info().name);

        // The momentum-energy shader binds 22 storage buffers across its 4
        // bind groups; wgpu defaults to 8 per stage, so ask for the adapter's
        // actual limit.
        let adapter_limits = adapter.limits();
        let mut required_limits = wgpu::Limits::default();
        required_limits.max_storage_buffers_per_shader_stage =
            adapter_limits.max_storage_buffers_per_shader_stage;
        required_limits.max_bind_groups = adapter_limits.max_bind_groups.max(4);

        tracing::info!(
            "Requesting max_storage_buffers_per_shader_stage = {}",
            required_limits.max_storage_buffers_per_shader_stage,
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("summation_device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| EngineError::DeviceCreation(format!("{e}")))?;

        // Shader compilation and pipeline creation run under a validation
        // scope so an unsupported device surfaces here, not mid-call.
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let density_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("density"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/density.wgsl").into()),
        });
        let iad_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("iad"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/iad.wgsl").into()),
        });
        let momentum_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("momentum_energy"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("shaders/momentum_energy.wgsl").into(),
            ),
        });

        // -- Group 0: geometry (positions, smoothing length, mass) --
        let bgl_geometry = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("geometry_bgl"),
            entries: &[
                bgl_storage_ro(0), // pos_x
                bgl_storage_ro(1), // pos_y
                bgl_storage_ro(2), // pos_z
                bgl_storage_ro(3), // smoothing
                bgl_storage_ro(4), // mass
            ],
        });

        // -- Group 1: kernel lookup table --
        let bgl_table = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("table_bgl"),
            entries: &[
                bgl_storage_ro(0), // values
                bgl_storage_ro(1), // derivatives
            ],
        });

        // -- Group 2: lane slot (per-task data) --
        let bgl_lane = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lane_bgl"),
            entries: &[
                bgl_uniform(0),    // task params
                bgl_storage_ro(1), // clist
                bgl_storage_ro(2), // neighbors
                bgl_storage_ro(3), // counts
            ],
        });

        // -- Group 3: pass fields --
        let bgl_density_fields =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("density_fields_bgl"),
                entries: &[
                    bgl_storage_rw(0), // ro
                ],
            });
        let bgl_iad_fields = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("iad_fields_bgl"),
            entries: &[
                bgl_storage_ro(0), // ro
                bgl_storage_rw(1), // iad tensor, 6 components per particle
            ],
        });
        let bgl_momentum_fields =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("momentum_fields_bgl"),
                entries: &[
                    bgl_storage_ro(0),  // vel_x
                    bgl_storage_ro(1),  // vel_y
                    bgl_storage_ro(2),  // vel_z
                    bgl_storage_ro(3),  // ro
                    bgl_storage_ro(4),  // pressure
                    bgl_storage_ro(5),  // sound_speed
                    bgl_storage_ro(6),  // iad tensor
                    bgl_storage_rw(7),  // grad_p_x
                    bgl_storage_rw(8),  // grad_p_y
                    bgl_storage_rw(9),  // grad_p_z
                    bgl_storage_rw(10), // du
                    bgl_storage_rw(11), // maxvsignal
                ],
            });

        let pl_density = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("density_pl"),
            bind_group_layouts: &[&bgl_geometry, &bgl_table, &bgl_lane, &bgl_density_fields],
            push_constant_ranges: &[],
        });
        let pl_iad = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("iad_pl"),
            bind_group_layouts: &[&bgl_geometry, &bgl_table, &bgl_lane, &bgl_iad_fields],
            push_constant_ranges: &[],
        });
        let pl_momentum = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("momentum_pl"),
            bind_group_layouts: &[&bgl_geometry, &bgl_table, &bgl_lane, &bgl_momentum_fields],
            push_constant_ranges: &[],
        });

        let pipeline_density = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("density"),
            layout: Some(&pl_density),
            module: &density_shader,
            entry_point: Some("compute_density"),
            compilation_options: Default::default(),
            cache: None,
        });
        let pipeline_iad = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("iad"),
            layout: Some(&pl_iad),
            module: &iad_shader,
            entry_point: Some("compute_iad"),
            compilation_options: Default::default(),
            cache: None,
        });
        let pipeline_momentum = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("momentum_energy"),
            layout: Some(&pl_momentum),
            module: &momentum_shader,
            entry_point: Some("compute_momentum_energy"),
            compilation_options: Default::default(),
            cache: None,
        });

        let scope = device.pop_error_scope();
        device.poll(wgpu::Maintain::Wait);
        if let Some(e) = pollster::block_on(scope) {
            return Err(EngineError::DeviceCreation(format!("{e}")));
        }

        Ok(Self {
            device,
            queue,
            pipeline_density,
            pipeline_iad,
            pipeline_momentum,
            bgl_geometry,
            bgl_table,
            bgl_lane,
            bgl_density_fields,
            bgl_iad_fields,
            bgl_momentum_fields,
        })
    }

    fn pipeline(&self, pass: Pass) -> &wgpu::ComputePipeline {
        match pass {
            Pass::Density => &self.pipeline_density,
            Pass::Iad => &self.pipeline_iad,
            Pass::MomentumEnergy => &self.pipeline_momentum,
        }
    }

    /// Run one accumulation pass over the task batch (the orchestration
    /// shared by all three fields).
    fn run_pass(
        &self,
        pass: Pass,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        let n = fields.check_lengths()?;
        let (max_chunk, ngmax) = task::validate_batch(tasks, n)?;

        tracing::debug!(
            "{}: {} tasks, {} particles, max chunk {}, ngmax {}",
            pass.label(),
            tasks.len(),
            n,
            max_chunk,
            ngmax,
        );

        // --- One-time per-call allocation and upload, fenced for OOM ---
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let pos_x = create_storage_buf(&self.device, "pos_x", &fields.x);
        let pos_y = create_storage_buf(&self.device, "pos_y", &fields.y);
        let pos_z = create_storage_buf(&self.device, "pos_z", &fields.z);
        let smoothing = create_storage_buf(&self.device, "smoothing", &fields.h);
        let mass = create_storage_buf(&self.device, "mass", &fields.m);

        let table_w = create_storage_buf(&self.device, "table_w", table.values());
        let table_dw = create_storage_buf(&self.device, "table_dw", table.derivatives());

        let pass_data = self.create_pass_data(pass, fields, n);

        let lanes: Vec<TaskLane> = (0..LANES)
            .map(|lane| TaskLane::new(&self.device, lane, max_chunk, ngmax))
            .collect();

        let scope = self.device.pop_error_scope();
        self.device.poll(wgpu::Maintain::Wait);
        if let Some(e) = pollster::block_on(scope) {
            return Err(EngineError::DeviceAllocation(format!("{e}")));
        }

        // --- Bind groups ---
        let bg_geometry = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("geometry_bg"),
            layout: &self.bgl_geometry,
            entries: &[
                bind(0, &pos_x),
                bind(1, &pos_y),
                bind(2, &pos_z),
                bind(3, &smoothing),
                bind(4, &mass),
            ],
        });
        let bg_table = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("table_bg"),
            layout: &self.bgl_table,
            entries: &[bind(0, &table_w), bind(1, &table_dw)],
        });
        let lane_bgs: Vec<wgpu::BindGroup> = lanes
            .iter()
            .map(|lane| {
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("lane_bg"),
                    layout: &self.bgl_lane,
                    entries: &[
                        bind(0, &lane.params),
                        bind(1, &lane.clist),
                        bind(2, &lane.neighbors),
                        bind(3, &lane.counts),
                    ],
                })
            })
            .collect();

        let shared_params = GpuTaskParams::shared(
            ngmax,
            n as u32,
            table,
            bbox,
            fields.sinc_index,
            fields.k_norm,
        );

        // --- Task streaming: round-robin over lanes, fenced for launch
        // failures. Each lane's next upload is queue-ordered after its
        // previous dispatch, so slot reuse is hazard-free. ---
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        for (idx, t) in tasks.iter().enumerate() {
            if t.is_empty() {
                continue;
            }
            let lane_idx = idx % LANES;
            lanes[lane_idx].upload(&self.queue, t, &shared_params);

            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some(pass.label()),
                });
            {
                let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(pass.label()),
                    timestamp_writes: None,
                });
                cpass.set_pipeline(self.pipeline(pass));
                cpass.set_bind_group(0, &bg_geometry, &[]);
                cpass.set_bind_group(1, &bg_table, &[]);
                cpass.set_bind_group(2, &lane_bgs[lane_idx], &[]);
                cpass.set_bind_group(3, &pass_data.bind_group, &[]);
                cpass.dispatch_workgroups(dispatch_size(t.len() as u32, WORKGROUP_SIZE), 1, 1);
            }
            self.queue.submit(std::iter::once(encoder.finish()));
        }

        let scope = self.device.pop_error_scope();
        if let Some(e) = pollster::block_on(scope) {
            return Err(EngineError::KernelLaunch(format!("{e}")));
        }

        // --- Single retrieval: one staging copy submission, one wait ---
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        for ((output, staging), &count) in pass_data
            .outputs
            .iter()
            .zip(&pass_data.stagings)
            .zip(&pass_data.counts)
        {
            encoder.copy_buffer_to_buffer(
                output,
                0,
                staging,
                0,
                (count * std::mem::size_of::<f32>()) as u64,
            );
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        let staging_refs: Vec<&wgpu::Buffer> = pass_data.stagings.iter().collect();
        let results = read_staged_f32(&self.device, &staging_refs, &pass_data.counts);

        self.write_outputs(pass, results, fields);
        Ok(())
    }

    /// Create the pass-specific field buffers and their group-3 bind group.
    ///
    /// Output buffers are initialized from the host arrays' current contents
    /// so particles not owned by any task round-trip unchanged.
    fn create_pass_data(&self, pass: Pass, fields: &ParticleFields, n: usize) -> PassData {
        match pass {
            Pass::Density => {
                let ro = create_storage_buf(&self.device, "ro", &fields.ro);
                let staging = create_staging_buf(&self.device, "staging_ro", n);
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("density_fields_bg"),
                    layout: &self.bgl_density_fields,
                    entries: &[bind(0, &ro)],
                });
                PassData {
                    _inputs: vec![],
                    outputs: vec![ro],
                    stagings: vec![staging],
                    counts: vec![n],
                    bind_group,
                }
            }
            Pass::Iad => {
                let ro = create_storage_buf(&self.device, "ro", &fields.ro);
                let iad = create_storage_buf(&self.device, "iad", &interleave_iad(fields, n));
                let staging = create_staging_buf(&self.device, "staging_iad", 6 * n);
                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("iad_fields_bg"),
                    layout: &self.bgl_iad_fields,
                    entries: &[bind(0, &ro), bind(1, &iad)],
                });
                PassData {
                    _inputs: vec![ro],
                    outputs: vec![iad],
                    stagings: vec![staging],
                    counts: vec![6 * n],
                    bind_group,
                }
            }
            Pass::MomentumEnergy => {
                let vel_x = create_storage_buf(&self.device, "vel_x", &fields.vx);
                let vel_y = create_storage_buf(&self.device, "vel_y", &fields.vy);
                let vel_z = create_storage_buf(&self.device, "vel_z", &fields.vz);
                let ro = create_storage_buf(&self.device, "ro", &fields.ro);
                let pressure = create_storage_buf(&self.device, "pressure", &fields.p);
                let sound = create_storage_buf(&self.device, "sound_speed", &fields.c);
                let iad = create_storage_buf(&self.device, "iad", &interleave_iad(fields, n));

                let grad_x = create_storage_buf(&self.device, "grad_p_x", &fields.grad_p_x);
                let grad_y = create_storage_buf(&self.device, "grad_p_y", &fields.grad_p_y);
                let grad_z = create_storage_buf(&self.device, "grad_p_z", &fields.grad_p_z);
                let du = create_storage_buf(&self.device, "du", &fields.du);
                let maxv = create_storage_buf(&self.device, "maxvsignal", &fields.maxvsignal);

                let stagings = vec![
                    create_staging_buf(&self.device, "staging_grad_p_x", n),
                    create_staging_buf(&self.device, "staging_grad_p_y", n),
                    create_staging_buf(&self.device, "staging_grad_p_z", n),
                    create_staging_buf(&self.device, "staging_du", n),
                    create_staging_buf(&self.device, "staging_maxvsignal", n),
                ];

                let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("momentum_fields_bg"),
                    layout: &self.bgl_momentum_fields,
                    entries: &[
                        bind(0, &vel_x),
                        bind(1, &vel_y),
                        bind(2, &vel_z),
                        bind(3, &ro),
                        bind(4, &pressure),
                        bind(5, &sound),
                        bind(6, &iad),
                        bind(7, &grad_x),
                        bind(8, &grad_y),
                        bind(9, &grad_z),
                        bind(10, &du),
                        bind(11, &maxv),
                    ],
                });
                PassData {
                    _inputs: vec![vel_x, vel_y, vel_z, ro, pressure, sound, iad],
                    outputs: vec![grad_x, grad_y, grad_z, du, maxv],
                    stagings,
                    counts: vec![n; 5],
                    bind_group,
                }
            }
        }
    }

    /// Scatter readback results into the host field arrays.
    fn write_outputs(&self, pass: Pass, mut results: Vec<Vec<f32>>, fields: &mut ParticleFields) {
        match pass {
            Pass::Density => {
                fields.ro = results.swap_remove(0);
            }
            Pass::Iad => {
                let iad = &results[0];
                for i in 0..fields.len() {
                    fields.c11[i] = iad[6 * i];
                    fields.c12[i] = iad[6 * i + 1];
                    fields.c13[i] = iad[6 * i + 2];
                    fields.c22[i] = iad[6 * i + 3];
                    fields.c23[i] = iad[6 * i + 4];
                    fields.c33[i] = iad[6 * i + 5];
                }
            }
            Pass::MomentumEnergy => {
                fields.maxvsignal = results.pop().unwrap();
                fields.du = results.pop().unwrap();
                fields.grad_p_z = results.pop().unwrap();
                fields.grad_p_y = results.pop().unwrap();
                fields.grad_p_x = results.pop().unwrap();
            }
        }
    }
}

impl SummationBackend for GpuBackend {
    fn compute_density(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        self.run_pass(Pass::Density, tasks, fields, table, bbox)
    }

    fn compute_iad(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        self.run_pass(Pass::Iad, tasks, fields, table, bbox)
    }

    fn compute_momentum_energy(
        &mut self,
        tasks: &[Task],
        fields: &mut ParticleFields,
        table: &KernelTable,
        bbox: &BoundingBox,
    ) -> Result<(), EngineError> {
        self.run_pass(Pass::MomentumEnergy, tasks, fields, table, bbox)
    }
}

/// Pass-specific device buffers: read fields kept alive for the call, output
/// buffers paired with their staging mirrors, and the group-3 bind group.
struct PassData {
    _inputs: Vec<wgpu::Buffer>,
    outputs: Vec<wgpu::Buffer>,
    stagings: Vec<wgpu::Buffer>,
    counts: Vec<usize>,
    bind_group: wgpu::BindGroup,
}

/// Interleave the six tensor arrays into one buffer, 6 components per
/// particle, matching the WGSL layout `iad[6 * i + component]`.
fn interleave_iad(fields: &ParticleFields, n: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(6 * n);
    for i in 0..n {
        out.push(fields.c11[i]);
        out.push(fields.c12[i]);
        out.push(fields.c13[i]);
        out.push(fields.c22[i]);
        out.push(fields.c23[i]);
        out.push(fields.c33[i]);
    }
    out
}

/// Calculate dispatch workgroup count: ceil(total / workgroup_size).
fn dispatch_size(total: u32, workgroup_size: u32) -> u32 {
    (total + workgroup_size - 1) / workgroup_size
}

fn bind(binding: u32, buffer: &wgpu::Buffer) -> wgpu::BindGroupEntry<'_> {
    wgpu::BindGroupEntry {
        binding,
        resource: buffer.as_entire_binding(),
    }
}

// ---- Bind group layout entry helpers ----

fn bgl_uniform(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn bgl_storage_ro(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn bgl_storage_rw(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}
