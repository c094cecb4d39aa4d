//! Device buffer management for the task-streamed summation engine.
//!
//! Whole-particle-set inputs and outputs are uploaded once per call; the
//! per-task index/neighbor data flows through a small fixed pool of lane
//! slots sized to the single largest task, overwritten for every task
//! assigned to that lane.

use wgpu::util::DeviceExt;

use crate::bbox::BoundingBox;
use crate::table::{KernelTable, SUPPORT_RADIUS};
use crate::task::Task;

/// Per-task uniform parameters.
/// Must match the TaskParams struct in all WGSL shaders exactly.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuTaskParams {
    pub n_task: u32,
    pub ngmax: u32,
    pub table_len: u32,
    pub sinc_index: u32,
    pub k_norm: f32,
    pub table_step: f32,
    pub v_max: f32,
    pub n_total: u32,
    pub box_min_x: f32,
    pub box_max_x: f32,
    pub box_min_y: f32,
    pub box_max_y: f32,
    pub box_min_z: f32,
    pub box_max_z: f32,
    pub pbc_x: u32,
    pub pbc_y: u32,
    pub pbc_z: u32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

impl GpuTaskParams {
    /// Build the shared (task-independent) part of the params from the call
    /// inputs; `n_task` is filled in per task by [`TaskLane::upload`].
    pub fn shared(
        ngmax: u32,
        n_total: u32,
        table: &KernelTable,
        bbox: &BoundingBox,
        sinc_index: u32,
        k_norm: f32,
    ) -> Self {
        Self {
            n_task: 0,
            ngmax,
            table_len: table.len() as u32,
            sinc_index,
            k_norm,
            table_step: table.step(),
            v_max: SUPPORT_RADIUS,
            n_total,
            box_min_x: bbox.xmin,
            box_max_x: bbox.xmax,
            box_min_y: bbox.ymin,
            box_max_y: bbox.ymax,
            box_min_z: bbox.zmin,
            box_max_z: bbox.zmax,
            pbc_x: bbox.periodic_x as u32,
            pbc_y: bbox.periodic_y as u32,
            pbc_z: bbox.periodic_z as u32,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        }
    }
}

/// Minimum buffer size (wgpu requires non-zero buffers).
const MIN_BUF_SIZE: u64 = 4;

/// Create a read-only storage buffer holding f32 slice data.
pub fn create_storage_buf(device: &wgpu::Device, label: &str, data: &[f32]) -> wgpu::Buffer {
    if data.is_empty() {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: MIN_BUF_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    } else {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        })
    }
}

/// Create an uninitialized storage buffer a lane overwrites per task.
pub fn create_lane_buf(device: &wgpu::Device, label: &str, len: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: ((len * std::mem::size_of::<u32>()) as u64).max(MIN_BUF_SIZE),
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Create a staging (MAP_READ) buffer for readback.
pub fn create_staging_buf(device: &wgpu::Device, label: &str, len: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: ((len * std::mem::size_of::<f32>()) as u64).max(MIN_BUF_SIZE),
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// One lane of the alternating double-buffer pool.
///
/// A lane's buffers are exclusively owned by that lane slot for the call's
/// duration and reused (overwritten) for every task assigned to it. This is
/// safe because `wgpu::Queue` serializes submissions: a lane's next
/// `write_buffer` is ordered after its previous task's dispatch, so no task
/// can observe a successor's data.
pub struct TaskLane {
    /// Per-task uniform parameters.
    pub params: wgpu::Buffer,
    /// Owned particle indices.
    pub clist: wgpu::Buffer,
    /// Flattened padded neighbor rows.
    pub neighbors: wgpu::Buffer,
    /// Valid-neighbor counts per row.
    pub counts: wgpu::Buffer,
}

impl TaskLane {
    /// Allocate a lane sized to the largest chunk in the batch.
    pub fn new(device: &wgpu::Device, lane: usize, max_chunk: usize, ngmax: u32) -> Self {
        let tag = |name: &str| format!("lane{lane}_{name}");
        Self {
            params: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&tag("params")),
                size: std::mem::size_of::<GpuTaskParams>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            clist: create_lane_buf(device, &tag("clist"), max_chunk.max(1)),
            neighbors: create_lane_buf(
                device,
                &tag("neighbors"),
                (max_chunk * ngmax as usize).max(1),
            ),
            counts: create_lane_buf(device, &tag("counts"), max_chunk.max(1)),
        }
    }

    /// Stage one task's index/neighbor data and parameters into this lane.
    ///
    /// The copies execute in queue submission order, after every dispatch
    /// previously submitted against this lane.
    pub fn upload(&self, queue: &wgpu::Queue, task: &Task, shared: &GpuTaskParams) {
        let params = GpuTaskParams {
            n_task: task.len() as u32,
            ..*shared
        };
        queue.write_buffer(&self.params, 0, bytemuck::bytes_of(&params));
        queue.write_buffer(&self.clist, 0, bytemuck::cast_slice(&task.clist));
        if !task.neighbors.is_empty() {
            queue.write_buffer(&self.neighbors, 0, bytemuck::cast_slice(&task.neighbors));
        }
        queue.write_buffer(&self.counts, 0, bytemuck::cast_slice(&task.neighbor_counts));
    }
}

/// Map a set of staging buffers and read them back as f32 vectors.
///
/// All `map_async` requests are issued first, then a single
/// `device.poll(Maintain::Wait)` drives them to completion — the engine's
/// sole synchronization point.
pub fn read_staged_f32(
    device: &wgpu::Device,
    stagings: &[&wgpu::Buffer],
    counts: &[usize],
) -> Vec<Vec<f32>> {
    let mut receivers = Vec::with_capacity(stagings.len());
    for buffer in stagings {
        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        receivers.push(rx);
    }
    device.poll(wgpu::Maintain::Wait);

    stagings
        .iter()
        .zip(receivers)
        .zip(counts)
        .map(|((buffer, rx), &count)| {
            rx.recv().unwrap().unwrap();
            let slice = buffer.slice(..);
            let data = slice.get_mapped_range();
            let out: Vec<f32> = bytemuck::cast_slice(&data)[..count].to_vec();
            drop(data);
            buffer.unmap();
            out
        })
        .collect()
}
