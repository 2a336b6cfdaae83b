//! wgpu backend implementation.
//!
//! Runs the flip kernels as WGSL compute shaders. One shader module holds
//! every kernel; each entry point gets its own pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use tracing::{debug, trace};
use wgpu::util::DeviceExt;

use super::{BackendLimits, BufferHandle, FlipBackend, buffer_bytes, validate_dispatch};
use crate::kernel::{BLOCK_SIZE, FlipKernel, WorkGrid};
use crate::shaders;
use crate::{ComputeError, ComputeResult};

/// Dimensions uniform: [src_width, src_height, channels, 0]
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

/// GPU storage buffer holding f32 samples.
pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    channels: u32,
    size_bytes: u64,
}

impl BufferHandle for WgpuBuffer {
    fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// wgpu flip backend.
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipelines: HashMap<FlipKernel, wgpu::ComputePipeline>,
    block: u32,
    limits: BackendLimits,
    adapter_name: String,
}

impl WgpuBackend {
    /// Check if wgpu is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create backend with 8x8 work groups.
    pub fn new() -> ComputeResult<Self> {
        Self::with_block_size(BLOCK_SIZE)
    }

    /// Create backend with `block x block` work groups.
    pub fn with_block_size(block: u32) -> ComputeResult<Self> {
        pollster::block_on(Self::new_async(block.max(1)))
    }

    async fn new_async(block: u32) -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        if block * block > adapter_limits.max_compute_invocations_per_workgroup {
            return Err(ComputeError::DeviceCreation(format!(
                "{block}x{block} work groups exceed adapter limit of {} invocations",
                adapter_limits.max_compute_invocations_per_workgroup
            )));
        }

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("imgflip_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter_limits.clone(),
                memory_hints: wgpu::MemoryHints::Performance,
            }, None)
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let adapter_info = adapter.get_info();
        let limits = BackendLimits {
            max_dim: adapter_limits.max_compute_workgroups_per_dimension.saturating_mul(block),
            max_buffer_bytes: adapter_limits
                .max_buffer_size
                .min(adapter_limits.max_storage_buffer_binding_size as u64),
            available_memory: estimate_vram(&adapter_info, adapter_limits.max_buffer_size),
        };

        let pipelines = Self::create_pipelines(&device, block);
        debug!(adapter = %adapter_info.name, backend = ?adapter_info.backend, block, "wgpu backend ready");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            pipelines,
            block,
            limits,
            adapter_name: adapter_info.name,
        })
    }

    fn create_pipelines(device: &wgpu::Device, block: u32) -> HashMap<FlipKernel, wgpu::ComputePipeline> {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flip_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::flip_source(block).into()),
        });

        FlipKernel::ALL
            .into_iter()
            .map(|kernel| {
                let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(kernel.name()),
                    layout: None, // Auto layout
                    module: &module,
                    entry_point: Some(kernel.name()),
                    compilation_options: Default::default(),
                    cache: None,
                });
                (kernel, pipeline)
            })
            .collect()
    }

    /// Name of the GPU adapter in use.
    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Execute compute dispatch and wait.
    fn dispatch_and_wait(&self, pipeline: &wgpu::ComputePipeline, bind_group: &wgpu::BindGroup, grid: WorkGrid) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("flip_encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("flip_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(grid.groups_x, grid.groups_y, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
    }
}

impl FlipBackend for WgpuBackend {
    type Buffer = WgpuBuffer;

    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn limits(&self) -> &BackendLimits {
        &self.limits
    }

    fn block_size(&self) -> u32 {
        self.block
    }

    fn find_kernel(&self, name: &str) -> ComputeResult<FlipKernel> {
        FlipKernel::from_name(name)
            .filter(|k| self.pipelines.contains_key(k))
            .ok_or_else(|| ComputeError::KernelNotFound(name.to_string()))
    }

    fn allocate(&self, width: u32, height: u32, channels: u32) -> ComputeResult<Self::Buffer> {
        if width == 0 || height == 0 {
            return Err(ComputeError::InvalidDimensions(width, height));
        }
        if channels == 0 {
            return Err(ComputeError::InvalidChannels(channels));
        }
        self.limits.check(width, height, channels)?;
        let size_bytes = buffer_bytes(width, height, channels);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("image_buffer"),
            size: size_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(WgpuBuffer { buffer, width, height, channels, size_bytes })
    }

    fn write(&self, buffer: &mut Self::Buffer, data: &[f32]) -> ComputeResult<()> {
        let expected = (buffer.size_bytes / 4) as usize;
        if data.len() != expected {
            return Err(ComputeError::BufferSizeMismatch { expected, actual: data.len() });
        }
        self.queue.write_buffer(&buffer.buffer, 0, bytemuck::cast_slice(data));
        Ok(())
    }

    fn dispatch(
        &self,
        kernel: FlipKernel,
        src: &Self::Buffer,
        dst: &mut Self::Buffer,
        grid: WorkGrid,
    ) -> ComputeResult<()> {
        let kernel = self.find_kernel(kernel.name())?;
        validate_dispatch(kernel, src.dimensions(), dst.dimensions(), &grid)?;
        if grid.block != self.block {
            return Err(ComputeError::BackendDispatchFailure(format!(
                "{kernel}: pipelines compiled for {}px blocks, grid uses {}px",
                self.block, grid.block
            )));
        }
        let pipeline = self
            .pipelines
            .get(&kernel)
            .ok_or_else(|| ComputeError::KernelNotFound(kernel.name().to_string()))?;
        trace!(kernel = %kernel, groups_x = grid.groups_x, groups_y = grid.groups_y, "wgpu dispatch");

        let (w, h, c) = src.dimensions();
        let dims = DimsUniform { dims: [w, h, c, 0] };
        let dims_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&dims),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flip_bind_group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: src.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: dst.buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: dims_buf.as_entire_binding() },
            ],
        });

        self.dispatch_and_wait(pipeline, &bind_group, grid);

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ComputeError::BackendDispatchFailure(format!("{kernel}: {err}")));
        }
        Ok(())
    }

    fn download(&self, handle: &Self::Buffer) -> ComputeResult<Vec<f32>> {
        let size = handle.size_bytes;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(&handle.buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| { let _ = tx.send(r); });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::BackendDispatchFailure("Map channel closed".into()))?
            .map_err(|e| ComputeError::BackendDispatchFailure(format!("Map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(result)
    }
}

/// Estimate usable VRAM from adapter type and buffer limits.
fn estimate_vram(info: &wgpu::AdapterInfo, max_buffer_bytes: u64) -> u64 {
    let from_buffer = max_buffer_bytes.saturating_mul(2);

    let estimated = match info.device_type {
        wgpu::DeviceType::DiscreteGpu => from_buffer.clamp(2u64 << 30, 24u64 << 30),
        wgpu::DeviceType::IntegratedGpu => from_buffer.clamp(512u64 << 20, 4u64 << 30),
        wgpu::DeviceType::VirtualGpu => from_buffer.clamp(1u64 << 30, 8u64 << 30),
        _ => from_buffer.clamp(256u64 << 20, 2u64 << 30),
    };

    // 80% safe margin
    estimated.saturating_mul(80) / 100
}
