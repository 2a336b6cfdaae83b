//! CPU backend using rayon for parallelization.
//!
//! The worker grid is emulated band by band: each band is one row of work
//! groups and owns a disjoint slice of the destination, so bands run in
//! parallel without synchronization.

use rayon::prelude::*;
use tracing::trace;

use super::{BackendLimits, BufferHandle, FlipBackend, buffer_bytes, memory, validate_dispatch};
use crate::kernel::{BLOCK_SIZE, FlipKernel, WorkGrid};
use crate::{ComputeError, ComputeResult};

/// CPU buffer - data stored in RAM.
pub struct CpuBuffer {
    data: Vec<f32>,
    width: u32,
    height: u32,
    channels: u32,
}

impl CpuBuffer {
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl BufferHandle for CpuBuffer {
    fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }
}

/// CPU flip backend.
pub struct CpuBackend {
    kernels: Vec<FlipKernel>,
    block: u32,
    limits: BackendLimits,
}

impl CpuBackend {
    /// Backend with every flip kernel.
    pub fn new() -> Self {
        Self::with_kernels(&FlipKernel::ALL)
    }

    /// Backend exposing only `kernels`.
    pub fn with_kernels(kernels: &[FlipKernel]) -> Self {
        Self {
            kernels: kernels.to_vec(),
            block: BLOCK_SIZE,
            limits: BackendLimits {
                max_dim: u32::MAX,
                max_buffer_bytes: u64::MAX,
                available_memory: memory::available_memory(),
            },
        }
    }

    /// Use `block x block` work groups instead of the default 8x8.
    pub fn with_block_size(mut self, block: u32) -> Self {
        self.block = block.max(1);
        self
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FlipBackend for CpuBackend {
    type Buffer = CpuBuffer;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn limits(&self) -> &BackendLimits {
        &self.limits
    }

    fn block_size(&self) -> u32 {
        self.block
    }

    fn find_kernel(&self, name: &str) -> ComputeResult<FlipKernel> {
        FlipKernel::from_name(name)
            .filter(|k| self.kernels.contains(k))
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
        let size = (buffer_bytes(width, height, channels) / 4) as usize;
        Ok(CpuBuffer { data: vec![0.0; size], width, height, channels })
    }

    fn write(&self, buffer: &mut Self::Buffer, data: &[f32]) -> ComputeResult<()> {
        if data.len() != buffer.data.len() {
            return Err(ComputeError::BufferSizeMismatch {
                expected: buffer.data.len(),
                actual: data.len(),
            });
        }
        buffer.data.copy_from_slice(data);
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
        trace!(kernel = %kernel, groups_x = grid.groups_x, groups_y = grid.groups_y, "cpu dispatch");

        let (sw, sh, c) = src.dimensions();
        let (ow, oh) = kernel.output_dims(sw, sh);
        let c = c as usize;
        let block = grid.block;
        // Groups past the image edge have no in-range workers.
        let groups_x = grid.groups_x.min(ow.div_ceil(block));
        let band_len = ow as usize * c * block.min(oh) as usize;
        let src_data = &src.data;

        dst.data
            .par_chunks_mut(band_len)
            .enumerate()
            .for_each(|(by, band)| {
                let y0 = by as u32 * block;
                for bx in 0..groups_x {
                    let x0 = bx * block;
                    for ly in 0..block.min(oh - y0) {
                        let y = y0 + ly;
                        for lx in 0..block.min(ow - x0) {
                            let x = x0 + lx;
                            let (sx, sy) = kernel.source_coord(x, y, sw, sh);
                            let s = (sy as usize * sw as usize + sx as usize) * c;
                            let d = (ly as usize * ow as usize + x as usize) * c;
                            band[d..d + c].copy_from_slice(&src_data[s..s + c]);
                        }
                    }
                }
            });

        Ok(())
    }

    fn download(&self, buffer: &Self::Buffer) -> ComputeResult<Vec<f32>> {
        Ok(buffer.data.clone())
    }
}
