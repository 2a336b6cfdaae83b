//! Compute backends for flip kernels.
//!
//! Provides a CPU (rayon) backend and, with the `wgpu` feature, a GPU
//! backend, with automatic selection.
//!
//! # Architecture
//!
//! ```text
//! FlipDispatcher<B: FlipBackend>
//!     +-- CpuBackend  (rayon worker grid)
//!     +-- WgpuBackend (Vulkan/Metal/DX12)
//! ```

mod cpu_backend;
mod detect;
pub mod memory;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::{CpuBackend, CpuBuffer};
pub use detect::{BackendInfo, describe_backends, detect_backends, resolved_kernels, select_best_backend};

#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuBackend, WgpuBuffer};

use crate::kernel::{BLOCK_SIZE, FlipKernel, WorkGrid};
use crate::{ComputeError, ComputeResult};

/// Available compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Auto-select best available (wgpu > CPU).
    #[default]
    Auto,
    /// CPU backend using rayon for parallelization.
    Cpu,
    /// wgpu backend (Vulkan/Metal/DX12).
    Wgpu,
}

impl Backend {
    /// Check if this backend is available on current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Cpu => true,
            #[cfg(feature = "wgpu")]
            Self::Wgpu => WgpuBackend::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Wgpu => false,
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Wgpu => "wgpu",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "wgpu" | "gpu" => Ok(Self::Wgpu),
            other => Err(ComputeError::Config(format!("unknown backend: {other}"))),
        }
    }
}

/// Resource limits reported by a backend.
#[derive(Debug, Clone, Copy)]
pub struct BackendLimits {
    /// Largest image side the backend accepts.
    pub max_dim: u32,
    /// Largest single buffer in bytes.
    pub max_buffer_bytes: u64,
    /// Memory available for buffers in bytes.
    pub available_memory: u64,
}

impl BackendLimits {
    /// Check that a `width x height x channels` f32 buffer fits.
    pub fn check(&self, width: u32, height: u32, channels: u32) -> ComputeResult<()> {
        let bytes = buffer_bytes(width, height, channels);
        if width > self.max_dim || height > self.max_dim || bytes > self.max_buffer_bytes {
            return Err(ComputeError::BackendDispatchFailure(format!(
                "{width}x{height}x{channels} buffer ({bytes} bytes) exceeds backend limits"
            )));
        }
        Ok(())
    }
}

/// Size in bytes of an f32 buffer.
pub fn buffer_bytes(width: u32, height: u32, channels: u32) -> u64 {
    (width as u64) * (height as u64) * (channels as u64) * 4
}

/// Handle to an image buffer owned by a backend.
pub trait BufferHandle: Send + 'static {
    /// Buffer dimensions (width, height, channels).
    fn dimensions(&self) -> (u32, u32, u32);

    /// Width.
    fn width(&self) -> u32 { self.dimensions().0 }

    /// Height.
    fn height(&self) -> u32 { self.dimensions().1 }

    /// Channel count.
    fn channels(&self) -> u32 { self.dimensions().2 }

    /// Size in bytes of backend memory used.
    fn size_bytes(&self) -> u64 {
        let (w, h, c) = self.dimensions();
        buffer_bytes(w, h, c)
    }
}

/// Execution backend for flip kernels.
///
/// `dispatch` is synchronous: when it returns, every worker has finished
/// and `dst` may be read.
pub trait FlipBackend: Send + Sync {
    /// Backend-specific buffer type.
    type Buffer: BufferHandle;

    /// Backend name.
    fn name(&self) -> &'static str;

    /// Resource limits.
    fn limits(&self) -> &BackendLimits;

    /// Block size the kernels are compiled for.
    fn block_size(&self) -> u32 {
        BLOCK_SIZE
    }

    /// Resolve a kernel by entry point name.
    fn find_kernel(&self, name: &str) -> ComputeResult<FlipKernel>;

    /// Allocate an uninitialized buffer.
    fn allocate(&self, width: u32, height: u32, channels: u32) -> ComputeResult<Self::Buffer>;

    /// Copy samples into a buffer of matching size.
    fn write(&self, buffer: &mut Self::Buffer, data: &[f32]) -> ComputeResult<()>;

    /// Run `kernel` from `src` into `dst` over `grid`.
    fn dispatch(
        &self,
        kernel: FlipKernel,
        src: &Self::Buffer,
        dst: &mut Self::Buffer,
        grid: WorkGrid,
    ) -> ComputeResult<()>;

    /// Read samples back from a buffer.
    fn download(&self, buffer: &Self::Buffer) -> ComputeResult<Vec<f32>>;
}

/// Shape checks shared by every backend's `dispatch`.
pub(crate) fn validate_dispatch(
    kernel: FlipKernel,
    src: (u32, u32, u32),
    dst: (u32, u32, u32),
    grid: &WorkGrid,
) -> ComputeResult<()> {
    let (sw, sh, c) = src;
    if sw == 0 || sh == 0 {
        return Err(ComputeError::InvalidDimensions(sw, sh));
    }
    if c == 0 {
        return Err(ComputeError::InvalidChannels(c));
    }
    let (ow, oh) = kernel.output_dims(sw, sh);
    if dst != (ow, oh, c) {
        return Err(ComputeError::BackendDispatchFailure(format!(
            "{kernel}: destination is {}x{}x{}, expected {ow}x{oh}x{c}",
            dst.0, dst.1, dst.2
        )));
    }
    if !grid.covers(ow, oh) {
        return Err(ComputeError::BackendDispatchFailure(format!(
            "{kernel}: grid {}x{} of {}px blocks does not cover {ow}x{oh}",
            grid.groups_x, grid.groups_y, grid.block
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("CPU".parse::<Backend>().unwrap(), Backend::Cpu);
        assert_eq!("gpu".parse::<Backend>().unwrap(), Backend::Wgpu);
        assert!("cuda".parse::<Backend>().is_err());
    }

    #[test]
    fn test_validate_dispatch() {
        let grid = WorkGrid::for_output(3, 5, 8);
        assert!(validate_dispatch(FlipKernel::FlipDiag, (5, 3, 4), (3, 5, 4), &grid).is_ok());
        assert!(matches!(
            validate_dispatch(FlipKernel::FlipXAxis, (5, 3, 4), (3, 5, 4), &grid),
            Err(ComputeError::BackendDispatchFailure(_))
        ));
        assert!(matches!(
            validate_dispatch(FlipKernel::FlipXAxis, (0, 3, 4), (0, 3, 4), &grid),
            Err(ComputeError::InvalidDimensions(0, 3))
        ));
    }

    #[test]
    fn test_zero_channels_rejected() {
        let grid = WorkGrid::for_output(2, 2, 8);
        assert!(matches!(
            validate_dispatch(FlipKernel::FlipXAxis, (2, 2, 0), (2, 2, 0), &grid),
            Err(ComputeError::InvalidChannels(0))
        ));
    }

    #[test]
    fn test_grid_too_small_rejected() {
        let grid = WorkGrid { block: 8, groups_x: 1, groups_y: 1 };
        assert!(validate_dispatch(FlipKernel::FlipYAxis, (9, 8, 1), (9, 8, 1), &grid).is_err());
    }

    #[test]
    fn test_limits_check() {
        let limits = BackendLimits { max_dim: 16, max_buffer_bytes: 1024, available_memory: 1024 };
        assert!(limits.check(8, 8, 4).is_ok());
        assert!(limits.check(17, 1, 1).is_err());
        assert!(limits.check(16, 16, 4).is_err());
    }
}
