//! Flip dispatcher: resolves kernels, stages buffers, dispatches the grid.
//!
//! # Buffer lifetime
//!
//! A flip leases one working buffer for the input and one result buffer
//! per kernel from the dispatcher's [`TempPool`]. Each kernel's result
//! becomes the next working buffer and the previous one goes back to the
//! pool at once. The final buffer is downloaded into a new [`Image`] and
//! released, so no lease outlives the call, on success or error.

use imgflip_core::{FlipMode, FlipToggles, Image};
use tracing::{debug, trace};

use crate::backend::{Backend, BufferHandle, CpuBackend, FlipBackend, memory, select_best_backend};
#[cfg(feature = "wgpu")]
use crate::backend::WgpuBackend;
use crate::kernel::{FlipKernel, WorkGrid};
use crate::pool::{PoolStats, TempPool};
use crate::{ComputeError, ComputeResult};

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Byte budget for idle pooled buffers.
    pub pool_budget: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { pool_budget: memory::pool_budget() }
    }
}

/// Anything that can flip an image.
pub trait FlipExecutor {
    /// Backend name.
    fn name(&self) -> &'static str;

    /// Apply `modes` in order, returning a new image.
    fn flip(&self, image: &Image, modes: &[FlipMode]) -> ComputeResult<Image>;

    /// Apply the modes enabled in `toggles` (X, then Y, then diagonal).
    fn apply(&self, image: &Image, toggles: FlipToggles) -> ComputeResult<Image> {
        self.flip(image, &toggles.modes())
    }
}

/// Runs flip kernels on a backend.
pub struct FlipDispatcher<B: FlipBackend> {
    backend: B,
    pool: TempPool<B::Buffer>,
}

impl<B: FlipBackend> FlipDispatcher<B> {
    /// Create dispatcher with default config.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, DispatcherConfig::default())
    }

    /// Create dispatcher with custom config.
    pub fn with_config(backend: B, config: DispatcherConfig) -> Self {
        Self {
            backend,
            pool: TempPool::with_budget(config.pool_budget),
        }
    }

    /// Underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Temporary buffer pool counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Drop idle pooled buffers.
    pub fn trim(&self) {
        self.pool.clear();
    }

    /// Flip `image` through `modes`, applied in list order.
    ///
    /// Kernels are resolved before anything is dispatched, so a missing
    /// kernel fails the call without touching the backend.
    pub fn flip(&self, image: &Image, modes: &[FlipMode]) -> ComputeResult<Image> {
        let (w, h, c) = image.dimensions();
        if w == 0 || h == 0 {
            return Err(ComputeError::InvalidDimensions(w, h));
        }

        let kernels = modes
            .iter()
            .filter_map(|m| m.kernel_name())
            .map(|name| self.backend.find_kernel(name))
            .collect::<ComputeResult<Vec<FlipKernel>>>()?;

        debug!(backend = self.backend.name(), w, h, c, kernels = kernels.len(), "flip");

        let mut working = self.pool.acquire(w, h, c, || self.backend.allocate(w, h, c))?;
        self.backend.write(&mut working, image.data())?;

        let block = self.backend.block_size();
        for kernel in kernels {
            let (sw, sh, _) = working.dimensions();
            let (ow, oh) = kernel.output_dims(sw, sh);
            let grid = WorkGrid::for_output(ow, oh, block);

            let mut result = self.pool.acquire(ow, oh, c, || self.backend.allocate(ow, oh, c))?;
            trace!(kernel = %kernel, ow, oh, groups = grid.group_count(), "dispatch");
            self.backend.dispatch(kernel, &working, &mut result, grid)?;
            // Previous working buffer goes back to the pool here.
            working = result;
        }

        let (ow, oh, _) = working.dimensions();
        let data = self.backend.download(&working)?;
        drop(working);

        Ok(Image::with_format(data, ow, oh, c, image.format())?)
    }

    /// Flip with the modes enabled in `toggles`.
    pub fn apply(&self, image: &Image, toggles: FlipToggles) -> ComputeResult<Image> {
        self.flip(image, &toggles.modes())
    }
}

impl<B: FlipBackend> FlipExecutor for FlipDispatcher<B> {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    fn flip(&self, image: &Image, modes: &[FlipMode]) -> ComputeResult<Image> {
        FlipDispatcher::flip(self, image, modes)
    }
}

/// Dispatcher over a backend chosen at runtime.
pub enum AnyDispatcher {
    Cpu(FlipDispatcher<CpuBackend>),
    #[cfg(feature = "wgpu")]
    Wgpu(FlipDispatcher<WgpuBackend>),
}

impl AnyDispatcher {
    /// Pool counters of the wrapped dispatcher.
    pub fn pool_stats(&self) -> PoolStats {
        match self {
            Self::Cpu(d) => d.pool_stats(),
            #[cfg(feature = "wgpu")]
            Self::Wgpu(d) => d.pool_stats(),
        }
    }
}

impl FlipExecutor for AnyDispatcher {
    fn name(&self) -> &'static str {
        match self {
            Self::Cpu(d) => d.backend().name(),
            #[cfg(feature = "wgpu")]
            Self::Wgpu(d) => d.backend().name(),
        }
    }

    fn flip(&self, image: &Image, modes: &[FlipMode]) -> ComputeResult<Image> {
        match self {
            Self::Cpu(d) => d.flip(image, modes),
            #[cfg(feature = "wgpu")]
            Self::Wgpu(d) => d.flip(image, modes),
        }
    }
}

/// Create a dispatcher for the specified backend.
pub fn create_dispatcher(backend: Backend, config: DispatcherConfig) -> ComputeResult<AnyDispatcher> {
    match backend {
        Backend::Auto => create_dispatcher(select_best_backend(), config),
        Backend::Cpu => Ok(AnyDispatcher::Cpu(FlipDispatcher::with_config(CpuBackend::new(), config))),
        Backend::Wgpu => {
            #[cfg(feature = "wgpu")]
            {
                let gpu = WgpuBackend::new()?;
                Ok(AnyDispatcher::Wgpu(FlipDispatcher::with_config(gpu, config)))
            }
            #[cfg(not(feature = "wgpu"))]
            {
                let _ = config;
                Err(ComputeError::BackendNotAvailable(
                    "wgpu feature not enabled".to_string()
                ))
            }
        }
    }
}
