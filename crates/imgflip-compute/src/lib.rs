//! Compute-kernel image flips.
//!
//! Flips run as per-pixel remap kernels dispatched over a 2D grid of
//! fixed-size blocks. Kernels execute on a CPU backend (rayon) or, with the
//! `wgpu` feature, on the GPU through WGSL compute shaders.
//!
//! # Architecture
//!
//! ```text
//! FrameDriver (per-tick recompute, injected DisplaySink)
//!     └── FlipDispatcher<B: FlipBackend>
//!             ├── TempPool      (scoped temporary buffers)
//!             └── FlipBackend trait
//!                     ├── CpuBackend  (rayon worker grid)
//!                     └── WgpuBackend (compute shaders)
//! ```
//!
//! # Example
//!
//! ```
//! use imgflip_compute::{FlipDispatcher, CpuBackend};
//! use imgflip_core::{FlipMode, Image};
//!
//! let img = Image::from_f32(vec![1.0, 2.0, 3.0, 4.0], 2, 2, 1)?;
//! let flipper = FlipDispatcher::new(CpuBackend::new());
//! let out = flipper.flip(&img, &[FlipMode::FlipX])?;
//! assert_eq!(out.data(), &[2.0, 1.0, 4.0, 3.0]);
//! # Ok::<(), imgflip_compute::ComputeError>(())
//! ```

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod frame;
pub mod kernel;
pub mod pool;
pub mod reference;
mod shaders;

pub use backend::{Backend, BackendLimits, BufferHandle, CpuBackend, CpuBuffer, FlipBackend, describe_backends, detect_backends, select_best_backend};
#[cfg(feature = "wgpu")]
pub use backend::{WgpuBackend, WgpuBuffer};
pub use config::FlipConfig;
pub use dispatcher::{AnyDispatcher, DispatcherConfig, FlipDispatcher, FlipExecutor, create_dispatcher};
pub use frame::{DisplaySink, FrameDriver, Viewport, ViewportSink};
pub use kernel::{BLOCK_SIZE, FlipKernel, WorkGrid};
pub use pool::{Lease, PoolStats, TempPool};
pub use reference::flip_reference;

use thiserror::Error;

/// Flip and backend errors.
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("Invalid dimensions: {0}x{1}")]
    InvalidDimensions(u32, u32),

    #[error("Invalid channel count: {0}")]
    InvalidChannels(u32),

    #[error("Kernel not found: {0}")]
    KernelNotFound(String),

    #[error("Backend dispatch failed: {0}")]
    BackendDispatchFailure(String),

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Image(#[from] imgflip_core::Error),
}

pub type ComputeResult<T> = Result<T, ComputeError>;
