//! Flip kernels and the worker grid they run on.
//!
//! A kernel is identified by name (`FlipXAxis`, `FlipYAxis`, `FlipDiag`).
//! Every backend resolves names through [`FlipKernel::from_name`] so the
//! CPU and GPU paths agree on the inverse mapping.

use imgflip_core::FlipMode;

/// Reference block size: each work group covers 8x8 output pixels.
pub const BLOCK_SIZE: u32 = 8;

/// A compiled flip kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlipKernel {
    /// Mirror across the vertical axis.
    FlipXAxis,
    /// Mirror across the horizontal axis.
    FlipYAxis,
    /// Transpose.
    FlipDiag,
}

impl FlipKernel {
    /// All kernels, in canonical order.
    pub const ALL: [FlipKernel; 3] = [Self::FlipXAxis, Self::FlipYAxis, Self::FlipDiag];

    /// Kernel entry point name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlipXAxis => "FlipXAxis",
            Self::FlipYAxis => "FlipYAxis",
            Self::FlipDiag => "FlipDiag",
        }
    }

    /// Look up a kernel by entry point name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Kernel that implements `mode`, if any.
    pub fn for_mode(mode: FlipMode) -> Option<Self> {
        mode.kernel_name().and_then(Self::from_name)
    }

    /// Output dimensions for a `width x height` source.
    pub fn output_dims(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::FlipDiag => (height, width),
            _ => (width, height),
        }
    }

    /// Source coordinate read by the worker writing output `(x, y)`.
    ///
    /// `(x, y)` must lie inside the output image.
    #[inline]
    pub fn source_coord(&self, x: u32, y: u32, src_w: u32, src_h: u32) -> (u32, u32) {
        match self {
            Self::FlipXAxis => (src_w - 1 - x, y),
            Self::FlipYAxis => (x, src_h - 1 - y),
            Self::FlipDiag => (y, x),
        }
    }
}

impl std::fmt::Display for FlipKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid of work groups covering an output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGrid {
    /// Side of a square block, in pixels.
    pub block: u32,
    /// Work groups along x.
    pub groups_x: u32,
    /// Work groups along y.
    pub groups_y: u32,
}

impl WorkGrid {
    /// Smallest grid of `block x block` groups covering `width x height`.
    ///
    /// Edge groups may extend past the image; their out-of-range workers
    /// do nothing.
    pub fn for_output(width: u32, height: u32, block: u32) -> Self {
        let block = block.max(1);
        Self {
            block,
            groups_x: width.div_ceil(block),
            groups_y: height.div_ceil(block),
        }
    }

    /// Whether the grid reaches every pixel of `width x height`.
    pub fn covers(&self, width: u32, height: u32) -> bool {
        let block = self.block as u64;
        self.groups_x as u64 * block >= width as u64 && self.groups_y as u64 * block >= height as u64
    }

    /// Total number of work groups.
    pub fn group_count(&self) -> u64 {
        self.groups_x as u64 * self.groups_y as u64
    }

    /// Total number of workers, including idle edge workers.
    pub fn worker_count(&self) -> u64 {
        self.group_count() * (self.block as u64 * self.block as u64)
    }
}
