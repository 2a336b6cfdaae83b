//! Backend probing and auto-selection.
//!
//! A backend counts as usable only when it resolves every flip kernel;
//! a partial kernel set would fail the first flip that needs the
//! missing entry point.

use super::{Backend, CpuBackend, FlipBackend};
use crate::kernel::FlipKernel;

/// What a probe found out about one backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    /// Backend probed.
    pub backend: Backend,
    /// Whether the backend could be created.
    pub available: bool,
    /// Kernels the backend resolves by name.
    pub kernels: Vec<FlipKernel>,
    /// Work group side the kernels run with.
    pub block_size: u32,
    /// Device or failure detail.
    pub detail: String,
}

impl BackendInfo {
    fn probed<B: FlipBackend>(backend: Backend, b: &B, detail: String) -> Self {
        Self {
            backend,
            available: true,
            kernels: resolved_kernels(b),
            block_size: b.block_size(),
            detail,
        }
    }

    #[cfg_attr(not(feature = "wgpu"), allow(dead_code))]
    fn unavailable(backend: Backend, detail: String) -> Self {
        Self { backend, available: false, kernels: Vec::new(), block_size: 0, detail }
    }

    /// Available and resolves all of [`FlipKernel::ALL`].
    pub fn is_complete(&self) -> bool {
        self.available && FlipKernel::ALL.iter().all(|k| self.kernels.contains(k))
    }

    /// Auto-selection rank, higher wins. Incomplete backends rank zero.
    pub fn priority(&self) -> u32 {
        if !self.is_complete() {
            return 0;
        }
        match self.backend {
            Backend::Wgpu => 100,
            Backend::Cpu => 10,
            Backend::Auto => 0,
        }
    }
}

/// Kernels from [`FlipKernel::ALL`] that `backend` resolves.
pub fn resolved_kernels<B: FlipBackend>(backend: &B) -> Vec<FlipKernel> {
    FlipKernel::ALL
        .into_iter()
        .filter(|k| backend.find_kernel(k.name()).is_ok())
        .collect()
}

/// Probe every compiled-in backend, best first.
pub fn detect_backends() -> Vec<BackendInfo> {
    let cpu = CpuBackend::new();
    #[allow(unused_mut)]
    let mut found = vec![BackendInfo::probed(
        Backend::Cpu,
        &cpu,
        format!("rayon, {} threads", rayon::current_num_threads()),
    )];

    #[cfg(feature = "wgpu")]
    found.push(match super::WgpuBackend::new() {
        Ok(gpu) => {
            let detail = gpu.adapter_name().to_string();
            BackendInfo::probed(Backend::Wgpu, &gpu, detail)
        }
        Err(e) => BackendInfo::unavailable(Backend::Wgpu, e.to_string()),
    });

    found.sort_by(|a, b| b.priority().cmp(&a.priority()));
    found
}

/// Highest ranked complete backend, CPU if none qualifies.
pub fn select_best_backend() -> Backend {
    detect_backends()
        .into_iter()
        .filter(BackendInfo::is_complete)
        .max_by_key(BackendInfo::priority)
        .map(|b| b.backend)
        .unwrap_or(Backend::Cpu)
}

/// One line per backend: status, kernels, block size, detail.
pub fn describe_backends() -> String {
    let mut desc = String::new();
    for info in detect_backends() {
        let status = if info.is_complete() { "+" } else { "-" };
        if info.available {
            let names: Vec<_> = info.kernels.iter().map(|k| k.name()).collect();
            desc.push_str(&format!(
                "[{}] {}: {} ({}x{} blocks, {})\n",
                status,
                info.backend,
                names.join(", "),
                info.block_size,
                info.block_size,
                info.detail
            ));
        } else {
            desc.push_str(&format!("[{}] {}: unavailable ({})\n", status, info.backend, info.detail));
        }
    }
    desc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_resolves_every_kernel() {
        let cpu = detect_backends().into_iter().find(|b| b.backend == Backend::Cpu).unwrap();
        assert!(cpu.is_complete());
        assert_eq!(cpu.kernels, FlipKernel::ALL.to_vec());
        assert_eq!(cpu.block_size, 8);
    }

    #[test]
    fn test_partial_kernel_set_is_not_selectable() {
        let partial = CpuBackend::with_kernels(&[FlipKernel::FlipXAxis, FlipKernel::FlipDiag]);
        let info = BackendInfo::probed(Backend::Cpu, &partial, String::new());
        assert_eq!(info.kernels, vec![FlipKernel::FlipXAxis, FlipKernel::FlipDiag]);
        assert!(!info.is_complete());
        assert_eq!(info.priority(), 0);
    }

    #[test]
    fn test_best_backend_is_concrete() {
        assert_ne!(select_best_backend(), Backend::Auto);
    }

    #[test]
    fn test_describe_lists_cpu_kernels() {
        let desc = describe_backends();
        assert!(desc.contains("[+] cpu: FlipXAxis, FlipYAxis, FlipDiag (8x8 blocks"), "{desc}");
    }
}
