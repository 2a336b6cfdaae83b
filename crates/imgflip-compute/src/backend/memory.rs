//! Memory budgeting and environment overrides.
//!
//! # Environment Variables
//!
//! - `IMGFLIP_BACKEND` - Backend override (`auto`, `cpu`, `wgpu`)
//! - `IMGFLIP_POOL_MB` - Byte budget for idle pooled buffers, in megabytes

use std::env;
use std::sync::OnceLock;

/// Fraction of available memory idle pooled buffers may hold.
pub const POOL_MEMORY_FRACTION: f64 = 0.05;

/// Cap on the default pool budget (1 GB).
pub const MAX_DEFAULT_POOL_BYTES: u64 = 1 << 30;

static AVAILABLE_MEMORY: OnceLock<u64> = OnceLock::new();

/// Detect available system RAM in bytes.
pub fn available_memory() -> u64 {
    *AVAILABLE_MEMORY.get_or_init(|| {
        sys_info::mem_info()
            .map(|m| m.avail * 1024) // KB to bytes
            .unwrap_or(4 * 1024 * 1024 * 1024) // 4 GB fallback
    })
}

/// Budget for idle buffers kept by a [`TempPool`](crate::TempPool).
///
/// Priority:
/// 1. `IMGFLIP_POOL_MB`
/// 2. 5% of available memory, capped at 1 GB
pub fn pool_budget() -> u64 {
    if let Some(mb) = pool_mb_override() {
        return mb.saturating_mul(1024 * 1024);
    }
    ((available_memory() as f64 * POOL_MEMORY_FRACTION) as u64).min(MAX_DEFAULT_POOL_BYTES)
}

/// Backend override from environment.
pub fn backend_override() -> Option<String> {
    env::var("IMGFLIP_BACKEND").ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn pool_mb_override() -> Option<u64> {
    env::var("IMGFLIP_POOL_MB")
        .ok()
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_memory_nonzero() {
        assert!(available_memory() > 0);
    }

    #[test]
    fn test_pool_budget_capped() {
        if pool_mb_override().is_none() {
            assert!(pool_budget() <= MAX_DEFAULT_POOL_BYTES);
        }
    }
}
