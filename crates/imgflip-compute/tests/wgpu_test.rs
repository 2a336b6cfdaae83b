//! wgpu backend tests. Skipped when no adapter is present.

#![cfg(feature = "wgpu")]

use imgflip_compute::{
    ComputeError, FlipBackend, FlipDispatcher, FlipKernel, WgpuBackend, WorkGrid, flip_reference,
};
use imgflip_core::{FlipMode, Image};

fn gpu() -> Option<FlipDispatcher<WgpuBackend>> {
    if !WgpuBackend::is_available() {
        eprintln!("no wgpu adapter, skipping");
        return None;
    }
    Some(FlipDispatcher::new(WgpuBackend::new().ok()?))
}

fn gradient(w: u32, h: u32, c: u32) -> Image {
    Image::from_f32((0..w * h * c).map(|i| i as f32).collect(), w, h, c).unwrap()
}

#[test]
fn test_gpu_matches_reference() {
    let Some(d) = gpu() else { return };
    let modes = [
        vec![FlipMode::FlipX],
        vec![FlipMode::FlipY],
        vec![FlipMode::FlipDiagonal],
        vec![FlipMode::FlipX, FlipMode::FlipY, FlipMode::FlipDiagonal],
    ];
    for (w, h) in [(1, 1), (2, 2), (9, 17), (33, 8)] {
        let img = gradient(w, h, 4);
        for m in &modes {
            assert_eq!(d.flip(&img, m).unwrap(), flip_reference(&img, m).unwrap(), "{w}x{h} {m:?}");
        }
    }
    assert_eq!(d.pool_stats().leased, 0);
}

#[test]
fn test_gpu_kernels_registered() {
    let Some(d) = gpu() else { return };
    for kernel in FlipKernel::ALL {
        assert_eq!(d.backend().find_kernel(kernel.name()).unwrap(), kernel);
    }
    assert!(matches!(d.backend().find_kernel("Blur"), Err(ComputeError::KernelNotFound(_))));
}

#[test]
fn test_gpu_rejects_mismatched_block() {
    let Some(d) = gpu() else { return };
    let backend = d.backend();
    let mut src = backend.allocate(4, 4, 1).unwrap();
    backend.write(&mut src, &[0.0; 16]).unwrap();
    let mut dst = backend.allocate(4, 4, 1).unwrap();
    let grid = WorkGrid::for_output(4, 4, 4);
    assert!(matches!(
        backend.dispatch(FlipKernel::FlipXAxis, &src, &mut dst, grid),
        Err(ComputeError::BackendDispatchFailure(_))
    ));
}
