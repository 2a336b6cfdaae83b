//! Dispatcher tests for imgflip-compute.

use imgflip_compute::{
    ComputeError, CpuBackend, DispatcherConfig, FlipDispatcher, FlipKernel, flip_reference,
};
use imgflip_core::{FlipMode, FlipToggles, Image, PixelFormat};

const A: f32 = 1.0;
const B: f32 = 2.0;
const C: f32 = 3.0;
const D: f32 = 4.0;

fn dispatcher() -> FlipDispatcher<CpuBackend> {
    FlipDispatcher::with_config(CpuBackend::new(), DispatcherConfig { pool_budget: 64 << 20 })
}

/// 2x2 image [[A, B], [C, D]]
fn abcd() -> Image {
    Image::from_f32(vec![A, B, C, D], 2, 2, 1).unwrap()
}

/// Image whose samples encode their own coordinates.
fn gradient(w: u32, h: u32, c: u32) -> Image {
    let data = (0..w * h * c).map(|i| i as f32).collect();
    Image::from_f32(data, w, h, c).unwrap()
}

#[test]
fn test_2x2_flip_x() {
    let out = dispatcher().flip(&abcd(), &[FlipMode::FlipX]).unwrap();
    assert_eq!(out.data(), &[B, A, D, C]);
}

#[test]
fn test_2x2_flip_y() {
    let out = dispatcher().flip(&abcd(), &[FlipMode::FlipY]).unwrap();
    assert_eq!(out.data(), &[C, D, A, B]);
}

#[test]
fn test_2x2_flip_diagonal() {
    let out = dispatcher().flip(&abcd(), &[FlipMode::FlipDiagonal]).unwrap();
    assert_eq!(out.data(), &[A, C, B, D]);
}

#[test]
fn test_1x1_fixed_under_every_mode() {
    let d = dispatcher();
    let img = Image::from_f32(vec![0.25, 0.5, 0.75, 1.0], 1, 1, 4).unwrap();
    for mode in [FlipMode::None, FlipMode::FlipX, FlipMode::FlipY, FlipMode::FlipDiagonal] {
        assert_eq!(d.flip(&img, &[mode]).unwrap(), img, "{mode}");
    }
}

#[test]
fn test_diagonal_swaps_dimensions() {
    let d = dispatcher();
    let img = gradient(13, 5, 3);
    let once = d.flip(&img, &[FlipMode::FlipDiagonal]).unwrap();
    assert_eq!(once.dimensions(), (5, 13, 3));
    assert_eq!(once.pixel(4, 12), img.pixel(12, 4));

    let twice = d.flip(&once, &[FlipMode::FlipDiagonal]).unwrap();
    assert_eq!(twice, img);
}

#[test]
fn test_x_then_y_is_rotation() {
    let img = gradient(9, 7, 2);
    let out = dispatcher().flip(&img, &[FlipMode::FlipX, FlipMode::FlipY]).unwrap();
    for y in 0..7 {
        for x in 0..9 {
            assert_eq!(out.pixel(x, y), img.pixel(8 - x, 6 - y));
        }
    }
}

#[test]
fn test_combined_order_matters() {
    let d = dispatcher();
    let img = gradient(5, 3, 1);
    let all = [FlipMode::FlipX, FlipMode::FlipY, FlipMode::FlipDiagonal];
    let combined = d.flip(&img, &all).unwrap();

    let mut sequential = img.clone();
    for mode in all {
        sequential = d.flip(&sequential, &[mode]).unwrap();
    }
    assert_eq!(combined, sequential);

    // Moving the transpose between the axis flips changes the result
    let permuted = d
        .flip(&img, &[FlipMode::FlipX, FlipMode::FlipDiagonal, FlipMode::FlipY])
        .unwrap();
    assert_eq!(permuted.dimensions(), combined.dimensions());
    assert_ne!(permuted, combined);
}

#[test]
fn test_toggles_apply_in_fixed_order() {
    let d = dispatcher();
    let img = gradient(6, 4, 1);
    let toggles = FlipToggles::new(true, false, true);
    let out = d.apply(&img, toggles).unwrap();
    let expected = flip_reference(&img, &[FlipMode::FlipX, FlipMode::FlipDiagonal]).unwrap();
    assert_eq!(out, expected);
}

#[test]
fn test_matches_reference_on_partial_blocks() {
    let d = dispatcher();
    let modes = [
        vec![FlipMode::FlipX],
        vec![FlipMode::FlipY],
        vec![FlipMode::FlipDiagonal],
        vec![FlipMode::FlipY, FlipMode::FlipDiagonal, FlipMode::FlipX],
    ];
    for (w, h) in [(1, 9), (7, 1), (8, 8), (9, 17), (23, 6), (64, 33)] {
        let img = gradient(w, h, 3);
        for m in &modes {
            assert_eq!(
                d.flip(&img, m).unwrap(),
                flip_reference(&img, m).unwrap(),
                "{w}x{h} {m:?}"
            );
        }
    }
}

#[test]
fn test_non_default_block_size() {
    let d = FlipDispatcher::new(CpuBackend::new().with_block_size(3));
    let img = gradient(10, 7, 1);
    let modes = [FlipMode::FlipDiagonal, FlipMode::FlipY];
    assert_eq!(d.flip(&img, &modes).unwrap(), flip_reference(&img, &modes).unwrap());
}

#[test]
fn test_input_untouched_and_format_kept() {
    let img = Image::from_u8(&[0, 85, 170, 255], 2, 2, 1).unwrap();
    let before = img.clone();
    let out = dispatcher().flip(&img, &[FlipMode::FlipX]).unwrap();
    assert_eq!(img, before);
    assert_eq!(out.format(), PixelFormat::U8);
    assert_eq!(out.to_u8(), vec![85, 0, 255, 170]);
}

#[test]
fn test_invalid_dimensions() {
    let d = dispatcher();
    for (w, h) in [(0, 4), (4, 0), (0, 0)] {
        let img = Image::from_f32(vec![], w, h, 4).unwrap();
        match d.flip(&img, &[FlipMode::FlipX]) {
            Err(ComputeError::InvalidDimensions(ew, eh)) => assert_eq!((ew, eh), (w, h)),
            other => panic!("expected InvalidDimensions, got {other:?}"),
        }
    }
    assert_eq!(d.pool_stats().leased, 0);
}

#[test]
fn test_kernel_not_found() {
    let d = FlipDispatcher::new(CpuBackend::with_kernels(&[FlipKernel::FlipXAxis]));
    assert!(d.flip(&abcd(), &[FlipMode::FlipX]).is_ok());

    let err = d.flip(&abcd(), &[FlipMode::FlipX, FlipMode::FlipDiagonal]).unwrap_err();
    assert!(matches!(err, ComputeError::KernelNotFound(ref name) if name == "FlipDiag"));
    assert_eq!(d.pool_stats().leased, 0);
}

#[test]
fn test_no_leases_survive_a_flip() {
    let d = dispatcher();
    let img = gradient(16, 12, 4);
    for _ in 0..5 {
        d.flip(&img, &[FlipMode::FlipX, FlipMode::FlipY, FlipMode::FlipDiagonal]).unwrap();
        assert_eq!(d.pool_stats().leased, 0);
    }
}

#[test]
fn test_pool_reused_across_frames() {
    let d = dispatcher();
    let img = gradient(16, 12, 4);
    let modes = [FlipMode::FlipX, FlipMode::FlipDiagonal];

    d.flip(&img, &modes).unwrap();
    let first = d.pool_stats();
    d.flip(&img, &modes).unwrap();
    let second = d.pool_stats();

    // second frame allocates nothing new
    assert_eq!(second.misses, first.misses);
    assert!(second.hits > first.hits);

    d.trim();
    assert_eq!(d.pool_stats().free, 0);
}

#[test]
fn test_zero_pool_budget_still_works() {
    let d = FlipDispatcher::with_config(CpuBackend::new(), DispatcherConfig { pool_budget: 0 });
    let img = gradient(4, 4, 1);
    let out = d.flip(&img, &[FlipMode::FlipY]).unwrap();
    assert_eq!(out, flip_reference(&img, &[FlipMode::FlipY]).unwrap());
    let stats = d.pool_stats();
    assert_eq!((stats.leased, stats.free), (0, 0));
}

#[test]
fn test_dispatcher_shared_across_threads() {
    let d = std::sync::Arc::new(dispatcher());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let d = d.clone();
            std::thread::spawn(move || {
                let img = gradient(8 + i, 5, 2);
                let out = d.flip(&img, &[FlipMode::FlipDiagonal]).unwrap();
                assert_eq!(out, flip_reference(&img, &[FlipMode::FlipDiagonal]).unwrap());
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(d.pool_stats().leased, 0);
}
