//! Property tests: flips against the single-threaded reference.

use imgflip_compute::{CpuBackend, FlipDispatcher, flip_reference};
use imgflip_core::{FlipMode, Image};
use proptest::prelude::*;

fn image_strategy() -> impl Strategy<Value = Image> {
    (1u32..24, 1u32..24, 1u32..5).prop_flat_map(|(w, h, c)| {
        prop::collection::vec(-4.0f32..4.0, (w * h * c) as usize)
            .prop_map(move |data| Image::from_f32(data, w, h, c).unwrap())
    })
}

fn mode_strategy() -> impl Strategy<Value = FlipMode> {
    prop_oneof![
        Just(FlipMode::None),
        Just(FlipMode::FlipX),
        Just(FlipMode::FlipY),
        Just(FlipMode::FlipDiagonal),
    ]
}

proptest! {
    #[test]
    fn prop_single_mode_is_involution(img in image_strategy(), mode in mode_strategy()) {
        let d = FlipDispatcher::new(CpuBackend::new());
        let once = d.flip(&img, &[mode]).unwrap();
        let twice = d.flip(&once, &[mode]).unwrap();
        prop_assert_eq!(twice, img);
    }

    #[test]
    fn prop_x_then_y_rotates_180(img in image_strategy()) {
        let d = FlipDispatcher::new(CpuBackend::new());
        let out = d.flip(&img, &[FlipMode::FlipX, FlipMode::FlipY]).unwrap();
        let (w, h, _) = img.dimensions();
        for y in 0..h {
            for x in 0..w {
                prop_assert_eq!(out.pixel(x, y), img.pixel(w - 1 - x, h - 1 - y));
            }
        }
    }

    #[test]
    fn prop_diagonal_transposes(img in image_strategy()) {
        let d = FlipDispatcher::new(CpuBackend::new());
        let out = d.flip(&img, &[FlipMode::FlipDiagonal]).unwrap();
        let (w, h, c) = img.dimensions();
        prop_assert_eq!(out.dimensions(), (h, w, c));
        for y in 0..h {
            for x in 0..w {
                prop_assert_eq!(out.pixel(y, x), img.pixel(x, y));
            }
        }
    }

    #[test]
    fn prop_matches_reference(
        img in image_strategy(),
        modes in prop::collection::vec(mode_strategy(), 0..5),
        block in 1u32..10,
    ) {
        let d = FlipDispatcher::new(CpuBackend::new().with_block_size(block));
        let out = d.flip(&img, &modes).unwrap();
        prop_assert_eq!(out, flip_reference(&img, &modes).unwrap());
        prop_assert_eq!(d.pool_stats().leased, 0);
    }
}
