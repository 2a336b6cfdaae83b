//! Single-threaded reference flips.
//!
//! Same contract as [`FlipDispatcher::flip`](crate::FlipDispatcher::flip),
//! computed pixel by pixel with no worker grid. Backends are tested against
//! these results.

use imgflip_core::{FlipMode, Image};

use crate::{ComputeError, ComputeResult};

/// Apply `modes` in order.
pub fn flip_reference(image: &Image, modes: &[FlipMode]) -> ComputeResult<Image> {
    let (w, h, _) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(ComputeError::InvalidDimensions(w, h));
    }

    let mut current = image.clone();
    for &mode in modes {
        current = flip_once(&current, mode)?;
    }
    Ok(current)
}

/// Apply a single mode.
pub fn flip_once(image: &Image, mode: FlipMode) -> ComputeResult<Image> {
    let (w, h, c) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(ComputeError::InvalidDimensions(w, h));
    }
    if mode == FlipMode::None {
        return Ok(image.clone());
    }

    let (ow, oh) = mode.output_dims(w, h);
    let c = c as usize;
    let src = image.data();
    let mut out = Vec::with_capacity(src.len());

    for y in 0..oh {
        for x in 0..ow {
            let (sx, sy) = match mode {
                FlipMode::FlipX => (w - 1 - x, y),
                FlipMode::FlipY => (x, h - 1 - y),
                FlipMode::FlipDiagonal => (y, x),
                FlipMode::None => (x, y),
            };
            let s = (sy as usize * w as usize + sx as usize) * c;
            out.extend_from_slice(&src[s..s + c]);
        }
    }

    Ok(Image::with_format(out, ow, oh, c as u32, image.format())?)
}
