//! CLI command implementations

pub mod backends;
pub mod flip;
pub mod run;

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use imgflip_compute::{AnyDispatcher, Backend, FlipConfig, create_dispatcher};
use imgflip_core::{FlipMode, FlipToggles, Image, PixelFormat};

use crate::{FlipSelect, Globals};

/// Load image from path
pub fn load_image(path: &Path) -> Result<Image> {
    read_png(path).with_context(|| format!("Failed to load: {}", path.display()))
}

/// Save image to path
pub fn save_image(path: &Path, image: &Image) -> Result<()> {
    write_png(path, image).with_context(|| format!("Failed to save: {}", path.display()))
}

/// Load the config file, if one was given.
pub fn load_config(globals: &Globals) -> Result<FlipConfig> {
    match &globals.config {
        Some(path) => FlipConfig::load(path)
            .with_context(|| format!("Failed to read config: {}", path.display())),
        None => Ok(FlipConfig::default()),
    }
}

/// Build the dispatcher from `--backend`, then config, then `auto`.
pub fn make_dispatcher(globals: &Globals, config: &FlipConfig) -> Result<AnyDispatcher> {
    let backend: Backend = match &globals.backend {
        Some(name) => name.parse()?,
        None => config.backend()?,
    };
    create_dispatcher(backend, config.dispatcher_config())
        .with_context(|| format!("Failed to create {} backend", backend))
}

/// Ordered modes: explicit `--mode` list, else toggles from flags and config.
pub fn resolve_modes(select: &FlipSelect, config: &FlipConfig) -> Vec<FlipMode> {
    if !select.mode.is_empty() {
        return select.mode.clone();
    }
    resolve_toggles(select, config).modes()
}

/// Toggles from flags OR-ed with the config file.
pub fn resolve_toggles(select: &FlipSelect, config: &FlipConfig) -> FlipToggles {
    FlipToggles::new(select.flip_x, select.flip_y, select.flip_diag).union(config.toggles)
}

fn read_png(path: &Path) -> Result<Image> {
    let file = File::open(path)?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    // palette and sub-byte gray to 8-bit
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder.read_info()?;

    let buf_size = reader
        .output_buffer_size()
        .context("cannot determine output buffer size")?;
    let mut buf = vec![0u8; buf_size];
    let info = reader.next_frame(&mut buf)?;
    let bytes = &buf[..info.buffer_size()];

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => bail!("unsupported PNG color type: {:?}", other),
    };

    let image = match info.bit_depth {
        png::BitDepth::Eight => Image::from_u8(bytes, info.width, info.height, channels)?,
        png::BitDepth::Sixteen => {
            let samples: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .collect();
            Image::from_u16(&samples, info.width, info.height, channels)?
        }
        other => bail!("unsupported PNG bit depth: {:?}", other),
    };
    Ok(image)
}

fn write_png(path: &Path, image: &Image) -> Result<()> {
    let color_type = match image.channels() {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => bail!("unsupported channel count: {}", n),
    };

    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color_type);

    match image.format() {
        PixelFormat::U16 => {
            encoder.set_depth(png::BitDepth::Sixteen);
            let bytes: Vec<u8> = image.to_u16().iter().flat_map(|v| v.to_be_bytes()).collect();
            encoder.write_header()?.write_image_data(&bytes)?;
        }
        PixelFormat::U8 | PixelFormat::F32 => {
            encoder.set_depth(png::BitDepth::Eight);
            encoder.write_header()?.write_image_data(&image.to_u8())?;
        }
    }
    Ok(())
}
