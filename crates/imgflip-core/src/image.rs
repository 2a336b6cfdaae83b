//! Owned image buffer.
//!
//! Samples are stored as interleaved `f32` in row-major order with the
//! origin at the top-left corner. [`PixelFormat`] remembers the depth the
//! samples came from so writers can round-trip them.

use crate::{Error, Result};

/// Storage depth of the samples an [`Image`] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// 8-bit unsigned integer per channel, normalized to `0.0..=1.0`.
    #[default]
    U8,
    /// 16-bit unsigned integer per channel, normalized to `0.0..=1.0`.
    U16,
    /// 32-bit float per channel, stored as-is.
    F32,
}

impl PixelFormat {
    /// Bytes per channel in the original storage.
    pub fn bytes_per_channel(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::F32 => 4,
        }
    }
}

/// Image stored in CPU memory.
#[derive(Clone, PartialEq)]
pub struct Image {
    data: Vec<f32>,
    width: u32,
    height: u32,
    channels: u32,
    format: PixelFormat,
}

impl Image {
    /// Create from f32 samples.
    pub fn from_f32(data: Vec<f32>, width: u32, height: u32, channels: u32) -> Result<Self> {
        Self::with_format(data, width, height, channels, PixelFormat::F32)
    }

    /// Create from f32 samples, tagging the original storage depth.
    pub fn with_format(
        data: Vec<f32>,
        width: u32,
        height: u32,
        channels: u32,
        format: PixelFormat,
    ) -> Result<Self> {
        if channels == 0 {
            return Err(Error::UnsupportedFormat("zero channels".into()));
        }
        let expected = sample_count(width, height, channels)?;
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { data, width, height, channels, format })
    }

    /// Create from 8-bit samples.
    pub fn from_u8(data: &[u8], width: u32, height: u32, channels: u32) -> Result<Self> {
        let samples = data.iter().map(|&v| v as f32 / 255.0).collect();
        Self::with_format(samples, width, height, channels, PixelFormat::U8)
    }

    /// Create from 16-bit samples.
    pub fn from_u16(data: &[u16], width: u32, height: u32, channels: u32) -> Result<Self> {
        let samples = data.iter().map(|&v| v as f32 / 65535.0).collect();
        Self::with_format(samples, width, height, channels, PixelFormat::U16)
    }

    /// Create an image filled with zeros.
    pub fn new(width: u32, height: u32, channels: u32) -> Result<Self> {
        let size = sample_count(width, height, channels)?;
        Self::from_f32(vec![0.0; size], width, height, channels)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Channels per pixel.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Original storage depth.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Image dimensions `(width, height, channels)`.
    pub fn dimensions(&self) -> (u32, u32, u32) {
        (self.width, self.height, self.channels)
    }

    /// Whether the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Sample data.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume the image and return its samples.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Samples of pixel `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[f32]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let c = self.channels as usize;
        let idx = (y as usize * self.width as usize + x as usize) * c;
        self.data.get(idx..idx + c)
    }

    /// Size of the sample buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Quantize samples to 8 bits.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
            .collect()
    }

    /// Quantize samples to 16 bits.
    pub fn to_u16(&self) -> Vec<u16> {
        self.data
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 65535.0 + 0.5) as u16)
            .collect()
    }
}

fn sample_count(width: u32, height: u32, channels: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(channels as usize))
        .ok_or(Error::invalid_dimensions(width, height))
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("format", &self.format)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}
