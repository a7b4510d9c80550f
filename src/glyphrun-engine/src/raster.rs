//! Bitmap description handed to `RunOcrPipeline`
//!
//! The engine reads pixels straight out of caller memory through a small
//! fixed-layout record. [`RawRaster`] is that record byte for byte;
//! [`RasterDescriptor`] wraps it with a borrow of the pixel buffer so the
//! buffer cannot be freed or moved while the descriptor is alive.

use std::marker::PhantomData;
use std::mem::{offset_of, size_of};

use image::DynamicImage;
use tracing::debug;

use crate::error::{EngineError, Result};

/// Engine pixel layout tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum PixelFormat {
    /// 8 bits per channel, B G R A byte order
    Bgra8 = 3,
}

impl PixelFormat {
    pub fn channels(self) -> u32 {
        match self {
            PixelFormat::Bgra8 => 4,
        }
    }
}

/// Exact in-memory image of the engine's bitmap record.
///
/// | offset | field                | size |
/// |-------:|----------------------|-----:|
/// | 0      | `pixel_format`       | 4    |
/// | 4      | `width`              | 4    |
/// | 8      | `height`             | 4    |
/// | 12     | `reserved`           | 4    |
/// | 16     | `row_stride`         | 8    |
/// | 24     | `pixel_data_address` | 8    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct RawRaster {
    pub pixel_format: i32,
    pub width: i32,
    pub height: i32,
    /// Padding the engine expects to be zero.
    pub reserved: i32,
    pub row_stride: i64,
    pub pixel_data_address: i64,
}

const _: () = {
    assert!(size_of::<RawRaster>() == 32);
    assert!(offset_of!(RawRaster, pixel_format) == 0);
    assert!(offset_of!(RawRaster, width) == 4);
    assert!(offset_of!(RawRaster, height) == 8);
    assert!(offset_of!(RawRaster, reserved) == 12);
    assert!(offset_of!(RawRaster, row_stride) == 16);
    assert!(offset_of!(RawRaster, pixel_data_address) == 24);
};

/// Validated, borrowed view over decoded pixels
#[derive(Debug, Clone, Copy)]
pub struct Raster<'a> {
    width: u32,
    height: u32,
    channels: u32,
    stride: usize,
    pixels: &'a [u8],
}

impl<'a> Raster<'a> {
    /// Wrap a pixel buffer whose rows are `stride` bytes apart.
    ///
    /// At least `stride * height` bytes must be present.
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        stride: usize,
        pixels: &'a [u8],
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidRaster(format!(
                "zero-sized image {}x{}",
                width, height
            )));
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(EngineError::InvalidRaster(format!(
                "dimensions {}x{} exceed engine limits",
                width, height
            )));
        }

        let min_stride = (width as usize)
            .checked_mul(channels as usize)
            .ok_or_else(|| EngineError::InvalidRaster("row size overflows".to_string()))?;
        if stride < min_stride {
            return Err(EngineError::InvalidRaster(format!(
                "stride {} is smaller than a row of {} bytes",
                stride, min_stride
            )));
        }

        let required = stride
            .checked_mul(height as usize)
            .ok_or_else(|| EngineError::InvalidRaster("buffer size overflows".to_string()))?;
        if pixels.len() < required {
            return Err(EngineError::InvalidRaster(format!(
                "buffer holds {} bytes, expected at least {}",
                pixels.len(),
                required
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            stride,
            pixels,
        })
    }

    /// Wrap a tightly packed buffer (`stride == width * channels`).
    pub fn packed(width: u32, height: u32, channels: u32, pixels: &'a [u8]) -> Result<Self> {
        let stride = (width as usize)
            .checked_mul(channels as usize)
            .ok_or_else(|| EngineError::InvalidRaster("row size overflows".to_string()))?;
        Self::new(width, height, channels, stride, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        let row_len = self.width as usize * self.channels as usize;
        self.pixels
            .chunks(self.stride)
            .take(self.height as usize)
            .map(move |row| &row[..row_len])
    }
}

/// Bitmap record bound to the lifetime of the pixels it points at.
#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct RasterDescriptor<'a> {
    raw: RawRaster,
    _pixels: PhantomData<&'a [u8]>,
}

impl<'a> RasterDescriptor<'a> {
    /// Describe a 4-channel raster. Pixels are referenced, not copied.
    pub fn new(raster: &Raster<'a>) -> Result<Self> {
        let format = PixelFormat::Bgra8;
        if raster.channels != format.channels() {
            return Err(EngineError::UnsupportedPixelFormat {
                channels: raster.channels,
            });
        }

        let row_stride = i64::try_from(raster.stride)
            .map_err(|_| EngineError::InvalidRaster("stride exceeds engine limits".to_string()))?;

        let raw = RawRaster {
            pixel_format: format as i32,
            width: raster.width as i32,
            height: raster.height as i32,
            reserved: 0,
            row_stride,
            pixel_data_address: raster.pixels.as_ptr() as usize as i64,
        };

        Ok(Self {
            raw,
            _pixels: PhantomData,
        })
    }

    pub fn raw(&self) -> &RawRaster {
        &self.raw
    }

    pub(crate) fn as_ptr(&self) -> *const RawRaster {
        &self.raw
    }
}

/// Owned, tightly packed BGRA8 pixels, the one layout the engine accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BgraImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BgraImage {
    /// Convert a decoded image. Three-channel images gain an opaque alpha
    /// channel; grayscale images are rejected.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        let channels = image.color().channel_count() as u32;
        let (width, height) = (image.width(), image.height());

        let data = match channels {
            3 => {
                let rgb = image.to_rgb8();
                let mut data = Vec::with_capacity(width as usize * height as usize * 4);
                for px in rgb.as_raw().chunks_exact(3) {
                    data.extend_from_slice(&[px[2], px[1], px[0], u8::MAX]);
                }
                data
            }
            4 => {
                let mut data = image.to_rgba8().into_raw();
                for px in data.chunks_exact_mut(4) {
                    px.swap(0, 2);
                }
                data
            }
            other => return Err(EngineError::UnsupportedPixelFormat { channels: other }),
        };

        debug!(
            "converted {}-channel {:?} image {}x{} to BGRA",
            channels,
            image.color(),
            width,
            height
        );

        let image = Self {
            width,
            height,
            data,
        };
        image.as_raster()?;
        Ok(image)
    }

    /// Repack a BGR or BGRA raster, dropping any row padding.
    pub fn from_raster(raster: &Raster<'_>) -> Result<Self> {
        let pixel_count = raster.width as usize * raster.height as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);

        match raster.channels {
            3 => {
                for row in raster.rows() {
                    for px in row.chunks_exact(3) {
                        data.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]);
                    }
                }
            }
            4 => {
                for row in raster.rows() {
                    data.extend_from_slice(row);
                }
            }
            other => return Err(EngineError::UnsupportedPixelFormat { channels: other }),
        }

        Ok(Self {
            width: raster.width,
            height: raster.height,
            data,
        })
    }

    /// Repack a tightly packed BGR or BGRA buffer.
    pub fn from_packed(width: u32, height: u32, channels: u32, pixels: &[u8]) -> Result<Self> {
        Self::from_raster(&Raster::packed(width, height, channels, pixels)?)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_raster(&self) -> Result<Raster<'_>> {
        Raster::packed(self.width, self.height, 4, &self.data)
    }
}
