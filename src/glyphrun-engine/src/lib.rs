//! Driver for the OneOCR recognition engine
//!
//! The engine is a closed-source Windows library reached only through a
//! fixed table of C entry points. This crate builds the bitmap record the
//! engine reads, walks its handle chain in order, checks every status code,
//! and copies recognized line text out of engine-owned memory.

pub mod adapter;
pub mod binding;
pub mod chain;
mod error;
pub mod extract;
pub mod handle;
pub mod raster;
mod recognizer;

#[cfg(test)]
mod testing;

use std::path::Path;

pub use adapter::NativeApi;
pub use binding::{bind, is_bound, EntryPoints};
pub use chain::{ChainConfig, HandleChain};
pub use error::{CallFailure, EngineError, Result, Status, Step};
pub use extract::{collect_lines, Lines, TextLine};
pub use raster::{BgraImage, PixelFormat, Raster, RasterDescriptor, RawRaster};
pub use recognizer::{Recognition, Recognizer};

/// File name of the engine library
pub const DEFAULT_LIBRARY_NAME: &str = "oneocr.dll";

/// Bind the engine found in `library_dir` with default settings
pub fn create_recognizer(library_dir: &Path) -> Result<Recognizer> {
    Recognizer::bind(library_dir, DEFAULT_LIBRARY_NAME, ChainConfig::default())
}

