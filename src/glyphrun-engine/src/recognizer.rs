use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::NativeApi;
use crate::binding::{self, EntryPoints};
use crate::chain::{ChainConfig, HandleChain};
use crate::error::{EngineError, Result};
use crate::extract::{Lines, TextLine};
use crate::raster::{BgraImage, Raster, RasterDescriptor};

/// Outcome of one recognition request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// Line count the engine reported, after its own cap
    pub reported_lines: usize,
    /// Lines that could be read back, in index order
    pub lines: Vec<TextLine>,
    pub elapsed_ms: u64,
}

impl Recognition {
    /// All line texts joined with newlines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Drives the engine end to end: descriptor, handle chain, line extraction.
#[derive(Debug, Clone)]
pub struct Recognizer {
    api: NativeApi,
    config: ChainConfig,
}

impl Recognizer {
    /// Bind the engine library (once per process) and prepare a recognizer.
    pub fn bind(library_dir: &Path, library_name: &str, config: ChainConfig) -> Result<Self> {
        let entry_points = binding::bind(library_dir, library_name)?;
        Ok(Self::with_entry_points(*entry_points, config))
    }

    pub(crate) fn with_entry_points(entry_points: EntryPoints, config: ChainConfig) -> Self {
        Self {
            api: NativeApi::new(entry_points),
            config,
        }
    }

    /// Recognize text in a BGR or BGRA raster.
    ///
    /// Three-channel input is padded to BGRA first; any other channel count
    /// is rejected before the engine is touched.
    pub fn recognize(&self, raster: &Raster<'_>) -> Result<Recognition> {
        match raster.channels() {
            4 => self.run(raster),
            3 => {
                debug!("padding BGR raster to BGRA");
                let converted = BgraImage::from_raster(raster)?;
                self.run(&converted.as_raster()?)
            }
            channels => Err(EngineError::UnsupportedPixelFormat { channels }),
        }
    }

    pub fn recognize_image(&self, image: &BgraImage) -> Result<Recognition> {
        self.run(&image.as_raster()?)
    }

    fn run(&self, raster: &Raster<'_>) -> Result<Recognition> {
        let started = Instant::now();
        let descriptor = RasterDescriptor::new(raster)?;
        debug!(
            "raster descriptor: {}x{}, stride {}",
            raster.width(),
            raster.height(),
            raster.stride()
        );

        let result = HandleChain::new(&self.api, &self.config).run(&descriptor)?;

        let lines = Lines::new(&self.api, &result)?;
        let reported_lines = lines.reported();
        info!("recognized {} lines", reported_lines);
        let lines: Vec<TextLine> = lines.collect();

        if lines.len() < reported_lines {
            debug!(
                "{} of {} lines could not be read back",
                reported_lines - lines.len(),
                reported_lines
            );
        }

        Ok(Recognition {
            reported_lines,
            lines,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}
