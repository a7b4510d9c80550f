//! Strictly ordered construction of the engine's handle chain
//!
//! init options -> pipeline -> process options -> result instance. Any step
//! that fails aborts the whole run; nothing later executes and nothing is
//! retried.

use std::ffi::CString;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::NativeApi;
use crate::error::{EngineError, Result};
use crate::handle::ResultInstance;
use crate::raster::RasterDescriptor;

/// Model file the engine looks for next to its library
pub const DEFAULT_MODEL_FILE: &str = "oneocr.onemodel";

/// Key the engine uses to unpack its bundled model
pub const DEFAULT_MODEL_KEY: &str = "kj)TGtrK>f]b[Piow.gU+nC@s\"\"\"\"\"\"4";

/// Line cap handed to `OcrProcessOptionsSetMaxRecognitionLineCount`
pub const DEFAULT_MAX_LINES: i64 = 1000;

/// Settings for one pass through the handle chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub model_file: String,
    pub model_key: String,
    /// Upper bound on lines the engine reports
    pub max_lines: i64,
    /// Lazy model loading defers load failures past pipeline creation
    pub use_model_delay_load: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            model_file: DEFAULT_MODEL_FILE.to_string(),
            model_key: DEFAULT_MODEL_KEY.to_string(),
            max_lines: DEFAULT_MAX_LINES,
            use_model_delay_load: false,
        }
    }
}

/// Model identifier and key as stable NUL-terminated buffers
#[derive(Debug)]
struct ModelCredentials {
    model: CString,
    key: CString,
}

impl ModelCredentials {
    fn new(config: &ChainConfig) -> Result<Self> {
        let model = CString::new(config.model_file.as_str()).map_err(|_| {
            EngineError::InvalidArgument("model file name contains a NUL byte".to_string())
        })?;
        let key = CString::new(config.model_key.as_str()).map_err(|_| {
            EngineError::InvalidArgument("model key contains a NUL byte".to_string())
        })?;
        Ok(Self { model, key })
    }
}

pub struct HandleChain<'a> {
    api: &'a NativeApi,
    config: &'a ChainConfig,
}

impl<'a> HandleChain<'a> {
    pub fn new(api: &'a NativeApi, config: &'a ChainConfig) -> Self {
        Self { api, config }
    }

    /// Build every handle in order and run recognition over `raster`.
    pub fn run(&self, raster: &RasterDescriptor<'_>) -> Result<ResultInstance> {
        let credentials = ModelCredentials::new(self.config)?;

        let init_options = self.api.create_init_options()?;
        self.api
            .set_use_model_delay_load(&init_options, self.config.use_model_delay_load)?;
        debug!(
            "init options ready (model delay load: {})",
            self.config.use_model_delay_load
        );

        let pipeline =
            self.api
                .create_pipeline(&credentials.model, &credentials.key, init_options)?;
        info!("OCR model loaded");

        let process_options = self.api.create_process_options()?;
        self.api
            .set_max_recognition_line_count(&process_options, self.config.max_lines)?;
        debug!("process options ready (max lines: {})", self.config.max_lines);

        info!("running OCR pipeline");
        let result = self.api.run_pipeline(pipeline, raster, process_options)?;
        Ok(result)
    }
}
