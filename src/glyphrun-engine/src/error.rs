use std::fmt;

use thiserror::Error;

/// One call in the engine's fixed entry-point table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    CreateInitOptions,
    SetUseModelDelayLoad,
    CreatePipeline,
    CreateProcessOptions,
    SetMaxRecognitionLineCount,
    RunPipeline,
    GetLineCount,
    GetLine,
    GetLineContent,
}

impl Step {
    /// Exported symbol name inside the engine library
    pub fn symbol(&self) -> &'static str {
        match self {
            Step::CreateInitOptions => "CreateOcrInitOptions",
            Step::SetUseModelDelayLoad => "OcrInitOptionsSetUseModelDelayLoad",
            Step::CreatePipeline => "CreateOcrPipeline",
            Step::CreateProcessOptions => "CreateOcrProcessOptions",
            Step::SetMaxRecognitionLineCount => "OcrProcessOptionsSetMaxRecognitionLineCount",
            Step::RunPipeline => "RunOcrPipeline",
            Step::GetLineCount => "GetOcrLineCount",
            Step::GetLine => "GetOcrLine",
            Step::GetLineContent => "GetOcrLineContent",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Raw status returned by an entry point. Zero is success; the engine
/// publishes no table for anything else, so the value is carried verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i64);

impl Status {
    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry point that did not deliver its output.
///
/// The adapter reports every call this way; the handle chain escalates it to
/// [`EngineError`], the line extractor swallows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFailure {
    /// Non-zero status code.
    Status { step: Step, status: Status },
    /// Zero status, but the output slot was left null.
    NullOutput { step: Step },
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Status { step, status } => {
                write!(f, "{} failed with status {}", step, status)
            }
            CallFailure::NullOutput { step } => write!(f, "{} returned a null output", step),
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{step} failed with status {status}")]
    ChainFatal { step: Step, status: Status },

    #[error("{step} reported success but returned a null handle")]
    NullHandle { step: Step },

    #[error("unsupported pixel format: {channels} channel(s), expected 3 or 4")]
    UnsupportedPixelFormat { channels: u32 },

    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to load OCR engine library: {0}")]
    LibraryLoad(String),

    #[error("entry point {0} not found in OCR engine library")]
    MissingEntryPoint(&'static str),

    #[cfg(windows)]
    #[error("windows API error: {0}")]
    Windows(#[from] windows::core::Error),
}

impl From<CallFailure> for EngineError {
    fn from(failure: CallFailure) -> Self {
        match failure {
            CallFailure::Status { step, status } => EngineError::ChainFatal { step, status },
            CallFailure::NullOutput { step } => EngineError::NullHandle { step },
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
