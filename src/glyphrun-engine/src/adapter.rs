//! Typed calls against the engine's entry-point table
//!
//! Every call follows the same shape: inputs by value or address, one
//! zero-initialised output slot by address, an `i64` status back. A non-zero
//! status or an output left at zero becomes a [`CallFailure`]; the raw slot is
//! never turned into a handle in either case.

use std::ffi::{c_char, CStr};
use std::ptr;

use tracing::trace;

use crate::binding::EntryPoints;
use crate::error::{CallFailure, Status, Step};
use crate::handle::{InitOptions, Pipeline, ProcessOptions, RecognizedLine, ResultInstance};
use crate::raster::RasterDescriptor;

pub type CallResult<T> = std::result::Result<T, CallFailure>;

fn check(step: Step, status: i64) -> CallResult<()> {
    let status = Status(status);
    trace!("{} -> {}", step, status);
    if status.is_ok() {
        Ok(())
    } else {
        Err(CallFailure::Status { step, status })
    }
}

fn adopt<T>(step: Step, status: i64, output: impl FnOnce() -> Option<T>) -> CallResult<T> {
    check(step, status)?;
    output().ok_or(CallFailure::NullOutput { step })
}

/// Safe front for a bound [`EntryPoints`] table
#[derive(Debug, Clone, Copy)]
pub struct NativeApi {
    entry_points: EntryPoints,
}

impl NativeApi {
    pub fn new(entry_points: EntryPoints) -> Self {
        Self { entry_points }
    }

    pub fn create_init_options(&self) -> CallResult<InitOptions> {
        let mut out = 0i64;
        let status = unsafe { (self.entry_points.create_init_options)(&mut out) };
        adopt(Step::CreateInitOptions, status, || InitOptions::from_raw(out))
    }

    pub fn set_use_model_delay_load(&self, options: &InitOptions, enabled: bool) -> CallResult<()> {
        let status =
            unsafe { (self.entry_points.set_use_model_delay_load)(options.raw(), enabled as u8) };
        check(Step::SetUseModelDelayLoad, status)
    }

    /// Load the model. `model` and `key` only need to outlive this call.
    pub fn create_pipeline(
        &self,
        model: &CStr,
        key: &CStr,
        options: InitOptions,
    ) -> CallResult<Pipeline> {
        let mut out = 0i64;
        let status = unsafe {
            (self.entry_points.create_pipeline)(
                model.as_ptr(),
                key.as_ptr(),
                options.raw(),
                &mut out,
            )
        };
        adopt(Step::CreatePipeline, status, || Pipeline::from_raw(out))
    }

    pub fn create_process_options(&self) -> CallResult<ProcessOptions> {
        let mut out = 0i64;
        let status = unsafe { (self.entry_points.create_process_options)(&mut out) };
        adopt(Step::CreateProcessOptions, status, || ProcessOptions::from_raw(out))
    }

    pub fn set_max_recognition_line_count(
        &self,
        options: &ProcessOptions,
        count: i64,
    ) -> CallResult<()> {
        let status =
            unsafe { (self.entry_points.set_max_recognition_line_count)(options.raw(), count) };
        check(Step::SetMaxRecognitionLineCount, status)
    }

    /// Run recognition. Blocks for the whole model inference.
    ///
    /// The descriptor borrows its pixels, so they stay put until this returns.
    pub fn run_pipeline(
        &self,
        pipeline: Pipeline,
        raster: &RasterDescriptor<'_>,
        options: ProcessOptions,
    ) -> CallResult<ResultInstance> {
        let mut out = 0i64;
        let status = unsafe {
            (self.entry_points.run_pipeline)(
                pipeline.raw(),
                raster.as_ptr(),
                options.raw(),
                &mut out,
            )
        };
        adopt(Step::RunPipeline, status, || ResultInstance::from_raw(out))
    }

    /// Number of lines the engine reports, after its own line cap.
    pub fn line_count(&self, result: &ResultInstance) -> CallResult<i64> {
        let mut out = 0i64;
        let status = unsafe { (self.entry_points.get_line_count)(result.raw(), &mut out) };
        check(Step::GetLineCount, status)?;
        Ok(out)
    }

    pub fn line<'r>(
        &self,
        result: &'r ResultInstance,
        index: usize,
    ) -> CallResult<RecognizedLine<'r>> {
        let mut out = 0i64;
        let status = unsafe { (self.entry_points.get_line)(result.raw(), index as i64, &mut out) };
        adopt(Step::GetLine, status, || RecognizedLine::from_raw(out, index, result))
    }

    /// Borrow the engine's NUL-terminated text for `line`.
    ///
    /// The bytes live in engine memory owned by the result instance; copy them
    /// out before the borrow ends.
    pub fn line_content<'r>(&self, line: &RecognizedLine<'r>) -> CallResult<&'r CStr> {
        let mut out: *const c_char = ptr::null();
        let status = unsafe { (self.entry_points.get_line_content)(line.raw(), &mut out) };
        check(Step::GetLineContent, status)?;
        if out.is_null() {
            return Err(CallFailure::NullOutput {
                step: Step::GetLineContent,
            });
        }
        // SAFETY: non-null and NUL-terminated per the engine contract; the
        // buffer lives as long as the result instance `line` borrows from.
        Ok(unsafe { CStr::from_ptr(out) })
    }
}
