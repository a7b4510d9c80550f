//! Process-wide binding of the engine's entry-point table
//!
//! The engine ships as `oneocr.dll` next to its model file. It is located and
//! bound once per process; every later [`bind`] call returns the same table.

use std::ffi::c_char;
use std::fmt;
use std::path::Path;

use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::Result;
use crate::raster::RawRaster;

pub type CreateOptionsFn = unsafe extern "system" fn(out: *mut i64) -> i64;
pub type SetFlagFn = unsafe extern "system" fn(options: i64, flag: u8) -> i64;
pub type CreatePipelineFn = unsafe extern "system" fn(
    model: *const c_char,
    key: *const c_char,
    init_options: i64,
    out: *mut i64,
) -> i64;
pub type SetCountFn = unsafe extern "system" fn(options: i64, count: i64) -> i64;
pub type RunPipelineFn = unsafe extern "system" fn(
    pipeline: i64,
    raster: *const RawRaster,
    process_options: i64,
    out: *mut i64,
) -> i64;
pub type GetCountFn = unsafe extern "system" fn(result: i64, out: *mut i64) -> i64;
pub type GetLineFn = unsafe extern "system" fn(result: i64, index: i64, out: *mut i64) -> i64;
pub type GetContentFn = unsafe extern "system" fn(line: i64, out: *mut *const c_char) -> i64;

/// The nine engine entry points. Each returns a status (0 = success) and
/// writes a single value through its last argument.
#[derive(Clone, Copy)]
pub struct EntryPoints {
    pub(crate) create_init_options: CreateOptionsFn,
    pub(crate) set_use_model_delay_load: SetFlagFn,
    pub(crate) create_pipeline: CreatePipelineFn,
    pub(crate) create_process_options: CreateOptionsFn,
    pub(crate) set_max_recognition_line_count: SetCountFn,
    pub(crate) run_pipeline: RunPipelineFn,
    pub(crate) get_line_count: GetCountFn,
    pub(crate) get_line: GetLineFn,
    pub(crate) get_line_content: GetContentFn,
}

impl fmt::Debug for EntryPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints").finish_non_exhaustive()
    }
}

static ENTRY_POINTS: OnceCell<EntryPoints> = OnceCell::new();

/// Load `library_name` from `library_dir` and resolve its entry points.
///
/// Idempotent: once a table is bound, later calls return it regardless of
/// their arguments. A failed attempt leaves nothing behind, so it may be
/// retried.
pub fn bind(library_dir: &Path, library_name: &str) -> Result<&'static EntryPoints> {
    bind_with(|| {
        info!("loading OCR engine {} from {:?}", library_name, library_dir);
        native::load(library_dir, library_name)
    })
}

/// Concurrent first callers block until one `load` finishes; `load` runs at
/// most once per successful binding.
fn bind_with(load: impl FnOnce() -> Result<EntryPoints>) -> Result<&'static EntryPoints> {
    ENTRY_POINTS.get_or_try_init(|| {
        let entry_points = load()?;
        debug!("resolved all OCR engine entry points");
        Ok(entry_points)
    })
}

/// Whether [`bind`] has already succeeded in this process
pub fn is_bound() -> bool {
    ENTRY_POINTS.get().is_some()
}

#[cfg(windows)]
mod native {
    use std::mem::transmute;
    use std::path::Path;

    use windows::core::{HSTRING, PCSTR, PCWSTR};
    use windows::Win32::Foundation::{FARPROC, HMODULE};
    use windows::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW, SetDllDirectoryW};

    use super::EntryPoints;
    use crate::error::{EngineError, Result, Step};

    pub(super) fn load(library_dir: &Path, library_name: &str) -> Result<EntryPoints> {
        // The engine pulls in sibling DLLs and its model from its own directory.
        let dir = HSTRING::from(library_dir);
        unsafe { SetDllDirectoryW(PCWSTR(dir.as_ptr())) }?;

        let path = HSTRING::from(library_dir.join(library_name).as_path());
        let module = unsafe { LoadLibraryW(PCWSTR(path.as_ptr())) }
            .map_err(|e| EngineError::LibraryLoad(format!("{}: {}", path, e)))?;

        // SAFETY: each symbol is cast to the signature the engine exports it with.
        unsafe {
            Ok(EntryPoints {
                create_init_options: transmute(symbol(module, Step::CreateInitOptions)?),
                set_use_model_delay_load: transmute(symbol(module, Step::SetUseModelDelayLoad)?),
                create_pipeline: transmute(symbol(module, Step::CreatePipeline)?),
                create_process_options: transmute(symbol(module, Step::CreateProcessOptions)?),
                set_max_recognition_line_count: transmute(symbol(
                    module,
                    Step::SetMaxRecognitionLineCount,
                )?),
                run_pipeline: transmute(symbol(module, Step::RunPipeline)?),
                get_line_count: transmute(symbol(module, Step::GetLineCount)?),
                get_line: transmute(symbol(module, Step::GetLine)?),
                get_line_content: transmute(symbol(module, Step::GetLineContent)?),
            })
        }
    }

    fn symbol(
        module: HMODULE,
        step: Step,
    ) -> Result<unsafe extern "system" fn() -> isize> {
        let name = format!("{}\0", step.symbol());
        let proc: FARPROC = unsafe { GetProcAddress(module, PCSTR(name.as_ptr())) };
        proc.ok_or(EngineError::MissingEntryPoint(step.symbol()))
    }
}

#[cfg(not(windows))]
mod native {
    use std::path::Path;

    use super::EntryPoints;
    use crate::error::{EngineError, Result};

    pub(super) fn load(library_dir: &Path, library_name: &str) -> Result<EntryPoints> {
        Err(EngineError::LibraryLoad(format!(
            "{} ({}) can only be loaded on Windows",
            library_name,
            library_dir.display()
        )))
    }
}
