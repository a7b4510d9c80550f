//! In-process stand-in for the engine library
//!
//! Real `extern "system"` functions backed by thread-local state, so tests go
//! through exactly the same unsafe call path as the bound DLL. Each test
//! thread installs its own [`FakeEngine`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};

use crate::binding::EntryPoints;
use crate::error::Step;
use crate::handle::ResultInstance;
use crate::raster::RawRaster;

const INIT_OPTIONS: i64 = 0x11;
const PIPELINE: i64 = 0x22;
const PROCESS_OPTIONS: i64 = 0x33;
const RESULT: i64 = 0x44;
const LINE_BASE: i64 = 0x1000;

/// Status the fake returns when a handle of the wrong kind is passed in.
pub const WRONG_HANDLE: i64 = -99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Status(i64),
    NullOutput,
}

enum FakeLine {
    Text(CString),
    LineFault(Fault),
    ContentFault(Fault),
}

/// What the fake observed across the native boundary
#[derive(Debug, Clone, Default)]
pub struct Seen {
    pub calls: Vec<Step>,
    pub delay_load: Option<u8>,
    pub model: Option<String>,
    pub key: Option<String>,
    pub max_lines: Option<i64>,
    pub raster: Option<RawRaster>,
    pub requested_lines: Vec<i64>,
}

#[derive(Default)]
pub struct FakeEngine {
    faults: HashMap<Step, Fault>,
    lines: Vec<FakeLine>,
    count_override: Option<i64>,
    seen: Seen,
}

thread_local! {
    static ENGINE: RefCell<Option<FakeEngine>> = const { RefCell::new(None) };
}

impl FakeEngine {
    pub fn fault(mut self, step: Step, fault: Fault) -> Self {
        self.faults.insert(step, fault);
        self
    }

    pub fn lines<'a>(mut self, texts: impl IntoIterator<Item = &'a str>) -> Self {
        for text in texts {
            self = self.raw_line(text.as_bytes());
        }
        self
    }

    pub fn raw_line(mut self, bytes: &[u8]) -> Self {
        let text = CString::new(bytes).unwrap_or_default();
        self.lines.push(FakeLine::Text(text));
        self
    }

    /// A line whose `GetOcrLine` call fails
    pub fn broken_line(mut self, fault: Fault) -> Self {
        self.lines.push(FakeLine::LineFault(fault));
        self
    }

    /// A line whose `GetOcrLineContent` call fails
    pub fn unreadable_line(mut self, fault: Fault) -> Self {
        self.lines.push(FakeLine::ContentFault(fault));
        self
    }

    pub fn reported_count(mut self, count: i64) -> Self {
        self.count_override = Some(count);
        self
    }

    pub fn install(engine: FakeEngine) {
        ENGINE.with(|cell| *cell.borrow_mut() = Some(engine));
    }

    pub fn snapshot() -> Seen {
        ENGINE.with(|cell| {
            cell.borrow()
                .as_ref()
                .map(|engine| engine.seen.clone())
                .unwrap_or_default()
        })
    }

    /// Record the call and apply any configured fault.
    fn answer(&mut self, step: Step, out: *mut i64, value: i64) -> i64 {
        self.seen.calls.push(step);
        match self.faults.get(&step) {
            Some(Fault::Status(status)) => *status,
            Some(Fault::NullOutput) => 0,
            None => {
                if !out.is_null() {
                    unsafe { *out = value };
                }
                0
            }
        }
    }

    /// Line count as the engine reports it, after applying its own cap.
    fn line_count(&self) -> i64 {
        if let Some(count) = self.count_override {
            return count;
        }
        let detected = self.lines.len() as i64;
        detected.min(self.seen.max_lines.unwrap_or(i64::MAX))
    }
}

fn with_engine(f: impl FnOnce(&mut FakeEngine) -> i64) -> i64 {
    ENGINE.with(|cell| match cell.borrow_mut().as_mut() {
        Some(engine) => f(engine),
        None => -1,
    })
}

unsafe fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

unsafe extern "system" fn create_init_options(out: *mut i64) -> i64 {
    with_engine(|engine| engine.answer(Step::CreateInitOptions, out, INIT_OPTIONS))
}

unsafe extern "system" fn set_use_model_delay_load(options: i64, flag: u8) -> i64 {
    with_engine(|engine| {
        if options != INIT_OPTIONS {
            return WRONG_HANDLE;
        }
        engine.seen.delay_load = Some(flag);
        engine.answer(Step::SetUseModelDelayLoad, std::ptr::null_mut(), 0)
    })
}

unsafe extern "system" fn create_pipeline(
    model: *const c_char,
    key: *const c_char,
    init_options: i64,
    out: *mut i64,
) -> i64 {
    with_engine(|engine| {
        if init_options != INIT_OPTIONS {
            return WRONG_HANDLE;
        }
        engine.seen.model = read_str(model);
        engine.seen.key = read_str(key);
        engine.answer(Step::CreatePipeline, out, PIPELINE)
    })
}

unsafe extern "system" fn create_process_options(out: *mut i64) -> i64 {
    with_engine(|engine| engine.answer(Step::CreateProcessOptions, out, PROCESS_OPTIONS))
}

unsafe extern "system" fn set_max_recognition_line_count(options: i64, count: i64) -> i64 {
    with_engine(|engine| {
        if options != PROCESS_OPTIONS {
            return WRONG_HANDLE;
        }
        engine.seen.max_lines = Some(count);
        engine.answer(Step::SetMaxRecognitionLineCount, std::ptr::null_mut(), 0)
    })
}

unsafe extern "system" fn run_pipeline(
    pipeline: i64,
    raster: *const RawRaster,
    process_options: i64,
    out: *mut i64,
) -> i64 {
    with_engine(|engine| {
        if pipeline != PIPELINE || process_options != PROCESS_OPTIONS || raster.is_null() {
            return WRONG_HANDLE;
        }
        engine.seen.raster = Some(*raster);
        engine.answer(Step::RunPipeline, out, RESULT)
    })
}

unsafe extern "system" fn get_line_count(result: i64, out: *mut i64) -> i64 {
    with_engine(|engine| {
        if result != RESULT {
            return WRONG_HANDLE;
        }
        let count = engine.line_count();
        engine.answer(Step::GetLineCount, out, count)
    })
}

unsafe extern "system" fn get_line(result: i64, index: i64, out: *mut i64) -> i64 {
    with_engine(|engine| {
        if result != RESULT {
            return WRONG_HANDLE;
        }
        engine.seen.calls.push(Step::GetLine);
        engine.seen.requested_lines.push(index);

        match usize::try_from(index).ok().and_then(|i| engine.lines.get(i)) {
            None => -3,
            Some(FakeLine::LineFault(Fault::Status(status))) => *status,
            Some(FakeLine::LineFault(Fault::NullOutput)) => 0,
            Some(_) => {
                *out = LINE_BASE + index;
                0
            }
        }
    })
}

unsafe extern "system" fn get_line_content(line: i64, out: *mut *const c_char) -> i64 {
    with_engine(|engine| {
        engine.seen.calls.push(Step::GetLineContent);
        let index = line - LINE_BASE;
        match usize::try_from(index).ok().and_then(|i| engine.lines.get(i)) {
            None => WRONG_HANDLE,
            Some(FakeLine::ContentFault(Fault::Status(status))) => *status,
            Some(FakeLine::ContentFault(Fault::NullOutput)) => 0,
            Some(FakeLine::Text(text)) => {
                *out = text.as_ptr();
                0
            }
            Some(FakeLine::LineFault(_)) => WRONG_HANDLE,
        }
    })
}

pub fn entry_points() -> EntryPoints {
    EntryPoints {
        create_init_options,
        set_use_model_delay_load,
        create_pipeline,
        create_process_options,
        set_max_recognition_line_count,
        run_pipeline,
        get_line_count,
        get_line,
        get_line_content,
    }
}

/// A result handle as the fake's `RunOcrPipeline` would hand it out
pub fn result_instance() -> ResultInstance {
    ResultInstance::from_raw(RESULT).expect("fake result handle is non-zero")
}
