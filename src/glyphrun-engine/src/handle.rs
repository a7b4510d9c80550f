//! Typed tokens for engine-owned state
//!
//! The engine hands out bare 64-bit values for everything it allocates. Each
//! role gets its own type here so a pipeline can never be passed where process
//! options are expected. None of them implement `Clone`: links that the next
//! chain call consumes are moved into it.
//!
//! The engine exposes no destroy entry points, so nothing here implements
//! `Drop`; handles stay valid for the life of the process.

use std::marker::PhantomData;
use std::num::NonZeroI64;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, PartialEq, Eq)]
        pub struct $name(NonZeroI64);

        impl $name {
            /// Adopt a raw value written by the engine. Zero is never a handle.
            pub(crate) fn from_raw(raw: i64) -> Option<Self> {
                NonZeroI64::new(raw).map(Self)
            }

            pub(crate) fn raw(&self) -> i64 {
                self.0.get()
            }
        }
    };
}

opaque_handle!(
    /// Options consumed by `CreateOcrPipeline`
    InitOptions
);

opaque_handle!(
    /// Loaded recognition model
    Pipeline
);

opaque_handle!(
    /// Per-run options consumed by `RunOcrPipeline`
    ProcessOptions
);

opaque_handle!(
    /// Output of one recognition run; queried read-only for lines
    ResultInstance
);

/// One detected text line, valid only while its [`ResultInstance`] is.
#[derive(Debug)]
pub struct RecognizedLine<'r> {
    raw: NonZeroI64,
    index: usize,
    _result: PhantomData<&'r ResultInstance>,
}

impl<'r> RecognizedLine<'r> {
    pub(crate) fn from_raw(raw: i64, index: usize, _result: &'r ResultInstance) -> Option<Self> {
        NonZeroI64::new(raw).map(|raw| Self {
            raw,
            index,
            _result: PhantomData,
        })
    }

    pub(crate) fn raw(&self) -> i64 {
        self.raw.get()
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_never_a_handle() {
        assert!(InitOptions::from_raw(0).is_none());
        assert!(Pipeline::from_raw(0).is_none());
        assert!(ProcessOptions::from_raw(0).is_none());
        assert!(ResultInstance::from_raw(0).is_none());
    }

    #[test]
    fn test_raw_value_round_trips() {
        let pipeline = Pipeline::from_raw(0x7ff0_1234).unwrap();
        assert_eq!(pipeline.raw(), 0x7ff0_1234);
    }

    #[test]
    fn test_line_keeps_index() {
        let result = ResultInstance::from_raw(9).unwrap();
        assert!(RecognizedLine::from_raw(0, 3, &result).is_none());
        let line = RecognizedLine::from_raw(-5, 3, &result).unwrap();
        assert_eq!(line.index(), 3);
        assert_eq!(line.raw(), -5);
    }
}
