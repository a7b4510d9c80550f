//! Draining a result instance into owned text lines
//!
//! The line count is the only fatal query. After that every line is best
//! effort: a line whose handle or text cannot be fetched is skipped, and
//! malformed UTF-8 is replaced rather than rejected.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapter::NativeApi;
use crate::error::{CallFailure, Result};
use crate::handle::ResultInstance;

/// One recognized line, copied out of engine memory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLine {
    /// Position in the engine's line list
    pub index: usize,
    pub text: String,
}

/// Lazy walk over the lines of a [`ResultInstance`].
///
/// Indices run from zero up to the count the engine reported; nothing is
/// cached, and the iterator cannot be restarted.
pub struct Lines<'r> {
    api: &'r NativeApi,
    result: &'r ResultInstance,
    next: usize,
    count: usize,
}

impl<'r> Lines<'r> {
    pub fn new(api: &'r NativeApi, result: &'r ResultInstance) -> Result<Self> {
        let reported = api.line_count(result)?;
        let count = usize::try_from(reported).unwrap_or_else(|_| {
            warn!("engine reported a negative line count ({}), treating as empty", reported);
            0
        });
        debug!("engine reported {} lines", count);

        Ok(Self {
            api,
            result,
            next: 0,
            count,
        })
    }

    /// Line count as reported by the engine
    pub fn reported(&self) -> usize {
        self.count
    }

    fn fetch(&self, index: usize) -> std::result::Result<TextLine, CallFailure> {
        let line = self.api.line(self.result, index)?;
        let content = self.api.line_content(&line)?;
        Ok(TextLine {
            index,
            text: decode_line(index, content.to_bytes()),
        })
    }
}

impl Iterator for Lines<'_> {
    type Item = TextLine;

    fn next(&mut self) -> Option<TextLine> {
        while self.next < self.count {
            let index = self.next;
            self.next += 1;

            match self.fetch(index) {
                Ok(line) => return Some(line),
                Err(failure) => debug!("skipping line {}: {}", index, failure),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.count - self.next))
    }
}

/// Decode engine text, replacing malformed sequences with U+FFFD.
pub fn decode_line(index: usize, bytes: &[u8]) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(text) => text.to_owned(),
        Cow::Owned(text) => {
            debug!("line {} contained invalid UTF-8", index);
            text
        }
    }
}

/// Collect every retrievable line, in ascending index order.
pub fn collect_lines(api: &NativeApi, result: &ResultInstance) -> Result<Vec<TextLine>> {
    Ok(Lines::new(api, result)?.collect())
}
