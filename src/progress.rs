use crate::error::FetchError;
#[cfg(feature = "progress")]
use indicatif::ProgressBar;
use std::path::Path;

/// Signal sent by a fetcher to the coordinator
#[derive(Debug)]
pub enum ProgressEvent {
    /// `len` bytes of `segment` reached the work file
    BytesWritten { segment: usize, len: u64 },
    /// `segment` gave up, nothing else will come from it
    SegmentFailed { segment: usize, cause: FetchError },
}

/// Surface the coordinator reports to while a download runs
///
/// Only [`inc`][Progress::inc] is required, the terminal signals default to no-ops.
pub trait Progress {
    /// Called once with the size of the file before any segment starts
    fn start(&mut self, _total: u64) {}
    /// `n` more bytes were written
    fn inc(&mut self, n: u64);
    /// The file is complete at `path`
    fn finish(&mut self, _path: &Path) {}
    /// The download was abandoned
    fn fail(&mut self, _reason: &str) {}
}

/// Silent progress
impl Progress for () {
    fn inc(&mut self, _n: u64) {}
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn start(&mut self, total: u64) {
        (**self).start(total)
    }
    fn inc(&mut self, n: u64) {
        (**self).inc(n)
    }
    fn finish(&mut self, path: &Path) {
        (**self).finish(path)
    }
    fn fail(&mut self, reason: &str) {
        (**self).fail(reason)
    }
}

#[cfg(feature = "progress")]
impl Progress for ProgressBar {
    fn start(&mut self, total: u64) {
        self.set_length(total);
    }
    fn inc(&mut self, n: u64) {
        ProgressBar::inc(self, n);
    }
    fn finish(&mut self, _path: &Path) {
        ProgressBar::finish(self);
    }
    fn fail(&mut self, reason: &str) {
        self.abandon_with_message(reason.to_string());
    }
}
