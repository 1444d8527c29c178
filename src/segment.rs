use crate::config::DownloadConfig;
use crate::{DownloadError, Result};
use std::fmt;
use tracing::{debug, instrument};

/// Contiguous, inclusive byte range of the target assigned to one fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// 0-based position in the plan
    pub index: usize,
    pub start: u64,
    /// Last byte of the segment, inclusive
    pub end: u64,
}

impl Segment {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
    /// Value for the [`RANGE`][reqwest::header::RANGE] header
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [{}-{}]", self.index, self.start, self.end)
    }
}

/// Iterator splitting `[0, total)` into `count` segments of equal base size,
/// the last one absorbing the remainder
#[derive(Debug, Clone, Copy)]
pub struct Segments {
    total: u64,
    count: u64,
    base: u64,
    current: u64,
}

impl Segments {
    /// Create the iterator
    /// # Arguments
    /// * `total` - size of the file in bytes
    /// * `count` - number of segments, at most `total`
    pub fn new(total: u64, count: u64) -> Result<Self> {
        if total == 0 {
            return Err(DownloadError::Planning("can't split an empty file".to_string()));
        }
        if count == 0 || count > total {
            return Err(DownloadError::Planning(format!(
                "can't split {} bytes into {} segments",
                total, count
            )));
        }
        Ok(Self {
            total,
            count,
            base: total / count,
            current: 0,
        })
    }
}

impl Iterator for Segments {
    type Item = Segment;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let start = self.current * self.base;
        let end = if self.current + 1 == self.count {
            self.total - 1
        } else {
            start + self.base - 1
        };
        let res = Segment {
            index: self.current as usize,
            start,
            end,
        };
        self.current += 1;
        Some(res)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.count - self.current) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Segments {}

/// Number of concurrent fetchers for a file of `total` bytes
///
/// One worker when the server can't serve ranges or the file is smaller than
/// [`min_segment_size`][DownloadConfig::min_segment_size], otherwise one per
/// `min_segment_size` bytes clamped to `[2, max_workers]`.
pub fn worker_count(total: u64, supports_ranges: bool, config: &DownloadConfig) -> u64 {
    if !supports_ranges || total < config.min_segment_size {
        return 1;
    }
    let raw = total / config.min_segment_size;
    // a segment can't be shorter than one byte
    raw.max(2).min(u64::from(config.max_workers)).min(total)
}

/// Plan the segments for a file of `total` bytes
///
/// # Example
///
/// ```
/// use slicedl::{plan, DownloadConfig};
/// # fn main() -> Result<(), slicedl::DownloadError> {
/// let segments = plan(12 * 1024 * 1024, true, &DownloadConfig::default())?;
/// assert_eq!(segments.len(), 2);
/// assert_eq!(segments[1].end, 12 * 1024 * 1024 - 1);
/// # Ok(())
/// # }
/// ```
#[instrument(skip(config))]
pub fn plan(total: u64, supports_ranges: bool, config: &DownloadConfig) -> Result<Vec<Segment>> {
    let count = worker_count(total, supports_ranges, config);
    let segments = Segments::new(total, count)?.collect::<Vec<_>>();
    debug!("Planned {} segment(s)", segments.len());
    Ok(segments)
}
