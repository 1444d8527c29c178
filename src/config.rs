use crate::DownloadError;
use derive_builder::Builder;
use std::time::Duration;

/// Smallest file that gets split, and the size each extra worker has to earn
pub const MIN_SEGMENT_SIZE: u64 = 5 * 1024 * 1024;
/// Upper bound on concurrent segment fetchers
pub const MAX_WORKERS: u16 = 16;
/// Size of each slice of the response body written to disk
pub const BUFFER_SIZE: usize = 8 * 1024;
/// How long the coordinator waits on an empty progress channel before re-checking its workers
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Knobs for planning and running a download
///
/// # Example
///
/// ```
/// use slicedl::DownloadConfigBuilder;
/// # fn main() -> Result<(), slicedl::DownloadError> {
/// let config = DownloadConfigBuilder::default()
///     .max_workers(4u16)
///     .overwrite(false)
///     .build()?;
/// assert_eq!(config.max_workers, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct DownloadConfig {
    #[builder(default = "MIN_SEGMENT_SIZE")]
    pub min_segment_size: u64,
    #[builder(default = "MAX_WORKERS")]
    pub max_workers: u16,
    #[builder(default = "BUFFER_SIZE")]
    pub buffer_size: usize,
    #[builder(default = "POLL_INTERVAL")]
    pub poll_interval: Duration,
    /// Timeout applied to every request, including the whole body transfer
    #[builder(default, setter(strip_option))]
    pub request_timeout: Option<Duration>,
    #[builder(default, setter(strip_option))]
    pub connect_timeout: Option<Duration>,
    /// Replace an existing file at the destination
    #[builder(default = "true")]
    pub overwrite: bool,
    /// Extension appended to the final name while the download is in flight
    #[builder(default = "String::from(\"partial\")", setter(into))]
    pub partial_extension: String,
}

impl DownloadConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(0) = self.min_segment_size {
            return Err("min_segment_size must be greater than 0".to_string());
        }
        if let Some(0) = self.max_workers {
            return Err("max_workers must be greater than 0".to_string());
        }
        if let Some(0) = self.buffer_size {
            return Err("buffer_size must be greater than 0".to_string());
        }
        if let Some(interval) = self.poll_interval {
            if interval.is_zero() {
                return Err("poll_interval must be greater than 0".to_string());
            }
        }
        if let Some(ext) = &self.partial_extension {
            if ext.is_empty() {
                return Err("partial_extension can't be empty".to_string());
            }
        }
        Ok(())
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            min_segment_size: MIN_SEGMENT_SIZE,
            max_workers: MAX_WORKERS,
            buffer_size: BUFFER_SIZE,
            poll_interval: POLL_INTERVAL,
            request_timeout: None,
            connect_timeout: None,
            overwrite: true,
            partial_extension: String::from("partial"),
        }
    }
}

impl From<DownloadConfigBuilderError> for DownloadError {
    fn from(e: DownloadConfigBuilderError) -> Self {
        DownloadError::Planning(e.to_string())
    }
}
