use clap::Parser;
use clap_verbosity_flag::Verbosity;
use slicedl::{DownloadConfig, DownloadConfigBuilder};
use std::path::PathBuf;
use std::time::Duration;

/// Download one file over HTTP(S) in concurrent byte-range segments
#[derive(Debug, Parser)]
#[clap(name = "slicedl", version, about)]
pub(crate) struct App {
    /// Maximum number of concurrent segments
    #[clap(short, long)]
    pub(crate) threads: Option<u16>,
    /// Directory to save the file in, created if missing
    #[clap(short, long, default_value = ".")]
    pub(crate) output: PathBuf,
    /// Smallest size worth a segment of its own, in bytes
    #[clap(long)]
    pub(crate) min_segment: Option<u64>,
    /// Size of each write into the file, in bytes
    #[clap(long)]
    pub(crate) buffer_size: Option<usize>,
    /// Per request timeout in seconds
    #[clap(long)]
    pub(crate) timeout: Option<u64>,
    /// Connect timeout in seconds
    #[clap(long)]
    pub(crate) connect_timeout: Option<u64>,
    /// Fail instead of replacing an existing file
    #[clap(long)]
    pub(crate) no_clobber: bool,
    #[clap(flatten)]
    pub(crate) verbose: Verbosity,
    /// URL of the file
    pub(crate) url: String,
}

impl App {
    pub(crate) fn new() -> Self {
        Self::parse()
    }
    pub(crate) fn init_logging(&self) {
        let _ = pretty_env_logger::formatted_builder()
            .filter_level(self.verbose.log_level_filter())
            .try_init();
    }
    pub(crate) fn config(&self) -> slicedl::Result<DownloadConfig> {
        let mut builder = DownloadConfigBuilder::default();
        builder.overwrite(!self.no_clobber);
        if let Some(t) = self.threads {
            builder.max_workers(t);
        }
        if let Some(m) = self.min_segment {
            builder.min_segment_size(m);
        }
        if let Some(b) = self.buffer_size {
            builder.buffer_size(b);
        }
        if let Some(t) = self.timeout {
            builder.request_timeout(Duration::from_secs(t));
        }
        if let Some(t) = self.connect_timeout {
            builder.connect_timeout(Duration::from_secs(t));
        }
        Ok(builder.build()?)
    }
}
