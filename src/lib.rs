//! Fast segmented downloads of a single large file
//!
//! Probes the server for the file size and byte-range support, splits the file
//! into contiguous segments and fetches them concurrently, each segment writing
//! straight into its own region of a preallocated `<name>.partial` file. The
//! file is renamed to its final name only after every segment succeeded and
//! the number of bytes written matches the advertised size, on any failure or
//! cancellation it is removed.
//!
//! The crate exposes debug logs through the [`tracing`][tracing] crate
//!
//! ## Feature flags
//!
//! - `progress`: Implements [`Progress`] for `indicatif::ProgressBar`
//! - `rustls` / `openssl`: TLS backend of the reqwest [`Client`][reqwest::Client]
//! - `cli`: Builds the `slicedl` binary
//!
//! ## Crate usage
//!
//! # Example
//!
//! ```no_run
//! use slicedl::{DownloadConfigBuilder, Downloader};
//! #[tokio::main]
//! async fn main() -> Result<(), slicedl::DownloadError> {
//!     let config = DownloadConfigBuilder::default().max_workers(8u16).build()?;
//!     let dl = Downloader::with_config("https://crates.io/big.iso", config)?;
//!     let done = dl.download("big.iso", ()).await?;
//!     println!("{} bytes saved to {}", done.total_size, done.path.display());
//!     Ok(())
//! }
//! ```

mod config;
mod downloader;
mod error;
mod fetch;
mod file;
mod probe;
mod progress;
mod segment;
pub mod utils;

pub use config::{
    DownloadConfig, DownloadConfigBuilder, DownloadConfigBuilderError, BUFFER_SIZE, MAX_WORKERS,
    MIN_SEGMENT_SIZE, POLL_INTERVAL,
};
pub use downloader::{Completed, Downloader};
pub use error::{DownloadError, FetchError, FinalizeError, ProbeError, Result};
pub use file::{SegmentWriter, WorkFile};
#[cfg(feature = "progress")]
pub use indicatif::{ProgressBar, ProgressStyle};
pub use probe::{probe, Target};
pub use progress::{Progress, ProgressEvent};
pub use reqwest::{Client, Url};
pub use segment::{plan, worker_count, Segment, Segments};
