use reqwest::StatusCode;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io;

/// Errors raised while learning the size and range support of the target
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Represents problems with network connectivity
    #[error("HEAD request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered the HEAD request with a failure status
    #[error("Server returned {0}")]
    Status(StatusCode),
    /// No content-length header was present
    #[error("Server did not provide a content-length")]
    NoLen,
    /// Returned when the content length couldn't be parsed
    #[error("Failed to parse content-length: {0}")]
    LenParse(#[from] ParseIntError),
    /// Returned when the header can't be read as a string
    #[error(transparent)]
    ToStr(#[from] reqwest::header::ToStrError),
    /// The server reported a size of zero
    #[error("Server did not provide a usable size")]
    ZeroLen,
}

/// Errors raised by a single segment transfer
#[derive(Debug, Error)]
pub enum FetchError {
    /// Represents problems with network connectivity
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The response status was neither 200 nor 206
    #[error("Range not satisfiable, server returned {0}")]
    Status(StatusCode),
    /// The declared body length disagrees with the requested range
    #[error("Expected {expected} bytes, server announced {announced}")]
    UnexpectedLength { expected: u64, announced: u64 },
    /// The body carried more bytes than the segment holds
    #[error("Body overruns the segment ending at byte {end}")]
    Overrun { end: u64 },
    /// The body ended before the segment was filled
    #[error("Body ended early, received {received} of {expected} bytes")]
    ShortBody { expected: u64, received: u64 },
    /// Writing into the work file failed
    #[error("Write failed: {0}")]
    Write(#[from] io::Error),
}

/// Errors raised while moving the work file to its final name
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// The destination exists and overwriting is disabled
    #[error("{} already exists", .0.display())]
    DestinationExists(PathBuf),
    /// Flushing the work file to disk failed
    #[error("Failed to sync {}: {source}", .path.display())]
    Sync { path: PathBuf, source: io::Error },
    /// The rename itself failed (cross-device, permissions...)
    #[error("Failed to rename {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Error definition for possible errors in this crate
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),
    /// The configuration can't produce a valid segment plan
    #[error("Invalid plan: {0}")]
    Planning(String),
    /// Creating or sizing the work file failed
    #[error("Failed to preallocate {}: {source}", .path.display())]
    Preallocate { path: PathBuf, source: io::Error },
    #[error("Segment {segment} failed: {source}")]
    Fetch {
        segment: usize,
        #[source]
        source: FetchError,
    },
    /// Sum of written bytes doesn't match the advertised size
    #[error("Received {actual} bytes, expected {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
    #[error(transparent)]
    Finalize(#[from] FinalizeError),
    #[error("Download canceled")]
    Canceled,
    /// A fetcher task panicked
    #[error("Segment task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// The destination path has no file name
    #[error("{} is not a file path", .0.display())]
    InvalidDestination(PathBuf),
    #[error("Failed to parse URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The HTTP client couldn't be built
    #[error("Failed to build client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Alias for Result<T, slicedl::DownloadError>
pub type Result<T> = std::result::Result<T, DownloadError>;
