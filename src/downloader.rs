use crate::config::DownloadConfig;
use crate::error::FinalizeError;
use crate::fetch::fetch;
use crate::file::WorkFile;
use crate::probe::{probe, Target};
use crate::progress::{Progress, ProgressEvent};
use crate::segment::{plan, Segment};
use crate::utils::partial_path;
use crate::{DownloadError, Result};
use futures::Future;
use reqwest::{Client, Url};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace, warn};

/// Outcome of a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// Where the file ended up
    pub path: PathBuf,
    pub total_size: u64,
    /// Number of segments fetched concurrently
    pub segments: usize,
}

/// Main type of the crate, downloads one URL in concurrent byte-range segments
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    url: Url,
    config: DownloadConfig,
}

impl Downloader {
    /// Create a downloader with the default [`DownloadConfig`]
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use slicedl::Downloader;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), slicedl::DownloadError> {
    ///     let dl = Downloader::new("https://crates.io/big.iso")?;
    ///     let done = dl.download("/tmp/big.iso", ()).await?;
    ///     println!("{} bytes in {} segments", done.total_size, done.segments);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(url: &str) -> Result<Self> {
        Self::with_config(url, DownloadConfig::default())
    }
    /// Create a downloader whose client honours the timeouts of `config`
    pub fn with_config(url: &str, config: DownloadConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Self::with_client(builder.build()?, url, config)
    }
    /// Use a preconfigured [`Client`], the timeouts of `config` are not applied
    pub fn with_client(client: Client, url: &str, config: DownloadConfig) -> Result<Self> {
        Ok(Self {
            client,
            url: Url::parse(url)?,
            config,
        })
    }
    pub fn get_client(&self) -> &Client {
        &self.client
    }
    pub fn url(&self) -> &Url {
        &self.url
    }
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }
    /// Ask the server for the size and range support of the file
    pub async fn probe(&self) -> Result<Target> {
        Ok(probe(&self.client, &self.url).await?)
    }
    /// Segments a download of `target` would use
    pub fn plan(&self, target: &Target) -> Result<Vec<Segment>> {
        plan(target.total_size, target.supports_ranges, &self.config)
    }
    /// Download the file to `dest`
    ///
    /// The data lands in `<dest>.<partial_extension>` first and is renamed to
    /// `dest` only once every segment succeeded and the byte count matches.
    pub async fn download<P: Progress>(
        &self,
        dest: impl AsRef<Path>,
        progress: P,
    ) -> Result<Completed> {
        self.download_until(dest, progress, futures::future::pending::<()>())
            .await
    }
    /// Like [`download`][Downloader::download], giving up as soon as `shutdown` resolves
    ///
    /// Fetchers still running at that point are aborted and awaited before the
    /// work file is removed. `shutdown` is only watched while probing and
    /// fetching: a signal during preallocation takes effect once fetching
    /// starts, one during the final rename is not seen.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use slicedl::Downloader;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), slicedl::DownloadError> {
    /// let dl = Downloader::new("https://crates.io/big.iso")?;
    /// let ctrl_c = async {
    ///     let _ = tokio::signal::ctrl_c().await;
    /// };
    /// dl.download_until("big.iso", (), ctrl_c).await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all, fields(URL = %self.url, dest = %dest.as_ref().display()))]
    pub async fn download_until<P, F>(
        &self,
        dest: impl AsRef<Path>,
        mut progress: P,
        shutdown: F,
    ) -> Result<Completed>
    where
        P: Progress,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let res = self.run(dest.as_ref(), &mut progress, &mut shutdown).await;
        match &res {
            Ok(done) => {
                info!("Download completed: {}", done.path.display());
                progress.finish(&done.path);
            }
            Err(e) => {
                warn!("Download failed: {}", e);
                progress.fail(&e.to_string());
            }
        }
        res
    }

    async fn run<P, S>(&self, dest: &Path, progress: &mut P, shutdown: &mut S) -> Result<Completed>
    where
        P: Progress,
        S: Future<Output = ()> + Unpin,
    {
        let work_path = partial_path(dest, &self.config.partial_extension)
            .ok_or_else(|| DownloadError::InvalidDestination(dest.to_path_buf()))?;
        if !self.config.overwrite && tokio::fs::metadata(dest).await.is_ok() {
            return Err(FinalizeError::DestinationExists(dest.to_path_buf()).into());
        }
        let target = tokio::select! {
            target = self.probe() => target?,
            _ = &mut *shutdown => return Err(DownloadError::Canceled),
        };
        let segments = self.plan(&target)?;
        info!(
            "Using {} segment{} for {} bytes",
            segments.len(),
            if segments.len() > 1 { "s" } else { "" },
            target.total_size
        );
        let work = WorkFile::create(&work_path, target.total_size).await?;
        progress.start(target.total_size);
        let written = match self.fetch_all(&segments, &work, progress, shutdown).await {
            Ok(written) => written,
            Err(e) => {
                work.discard().await;
                return Err(e);
            }
        };
        if written != target.total_size {
            work.discard().await;
            return Err(DownloadError::SizeMismatch {
                expected: target.total_size,
                actual: written,
            });
        }
        let path = work.persist(dest, self.config.overwrite).await?;
        Ok(Completed {
            path,
            total_size: target.total_size,
            segments: segments.len(),
        })
    }

    /// Run one fetcher per segment and drain their events until every one of them is gone
    ///
    /// Returns the number of bytes reported written. The first segment failure
    /// is kept and returned once all fetchers terminated, later byte counts are
    /// not trusted anymore.
    #[instrument(skip_all, fields(segments = segments.len()))]
    async fn fetch_all<P, S>(
        &self,
        segments: &[Segment],
        work: &WorkFile,
        progress: &mut P,
        shutdown: &mut S,
    ) -> Result<u64>
    where
        P: Progress,
        S: Future<Output = ()> + Unpin,
    {
        let writers = segments
            .iter()
            .map(|s| work.writer(s))
            .collect::<Result<Vec<_>>>()?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handles = segments
            .iter()
            .zip(writers)
            .map(|(segment, writer)| {
                tokio::spawn(fetch(
                    self.client.clone(),
                    self.url.clone(),
                    *segment,
                    writer,
                    self.config.buffer_size,
                    tx.clone(),
                ))
            })
            .collect::<Vec<_>>();
        // the channel closes once the last fetcher drops its sender
        drop(tx);

        let mut written = 0u64;
        let mut failure: Option<DownloadError> = None;
        let mut canceled = false;
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(ProgressEvent::BytesWritten { len, .. }) => {
                        if failure.is_none() {
                            written += len;
                            progress.inc(len);
                        }
                    }
                    Some(ProgressEvent::SegmentFailed { segment, cause }) => {
                        if failure.is_none() {
                            warn!("Segment {} failed, waiting for the others to finish", segment);
                            failure = Some(DownloadError::Fetch { segment, source: cause });
                        } else {
                            debug!("Segment {} failed too: {}", segment, cause);
                        }
                    }
                    None => break,
                },
                _ = &mut *shutdown, if !canceled => {
                    canceled = true;
                    warn!("Canceled, stopping {} fetcher(s)", handles.len());
                    for handle in &handles {
                        handle.abort();
                    }
                    failure.get_or_insert(DownloadError::Canceled);
                }
                _ = ticker.tick() => {
                    let active = handles.iter().filter(|h| !h.is_finished()).count();
                    trace!(active, written, "Waiting on fetchers");
                }
            }
        }
        for handle in handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    failure.get_or_insert(DownloadError::Join(e));
                }
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(written),
        }
    }
}
