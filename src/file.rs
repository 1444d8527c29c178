use crate::error::{FetchError, FinalizeError};
use crate::segment::Segment;
use crate::{DownloadError, Result};
use bytes::Bytes;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;
use tracing::{debug, instrument, warn};

/// Preallocated temporary file every segment writes into
///
/// Until [`persist`][WorkFile::persist] succeeds the file is removed when the
/// value is dropped, so no exit path leaves it behind.
#[derive(Debug)]
pub struct WorkFile {
    path: PathBuf,
    file: Arc<File>,
    len: u64,
    armed: bool,
}

impl WorkFile {
    /// Create (or truncate) the file at `path` and size it to `len` bytes
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>, len: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(|source| DownloadError::Preallocate {
                path: path.clone(),
                source,
            })?;
        if let Err(source) = file.set_len(len).await {
            drop(file);
            remove_quietly(&path).await;
            return Err(DownloadError::Preallocate { path, source });
        }
        debug!("Preallocated {} bytes", len);
        Ok(Self {
            path,
            file: Arc::new(file.into_std().await),
            len,
            armed: true,
        })
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
    pub fn len(&self) -> u64 {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    /// Hand out write access limited to the bytes of `segment`
    pub fn writer(&self, segment: &Segment) -> Result<SegmentWriter> {
        if segment.start > segment.end || segment.end >= self.len {
            return Err(DownloadError::Planning(format!(
                "segment {} doesn't fit a {} byte file",
                segment, self.len
            )));
        }
        Ok(SegmentWriter {
            file: self.file.clone(),
            start: segment.start,
            end: segment.end,
            cursor: segment.start,
        })
    }
    /// Flush to disk and rename to `dest`
    ///
    /// With `overwrite` unset an existing `dest` is an error. On any error the
    /// work file is dropped, and with it removed.
    #[instrument(skip(self, dest), fields(from = %self.path.display(), to = %dest.as_ref().display()))]
    pub async fn persist(
        mut self,
        dest: impl AsRef<Path>,
        overwrite: bool,
    ) -> std::result::Result<PathBuf, FinalizeError> {
        let dest = dest.as_ref().to_path_buf();
        let file = self.file.clone();
        task::spawn_blocking(move || file.sync_all())
            .await
            .map_err(join_to_io)
            .and_then(|r| r)
            .map_err(|source| FinalizeError::Sync {
                path: self.path.clone(),
                source,
            })?;
        if !overwrite && tokio::fs::metadata(&dest).await.is_ok() {
            return Err(FinalizeError::DestinationExists(dest));
        }
        #[cfg(windows)]
        if overwrite {
            remove_quietly(&dest).await;
        }
        tokio::fs::rename(&self.path, &dest)
            .await
            .map_err(|source| FinalizeError::Rename {
                from: self.path.clone(),
                to: dest.clone(),
                source,
            })?;
        self.disarm();
        debug!("Renamed");
        Ok(dest)
    }
    /// Keep the file on drop, once it was renamed or removed by hand
    fn disarm(&mut self) {
        self.armed = false;
    }
    /// Remove the file, failures are logged and swallowed
    pub async fn discard(mut self) {
        self.disarm();
        remove_quietly(&self.path).await;
    }
}

impl Drop for WorkFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Positional writer confined to one segment of a [`WorkFile`]
#[derive(Debug)]
pub struct SegmentWriter {
    file: Arc<File>,
    start: u64,
    end: u64,
    cursor: u64,
}

impl SegmentWriter {
    /// Write `data` at the cursor and advance it
    ///
    /// Fails without writing anything if `data` would run past the segment.
    pub async fn write(&mut self, data: Bytes) -> std::result::Result<(), FetchError> {
        let len = data.len() as u64;
        if len == 0 {
            return Ok(());
        }
        if self.cursor + len > self.end + 1 {
            return Err(FetchError::Overrun { end: self.end });
        }
        let file = self.file.clone();
        let offset = self.cursor;
        task::spawn_blocking(move || write_all_at(&file, &data, offset))
            .await
            .map_err(join_to_io)??;
        self.cursor += len;
        Ok(())
    }
    /// Bytes written so far
    pub fn written(&self) -> u64 {
        self.cursor - self.start
    }
    pub fn remaining(&self) -> u64 {
        self.end + 1 - self.cursor
    }
}

fn join_to_io(e: task::JoinError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[cfg(unix)]
fn write_all_at(file: &File, buf: &[u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut buf: &[u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ))
            }
            Ok(n) => {
                buf = &buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
