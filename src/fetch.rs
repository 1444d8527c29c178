use crate::error::FetchError;
use crate::file::SegmentWriter;
use crate::progress::ProgressEvent;
use crate::segment::Segment;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode, Url};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, instrument, warn};

/// Fetch one segment into the work file, reporting through `tx`
///
/// Every slice of at most `buffer_size` bytes is announced with
/// [`ProgressEvent::BytesWritten`] once its write returned. A failure is
/// announced once with [`ProgressEvent::SegmentFailed`], no retry is attempted
/// and bytes already written are left for the coordinator to clean up.
#[instrument(skip_all, fields(segment = segment.index, range = %segment.range_header()))]
pub(crate) async fn fetch(
    client: Client,
    url: Url,
    segment: Segment,
    writer: SegmentWriter,
    buffer_size: usize,
    tx: UnboundedSender<ProgressEvent>,
) {
    match transfer(&client, url, &segment, writer, buffer_size, &tx).await {
        Ok(n) => debug!("Segment done, {} bytes", n),
        Err(cause) => {
            warn!("Segment failed: {}", cause);
            let _ = tx.send(ProgressEvent::SegmentFailed {
                segment: segment.index,
                cause,
            });
        }
    }
}

async fn transfer(
    client: &Client,
    url: Url,
    segment: &Segment,
    mut writer: SegmentWriter,
    buffer_size: usize,
    tx: &UnboundedSender<ProgressEvent>,
) -> Result<u64, FetchError> {
    let mut resp = client
        .get(url)
        .header(RANGE, segment.range_header())
        .send()
        .await?;
    let status = resp.status();
    debug!("Response code: {}", status);
    // a plain 200 is fine as long as it carries exactly the requested bytes
    if status != StatusCode::PARTIAL_CONTENT && status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }
    if let Some(announced) = resp.content_length() {
        if announced != segment.len() {
            return Err(FetchError::UnexpectedLength {
                expected: segment.len(),
                announced,
            });
        }
    }
    while let Some(mut chunk) = resp.chunk().await? {
        while !chunk.is_empty() {
            let piece = chunk.split_to(buffer_size.min(chunk.len()));
            let len = piece.len() as u64;
            writer.write(piece).await?;
            let _ = tx.send(ProgressEvent::BytesWritten {
                segment: segment.index,
                len,
            });
        }
    }
    if writer.remaining() != 0 {
        return Err(FetchError::ShortBody {
            expected: segment.len(),
            received: writer.written(),
        });
    }
    Ok(writer.written())
}
