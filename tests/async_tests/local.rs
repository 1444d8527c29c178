use crate::{
    file_url, init_logging, partial_of, payload, start_server, Served, Tally, TestResult, MIB,
};
use slicedl::{DownloadConfigBuilder, Downloader, BUFFER_SIZE};

#[tokio::test]
async fn ranged_download_in_segments() -> TestResult {
    init_logging();
    let data = payload(50 * MIB);
    let served = Served::new(data.clone());
    let addr = start_server(served.clone());
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("big.bin");

    let dl = Downloader::new(&file_url(addr))?;
    let mut tally = Tally::default();
    let done = dl.download(&dest, &mut tally).await?;

    assert_eq!(done.path, dest);
    assert_eq!(done.total_size, data.len() as u64);
    assert!(done.segments >= 2);
    assert_eq!(done.segments, 10);
    assert_eq!(served.gets(), done.segments);
    assert_eq!(tally.total, data.len() as u64);
    assert_eq!(tally.seen, data.len() as u64);
    assert!(tally.largest <= BUFFER_SIZE as u64);
    assert!(tally.finished);
    assert!(tally.failure.is_none());
    assert_eq!(std::fs::metadata(&dest)?.len(), data.len() as u64);
    assert!(std::fs::read(&dest)? == data);
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn no_range_support_uses_one_segment() -> TestResult {
    init_logging();
    let data = payload(MIB);
    let mut served = Served::new(data.clone());
    served.ranges = false;
    let addr = start_server(served.clone());
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("small.bin");

    let mut tally = Tally::default();
    let done = Downloader::new(&file_url(addr))?
        .download(&dest, &mut tally)
        .await?;

    assert_eq!(done.segments, 1);
    assert_eq!(served.gets(), 1);
    assert_eq!(tally.seen, MIB as u64);
    assert_eq!(std::fs::metadata(&dest)?.len(), MIB as u64);
    assert!(std::fs::read(&dest)? == data);
    Ok(())
}

#[tokio::test]
async fn small_segments_cover_uneven_sizes() -> TestResult {
    init_logging();
    let data = payload(MIB + 12_345);
    let addr = start_server(Served::new(data.clone()));
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("uneven.bin");
    let config = DownloadConfigBuilder::default()
        .min_segment_size(64 * 1024)
        .max_workers(7u16)
        .buffer_size(1000usize)
        .build()?;

    let mut tally = Tally::default();
    let done = Downloader::with_config(&file_url(addr), config)?
        .download(&dest, &mut tally)
        .await?;

    assert_eq!(done.segments, 7);
    assert!(tally.largest <= 1000);
    assert_eq!(tally.seen, data.len() as u64);
    assert!(std::fs::read(&dest)? == data);
    Ok(())
}

#[tokio::test]
async fn second_run_replaces_first() -> TestResult {
    init_logging();
    let data = payload(3 * MIB);
    let addr = start_server(Served::new(data.clone()));
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("again.bin");
    let config = DownloadConfigBuilder::default()
        .min_segment_size(MIB as u64)
        .build()?;
    let dl = Downloader::with_config(&file_url(addr), config)?;

    dl.download(&dest, ()).await?;
    let first = std::fs::read(&dest)?;
    std::fs::write(partial_of(&dest), b"stale leftovers from a crash")?;
    dl.download(&dest, ()).await?;
    let second = std::fs::read(&dest)?;

    assert!(first == data);
    assert!(second == first);
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn probe_reports_size_and_ranges() -> TestResult {
    init_logging();
    let mut served = Served::new(payload(1000));
    let addr = start_server(served.clone());
    let target = Downloader::new(&file_url(addr))?.probe().await?;
    assert_eq!(target.total_size, 1000);
    assert!(target.supports_ranges);

    served.ranges = false;
    let addr = start_server(served);
    let target = Downloader::new(&file_url(addr))?.probe().await?;
    assert!(!target.supports_ranges);
    Ok(())
}
