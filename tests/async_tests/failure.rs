use crate::{
    file_url, init_logging, partial_of, payload, start_server, Served, Tally, TestResult, MIB,
};
use slicedl::{DownloadConfigBuilder, DownloadError, Downloader, FinalizeError, ProbeError};
use std::time::Duration;

#[tokio::test]
async fn failed_segment_rolls_back() -> TestResult {
    init_logging();
    let mut served = Served::new(payload(MIB));
    served.fail_from = Some(MIB as u64 / 2);
    let addr = start_server(served.clone());
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("broken.bin");
    let config = DownloadConfigBuilder::default()
        .min_segment_size(64 * 1024)
        .build()?;

    let mut tally = Tally::default();
    let err = Downloader::with_config(&file_url(addr), config)?
        .download(&dest, &mut tally)
        .await
        .unwrap_err();

    match err {
        DownloadError::Fetch { segment, .. } => assert!(segment >= 8),
        other => panic!("unexpected error: {}", other),
    }
    // siblings are not aborted, every segment was requested
    assert_eq!(served.gets(), 16);
    assert!(!tally.finished);
    assert!(tally.failure.is_some());
    assert!(!dest.exists());
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn dropped_connection_rolls_back() -> TestResult {
    init_logging();
    let mut served = Served::new(payload(MIB));
    served.cut_from = Some(MIB as u64 / 2);
    let addr = start_server(served.clone());
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("cut.bin");
    let config = DownloadConfigBuilder::default()
        .min_segment_size(64 * 1024)
        .build()?;

    let mut tally = Tally::default();
    let err = Downloader::with_config(&file_url(addr), config)?
        .download(&dest, &mut tally)
        .await
        .unwrap_err();

    match err {
        DownloadError::Fetch { segment, .. } => assert!(segment >= 8),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(served.gets(), 16);
    assert!(tally.seen < MIB as u64);
    assert!(!tally.finished);
    assert!(!dest.exists());
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn cancel_removes_work_file() -> TestResult {
    init_logging();
    let mut served = Served::new(payload(MIB));
    served.delay = Some(Duration::from_secs(30));
    let addr = start_server(served);
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("slow.bin");
    let config = DownloadConfigBuilder::default()
        .min_segment_size(128 * 1024)
        .build()?;
    let dl = Downloader::with_config(&file_url(addr), config)?;

    let shutdown = tokio::time::sleep(Duration::from_millis(300));
    let started = std::time::Instant::now();
    let err = dl.download_until(&dest, (), shutdown).await.unwrap_err();

    assert!(matches!(err, DownloadError::Canceled));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!dest.exists());
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn zero_size_is_rejected_before_any_file() -> TestResult {
    init_logging();
    let mut served = Served::new(payload(10));
    served.announced = Some(0);
    let addr = start_server(served.clone());
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("empty.bin");

    let err = Downloader::new(&file_url(addr))?
        .download(&dest, ())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Probe(ProbeError::ZeroLen)));
    assert_eq!(served.gets(), 0);
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn missing_file_fails_probe() -> TestResult {
    init_logging();
    let addr = start_server(Served::new(payload(10)));
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("nothing.bin");

    let url = format!("http://{}/nothing", addr);
    let err = Downloader::new(&url)?
        .download(&dest, ())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Probe(ProbeError::Status(s)) if s.is_client_error()));
    assert!(!dest.exists());
    Ok(())
}

#[tokio::test]
async fn size_mismatch_is_not_finalized() -> TestResult {
    init_logging();
    let mut served = Served::new(payload(1000));
    served.ranges = false;
    served.announced = Some(2000);
    let addr = start_server(served);
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("short.bin");

    let err = Downloader::new(&file_url(addr))?
        .download(&dest, ())
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Fetch { segment: 0, .. }));
    assert!(!dest.exists());
    assert!(!partial_of(&dest).exists());
    Ok(())
}

#[tokio::test]
async fn no_clobber_keeps_existing_file() -> TestResult {
    init_logging();
    let served = Served::new(payload(1000));
    let addr = start_server(served.clone());
    let dir = tempfile::tempdir()?;
    let dest = dir.path().join("kept.bin");
    std::fs::write(&dest, b"precious")?;
    let config = DownloadConfigBuilder::default().overwrite(false).build()?;

    let err = Downloader::with_config(&file_url(addr), config)?
        .download(&dest, ())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DownloadError::Finalize(FinalizeError::DestinationExists(_))
    ));
    assert_eq!(served.gets(), 0);
    assert_eq!(std::fs::read(&dest)?, b"precious");
    Ok(())
}

#[tokio::test]
async fn bad_destination_is_rejected() -> TestResult {
    let dl = Downloader::new("http://127.0.0.1:9/file")?;
    let err = dl.download("/", ()).await.unwrap_err();
    assert!(matches!(err, DownloadError::InvalidDestination(_)));
    Ok(())
}
