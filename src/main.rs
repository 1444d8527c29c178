mod app;

use crate::app::App;
use anyhow::{Context, Result};
use slicedl::utils::filename_or_default;
use slicedl::{Downloader, ProgressBar, ProgressStyle};

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::new();
    app.init_logging();
    let config = app.config()?;
    let dl = Downloader::with_config(&app.url, config)?;
    tokio::fs::create_dir_all(&app.output)
        .await
        .with_context(|| format!("Failed to create {}", app.output.display()))?;
    let filename = filename_or_default(dl.url());
    let dest = app.output.join(&filename);

    let style = ProgressStyle::default_bar()
        .template("{msg} {spinner:.green} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .progress_chars("#>-");
    let pb = ProgressBar::new(0);
    pb.set_style(style);
    pb.set_message(filename);

    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            futures::future::pending::<()>().await;
        }
    };
    match dl.download_until(&dest, pb, ctrl_c).await {
        Ok(done) => {
            println!(
                "\nDownload completed successfully: {} ({} segment{})",
                done.path.display(),
                done.segments,
                if done.segments > 1 { "s" } else { "" }
            );
            Ok(())
        }
        Err(slicedl::DownloadError::Canceled) => {
            eprintln!("\nDownload cancelled by user");
            std::process::exit(130);
        }
        Err(e) => Err(e).context("Download failed"),
    }
}
