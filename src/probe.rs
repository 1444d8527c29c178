use crate::error::ProbeError;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

/// What a HEAD request taught us about the remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: Url,
    pub total_size: u64,
    pub supports_ranges: bool,
}

/// Learn the size of the file and whether the server serves byte ranges
///
/// Redirects are followed by the client. A missing or non-`bytes`
/// `Accept-Ranges` header counts as no range support.
///
/// # Example
///
///```no_run
/// use slicedl::probe;
/// use reqwest::{Client, Url};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new();
///     let target = probe(&client, &Url::parse("https://docs.rs")?).await?;
///     println!("{} bytes", target.total_size);
/// #   Ok(())
/// # }
/// ```
#[instrument(skip(client, url), fields(URL = %url))]
pub async fn probe(client: &Client, url: &Url) -> Result<Target, ProbeError> {
    let resp = client.head(url.clone()).send().await?;
    debug!("Response code: {}", resp.status());
    debug!("Received HEAD response: {:?}", resp.headers());
    if !resp.status().is_success() {
        return Err(ProbeError::Status(resp.status()));
    }
    // content_length() reports the (empty) body of a HEAD response, read the header instead
    let total_size = resp
        .headers()
        .get(CONTENT_LENGTH)
        .ok_or(ProbeError::NoLen)?
        .to_str()?
        .trim()
        .parse::<u64>()?;
    if total_size == 0 {
        return Err(ProbeError::ZeroLen);
    }
    let supports_ranges = resp
        .headers()
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("bytes"))
        .unwrap_or(false);
    debug!(total_size, supports_ranges, "Probed");
    Ok(Target {
        url: url.clone(),
        total_size,
        supports_ranges,
    })
}
