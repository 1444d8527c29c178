use reqwest::Url;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Name used when the URL path doesn't end in a file name
pub const DEFAULT_FILENAME: &str = "downloaded_file";

/// Last segment of the URL path, if there is one
///
/// # Example
/// ```
/// use slicedl::utils::url_to_filename;
/// use reqwest::Url;
/// # fn main() -> Result<(), url::ParseError> {
/// let url = Url::parse("http://test.rs/files/test.zip?x=1")?;
/// assert_eq!(url_to_filename(&url).as_deref(), Some("test.zip"));
/// # Ok(())
/// # }
/// ```
pub fn url_to_filename(url: &Url) -> Option<String> {
    url.path_segments()
        .and_then(|segments| segments.last())
        .and_then(|name| {
            if name.is_empty() {
                None
            } else {
                Some(name.to_string())
            }
        })
}

/// [`url_to_filename`] or [`DEFAULT_FILENAME`]
pub fn filename_or_default(url: &Url) -> String {
    url_to_filename(url).unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

/// Sibling of `dest` named `<file name>.<extension>`
///
/// Returns `None` when `dest` has no file name.
pub fn partial_path(dest: &Path, extension: &str) -> Option<PathBuf> {
    let mut name = OsString::from(dest.file_name()?);
    name.push(".");
    name.push(extension);
    Some(dest.with_file_name(name))
}
