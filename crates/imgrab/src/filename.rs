use crate::error::DownloadError;

/// Derive the output file name for `url`.
///
/// The name is everything after the final `/` of the URL string, taken
/// verbatim: query strings and fragments are kept (`a.png?v=2` stays as is).
/// Two URLs with the same final segment map to the same file.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidFilename`] when the segment is empty
/// (the URL ends with `/`) or is `.`/`..`.
///
/// # Examples
///
/// ```
/// use imgrab_engine::derive_filename;
///
/// assert_eq!(derive_filename("https://example.com/images/image1.jpg").unwrap(), "image1.jpg");
/// assert!(derive_filename("https://example.com/images/").is_err());
/// ```
pub fn derive_filename(url: &str) -> Result<String, DownloadError> {
    let segment = url.rsplit('/').next().unwrap_or(url);

    match segment {
        "" => Err(DownloadError::invalid_filename(url, "URL ends with `/`")),
        "." | ".." => Err(DownloadError::invalid_filename(
            url,
            format!("`{segment}` is not a file name"),
        )),
        name => Ok(name.to_string()),
    }
}
