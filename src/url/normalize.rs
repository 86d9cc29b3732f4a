use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical form
///
/// The canonical form is the sole key used for deduplication, both in the
/// in-memory frontier and in the `crawler_queue` table.
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed (parsing also lowercases the
///    scheme and host and gives an empty path the root `/`)
/// 2. Reject anything but HTTP and HTTPS
/// 3. Remove the query string
/// 4. Remove the fragment
///
/// The result is idempotent: normalizing a canonical URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use trawl::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/wiki/Page?action=edit#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/wiki/Page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Normalizes a URL and returns the canonical string
pub fn canonicalize(url_str: &str) -> Result<String, UrlError> {
    normalize_url(url_str).map(String::from)
}
