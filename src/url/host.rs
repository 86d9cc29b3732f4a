use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use trawl::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs point at the same site
///
/// Two URLs share a site when their hosts match and their effective ports
/// match (`http://a.test` and `http://a.test:80` are the same site). Links
/// between URLs of the same site are internal and are not crawled.
pub fn same_site(a: &Url, b: &Url) -> bool {
    extract_host(a) == extract_host(b) && a.port_or_known_default() == b.port_or_known_default()
}
