use url::Url;

/// Domain blacklist built from configured substrings
///
/// A URL is blacklisted when any entry is a substring of its lowercased host,
/// so `archive.org` also covers `web.archive.org`. Blacklisted URLs are never
/// fetched.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<String>,
}

impl Blacklist {
    /// Creates a blacklist, lowercasing every entry and dropping empty ones
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();

        Self { patterns }
    }

    /// Returns true if the URL's host contains any blacklist entry
    ///
    /// URLs that do not parse or carry no host are never blacklisted; they
    /// are rejected later by normalization instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use trawl::url::Blacklist;
    ///
    /// let blacklist = Blacklist::new(["archive.org"]);
    /// assert!(blacklist.is_blacklisted("https://web.archive.org/web/2020/x"));
    /// assert!(!blacklist.is_blacklisted("https://example.org/archive.org"));
    /// ```
    pub fn is_blacklisted(&self, url: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .map(|host| self.matches_host(host))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Returns true if the host contains any blacklist entry
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        self.patterns.iter().any(|p| host.contains(p.as_str()))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
