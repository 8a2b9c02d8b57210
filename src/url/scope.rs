use url::Url;

/// Returns the site-identifying component of a URL: scheme, host and port
///
/// Default ports are folded in, so `https://example.com` and
/// `https://example.com:443` share a key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docsift::url::site_key;
///
/// let url = Url::parse("https://Example.com:8443/path?q=1").unwrap();
/// assert_eq!(site_key(&url), "https://example.com:8443");
///
/// let url = Url::parse("https://example.com:443/").unwrap();
/// assert_eq!(site_key(&url), "https://example.com");
/// ```
pub fn site_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns true if `candidate` belongs to the same site as `start`
///
/// The comparison is exact on scheme, host and port. Subdomains are not
/// folded together: `www.example.com` and `example.com` are different sites.
pub fn same_site(start: &Url, candidate: &Url) -> bool {
    start.origin() == candidate.origin()
}
