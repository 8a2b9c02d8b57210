use crate::UrlError;
use url::Url;

/// Normalizes a URL so that equivalent references compare equal
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// Scheme and host are lowercased and an empty path becomes `/` by the
/// `url` crate's own parsing. The host is otherwise kept as-is: a `www.`
/// prefix is significant because it names a different site.
///
/// # Examples
///
/// ```
/// use docsift::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM/Docs#install").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);

    Ok(url)
}

/// Resolves a link href against the page it appeared on
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs (same page anchors)
/// - javascript:, mailto:, tel:, data: references
/// - hrefs that do not resolve to an HTTP(S) URL with a host
///
/// # Examples
///
/// ```
/// use docsift::url::resolve_link;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/guide/intro").unwrap();
/// let link = resolve_link("../api#top", &base).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/api");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_parsed(absolute).ok()
}
