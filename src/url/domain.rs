use url::Url;

/// Extracts the network location (host plus explicit port) from a URL string
///
/// This is the directory key articles are grouped under. The host comes back
/// lowercased by the URL parser; a non-default port is kept.
///
/// # Returns
///
/// * `Some(String)` - The host, with `:port` when the URL names one
/// * `None` - If the string is not an absolute URL with a host
///
/// # Examples
///
/// ```
/// use wp_harvest::url::extract_domain;
///
/// assert_eq!(extract_domain("https://Example.COM/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("http://localhost:8080/a"), Some("localhost:8080".to_string()));
/// assert_eq!(extract_domain("/relative/path"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    match parsed.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}
