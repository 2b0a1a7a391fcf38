use url::Url;

/// Parse a single line as a page URL, trying to add https:// if needed.
///
/// Only http and https are accepted. Without a scheme the host must look like
/// a domain (contain a `.`) or be `localhost`.
pub fn parse_url_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("https://{}", line);
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some_and(|host| host.contains('.') || host == "localhost") => {
            Some(with_scheme)
        }
        _ => None,
    }
}
