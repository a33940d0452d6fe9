/// Turns a configured endpoint into a base URL.
///
/// A bare host (`metabase.example.com:3000`) gets `http://`; an explicit
/// scheme is kept as given.
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if has_scheme(endpoint) {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

fn has_scheme(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub(crate) fn urljoin(base: &str, path: &str) -> String {
    if has_scheme(path) {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
