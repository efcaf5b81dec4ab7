use axum::http::{HeaderMap, header::COOKIE};

/// Find the value of cookie `name` across all `Cookie` headers.
///
/// Empty values are skipped, so a later non-empty cookie of the same name
/// still counts.
#[must_use]
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            if key.trim() == name {
                let val = val.trim().trim_matches('"');
                if val.is_empty() {
                    continue;
                }
                return Some(val.to_string());
            }
        }
    }
    None
}
