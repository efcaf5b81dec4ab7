//! Open-redirect defense for post-login navigation targets.

/// Return `candidate` when it is a same-origin relative path, `fallback` otherwise.
///
/// A usable target starts with exactly one `/`. Absolute URLs (`https://...`),
/// protocol-relative URLs (`//host/...`) and bare relative paths are replaced by
/// `fallback`. Valid targets are returned unchanged, query and fragment included.
#[must_use]
pub fn sanitize_next_path(candidate: Option<&str>, fallback: &str) -> String {
    match candidate {
        Some(path) if is_same_origin_path(path) => path.to_string(),
        _ => fallback.to_string(),
    }
}

/// True when `path` starts with a single `/` that cannot be read as an authority.
///
/// Control characters are rejected so the target always fits a `Location`
/// header.
#[must_use]
pub fn is_same_origin_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    // Browsers treat `/\host` like `//host`.
    !rest.starts_with(['/', '\\']) && !path.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_empty_falls_back() {
        assert_eq!(sanitize_next_path(None, "/home"), "/home");
        assert_eq!(sanitize_next_path(Some(""), "/home"), "/home");
    }

    #[test]
    fn protocol_relative_is_rejected() {
        assert_eq!(sanitize_next_path(Some("//evil.com/x"), "/home"), "/home");
        assert_eq!(sanitize_next_path(Some("/\\evil.com"), "/home"), "/home");
    }

    #[test]
    fn absolute_url_is_rejected() {
        assert_eq!(sanitize_next_path(Some("http://evil.com"), "/home"), "/home");
        assert_eq!(
            sanitize_next_path(Some("javascript:alert(1)"), "/home"),
            "/home"
        );
    }

    #[test]
    fn control_characters_are_rejected() {
        assert_eq!(
            sanitize_next_path(Some("/a\r\nSet-Cookie:x=1"), "/home"),
            "/home"
        );
        assert_eq!(sanitize_next_path(Some("/tab\there"), "/home"), "/home");
        assert_eq!(sanitize_next_path(Some("/nul\0"), "/home"), "/home");
        assert_eq!(sanitize_next_path(Some("/del\u{7f}"), "/home"), "/home");
    }

    #[test]
    fn bare_relative_path_is_rejected() {
        assert_eq!(sanitize_next_path(Some("client/projects"), "/home"), "/home");
    }

    #[test]
    fn relative_path_passes_through_unchanged() {
        assert_eq!(
            sanitize_next_path(Some("/client/projects?tab=2"), "/home"),
            "/client/projects?tab=2"
        );
        assert_eq!(sanitize_next_path(Some("/"), "/home"), "/");
        assert_eq!(
            sanitize_next_path(Some("/docs#section"), "/home"),
            "/docs#section"
        );
    }
}
