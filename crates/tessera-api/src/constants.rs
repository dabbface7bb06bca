//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

/// Current API version segment.
pub const API_VERSION: &str = "v1";

/// Versioned prefix for every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Build a versioned API path, e.g. `api_path("/resources")` → `/api/v1/resources`.
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_is_base_plus_version() {
        assert_eq!(API_PREFIX, format!("{}/{}", API_BASE, API_VERSION));
        assert_eq!(api_path("/resources"), "/api/v1/resources");
    }
}
