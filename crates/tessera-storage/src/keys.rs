//! Shared key generation for storage backends.

use uuid::Uuid;

/// Storage key for a file belonging to a resource: `resources/{resource_id}/{filename}`.
pub fn generate_storage_key(resource_id: Uuid, filename: &str) -> String {
    format!("resources/{}/{}", resource_id, filename)
}

/// Reject keys that could escape the storage root.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.contains("..") && !key.starts_with('/') && !key.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            generate_storage_key(id, "a.mp4"),
            "resources/00000000-0000-0000-0000-000000000000/a.mp4"
        );
    }

    #[test]
    fn test_unsafe_keys() {
        assert!(is_safe_key("resources/x/a.mp4"));
        assert!(!is_safe_key("../etc/passwd"));
        assert!(!is_safe_key("/etc/passwd"));
        assert!(!is_safe_key(""));
    }
}
