// ---------------------------------------------------------------------------
// Input limits
// ---------------------------------------------------------------------------

/// Maximum accepted length of the share URL / share text, in characters.
pub const MAX_SHARE_TEXT_LENGTH: usize = 2048;

/// Default `max_keys` for the list endpoint.
pub const DEFAULT_LIST_KEYS: usize = 100;

/// Upper bound for `max_keys`; one S3 ListObjectsV2 page.
pub const MAX_LIST_KEYS: usize = 1000;

/// Default prefix for the list endpoint.
pub const DEFAULT_LIST_PREFIX: &str = "douyin/";

/// Default lifetime of a presigned download URL (one hour).
pub const DEFAULT_PRESIGN_EXPIRES_SECS: u64 = 3600;

/// SigV4 presigned URLs cannot outlive seven days.
pub const MAX_PRESIGN_EXPIRES_SECS: u64 = 604_800;

/// Validate the share URL / text of an upload request.
pub fn validate_share_text(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("url must not be empty".to_string());
    }
    let len = url.chars().count();
    if len > MAX_SHARE_TEXT_LENGTH {
        return Err(format!(
            "url is {} characters long (max {})",
            len, MAX_SHARE_TEXT_LENGTH
        ));
    }
    Ok(())
}

/// Validate a presign lifetime in seconds.
pub fn validate_expires_in(expires_in: u64) -> Result<(), String> {
    if expires_in == 0 || expires_in > MAX_PRESIGN_EXPIRES_SECS {
        return Err(format!(
            "expires_in must be between 1 and {} seconds, got {}",
            MAX_PRESIGN_EXPIRES_SECS, expires_in
        ));
    }
    Ok(())
}

/// Clamp a caller-supplied `max_keys` to what one listing page can return.
pub fn clamp_list_keys(requested: Option<usize>) -> usize {
    requested.unwrap_or(DEFAULT_LIST_KEYS).min(MAX_LIST_KEYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_text() {
        assert!(validate_share_text("https://v.douyin.com/L4FJNR3/").is_ok());
        assert!(validate_share_text("").is_err());
        assert!(validate_share_text("   ").is_err());
        assert!(validate_share_text(&"a".repeat(MAX_SHARE_TEXT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_expires_in_bounds() {
        assert!(validate_expires_in(1).is_ok());
        assert!(validate_expires_in(3600).is_ok());
        assert!(validate_expires_in(MAX_PRESIGN_EXPIRES_SECS).is_ok());
        assert!(validate_expires_in(0).is_err());
        assert!(validate_expires_in(MAX_PRESIGN_EXPIRES_SECS + 1).is_err());
    }

    #[test]
    fn test_clamp_list_keys() {
        assert_eq!(clamp_list_keys(None), 100);
        assert_eq!(clamp_list_keys(Some(5)), 5);
        assert_eq!(clamp_list_keys(Some(0)), 0);
        assert_eq!(clamp_list_keys(Some(50_000)), 1000);
    }
}
