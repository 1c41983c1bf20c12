use std::fmt;

// ---------------------------------------------------------------------------
// Sensitive field redaction
// ---------------------------------------------------------------------------

/// A wrapper that redacts its contents when displayed or debug-printed.
///
/// Usage:
/// ```ignore
/// let secret = Redacted::new(&config.storage.secret_access_key);
/// tracing::info!(secret = %secret, "storage configured"); // logs: secret=[REDACTED]
/// ```
#[derive(Clone)]
pub struct Redacted<T>(T);

impl<T> Redacted<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Display for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl<T> fmt::Debug for Redacted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Redact a presented `Auth` token for logging: keep the first two
/// characters and the length so operators can spot typos.
pub fn redact_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= 4 {
        return "****".to_string();
    }
    let visible: String = token.chars().take(2).collect();
    format!("{}***({} chars)", visible, len)
}

/// Strip the query string from a URL before logging it. Presigned and CDN
/// URLs carry credentials and signatures there.
pub fn redact_url_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_display() {
        let secret = Redacted::new("super_secret_value");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_redacted_debug() {
        let secret = Redacted::new("super_secret_value");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn test_redact_token() {
        assert_eq!(redact_token("shipit2026"), "sh***(10 chars)");
        assert_eq!(redact_token("abcd"), "****");
        assert_eq!(redact_token(""), "****");
    }

    #[test]
    fn test_redact_url_query() {
        assert_eq!(
            redact_url_query("https://cdn.example.com/v.mp4?sig=abc&expires=1"),
            "https://cdn.example.com/v.mp4"
        );
        assert_eq!(redact_url_query("https://a/b"), "https://a/b");
    }
}
