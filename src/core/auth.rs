use subtle::ConstantTimeEq;

use super::config::AuthConfig;

/// Name of the header carrying the shared secret.
pub const AUTH_HEADER: &str = "Auth";

/// Shared-secret check for the `Auth` header.
///
/// The secret is compared in constant time. There is no session, expiry or
/// per-user scoping: a request either presents the secret or it does not.
#[derive(Debug)]
pub struct AuthProvider {
    token: Vec<u8>,
    protect_reads: bool,
}

/// Result of checking an `Auth` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Missing,
    Invalid,
}

impl AuthProvider {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            token: config.token.as_bytes().to_vec(),
            protect_reads: config.protect_reads,
        }
    }

    /// Check a presented token against the configured secret.
    pub fn check_token(&self, presented: Option<&str>) -> TokenStatus {
        match presented {
            None => TokenStatus::Missing,
            Some(t) if constant_time_eq(t.as_bytes(), &self.token) => TokenStatus::Valid,
            Some(_) => TokenStatus::Invalid,
        }
    }

    /// Whether the list and presign endpoints require the token too.
    pub fn protects_reads(&self) -> bool {
        self.protect_reads
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    // An empty secret never matches, even an empty header.
    if b.is_empty() || a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(token: &str) -> AuthProvider {
        AuthProvider::new(&AuthConfig {
            token: token.to_string(),
            protect_reads: true,
        })
    }

    #[test]
    fn test_valid_token() {
        let auth = provider("shipit2026");
        assert_eq!(auth.check_token(Some("shipit2026")), TokenStatus::Valid);
    }

    #[test]
    fn test_missing_token() {
        let auth = provider("shipit2026");
        assert_eq!(auth.check_token(None), TokenStatus::Missing);
    }

    #[test]
    fn test_wrong_token() {
        let auth = provider("shipit2026");
        assert_eq!(auth.check_token(Some("shipit2025")), TokenStatus::Invalid);
        assert_eq!(auth.check_token(Some("shipit")), TokenStatus::Invalid);
        assert_eq!(auth.check_token(Some("")), TokenStatus::Invalid);
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let auth = provider("");
        assert_eq!(auth.check_token(Some("")), TokenStatus::Invalid);
        assert_eq!(auth.check_token(Some("anything")), TokenStatus::Invalid);
    }
}
