//! Bearer-token authentication for the RPC surface plus token helpers.
use axum::{
    Extension,
    extract::FromRequestParts,
    http::request::Parts,
};
use std::future::Future;

use anyhow::anyhow;
use rand_core::{OsRng, RngCore};

use crate::SharedState;
use crate::error::DnsError;

/// Axum extractor that verifies the `Authorization: Bearer` token against the
/// stored RPC tokens.
pub struct Authenticated;

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = DnsError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> {
        Box::pin(async move {
            // The state is SharedState via Extension
            let Extension(app_state): axum::extract::Extension<SharedState> =
                Extension::from_request_parts(parts, state)
                    .await
                    .map_err(|_| DnsError::Backend(anyhow!("missing state")))?;

            let auth_header = parts
                .headers
                .get(axum::http::header::AUTHORIZATION)
                .ok_or(DnsError::Unauthorized)?
                .to_str()
                .map_err(|_| DnsError::bad_request("invalid Authorization header"))?;

            let token = auth_header
                .strip_prefix("Bearer ")
                .ok_or(DnsError::Unauthorized)?
                .trim();

            if !app_state.store.is_valid_api_token(token) {
                return Err(DnsError::Unauthorized);
            }

            Ok(Authenticated)
        })
    }
}

/// Compare two byte strings without an early exit on the first mismatch.
///
/// Lengths are not secret; contents are.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Generate a fresh RPC token: 32 random bytes, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Shorten a token for display in chat.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "****".to_string();
    }
    format!("{}...{}", &token[..8], &token[token.len() - 8..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret1"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn generated_tokens_are_hex_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn token_masking() {
        assert_eq!(mask_token("short"), "****");
        let token = "0123456789abcdef0123456789abcdef";
        let masked = mask_token(token);
        assert_eq!(masked, "01234567...89abcdef");
    }
}
