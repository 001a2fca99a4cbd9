// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed OAuth `state` parameter.
//!
//! Format before encoding: `provider|nonce|timestamp_hex|signature_hex`,
//! where the signature is HMAC-SHA256 over `provider|nonce|timestamp_hex`.
//! The whole string is base64url encoded without padding. The nonce is also
//! stored in a cookie scoped to the callback path and compared on return.

use crate::error::AppError;
use crate::models::Provider;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Contents of a state parameter whose signature checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedState {
    pub provider: Provider,
    pub nonce: String,
    pub issued_at_ms: u128,
}

/// Sign and encode a state parameter.
pub fn sign_state(
    provider: Provider,
    nonce: &str,
    now_ms: u128,
    secret: &[u8],
) -> Result<String, AppError> {
    let payload = format!("{}|{}|{:x}", provider.as_str(), nonce, now_ms);
    let signature = hex::encode(mac(secret, &payload)?);
    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature).as_bytes()))
}

/// Verify the signature and decode the state.
///
/// Returns `None` for anything malformed, tampered, or older than `max_age_ms`.
pub fn verify_state(
    state: &str,
    secret: &[u8],
    now_ms: u128,
    max_age_ms: u128,
) -> Option<VerifiedState> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(4, '|').collect();
    if parts.len() != 4 {
        return None;
    }
    let (provider, nonce, timestamp_hex, signature_hex) = (parts[0], parts[1], parts[2], parts[3]);

    let payload = format!("{}|{}|{}", provider, nonce, timestamp_hex);
    let expected = hex::encode(mac(secret, &payload).ok()?);
    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_at_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_at_ms) > max_age_ms || issued_at_ms > now_ms + 60_000 {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(VerifiedState {
        provider: provider.parse().ok()?,
        nonce: nonce.to_string(),
        issued_at_ms,
    })
}

/// Constant-time comparison of the returned nonce against the cookie.
pub fn nonce_matches(expected: &str, actual: &str) -> bool {
    bool::from(expected.as_bytes().ct_eq(actual.as_bytes()))
}

fn mac(secret: &[u8], payload: &str) -> Result<Vec<u8>, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}
