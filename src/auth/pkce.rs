//! PKCE verifier and challenge generation (RFC 7636, S256 method)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Unreserved URL characters permitted in a code verifier
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Verifier length used by the connect flow (the RFC allows 43-128)
pub const VERIFIER_LENGTH: usize = 64;

/// PKCE verifier/challenge pair for one authorization attempt
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair with the default verifier length
    pub fn generate() -> Self {
        let verifier = random_verifier(VERIFIER_LENGTH);
        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// Generate a code verifier of the given length
///
/// Characters are drawn uniformly from the unreserved set using the thread-local
/// CSPRNG. Lengths outside 43-128 are rejected rather than clamped.
pub fn generate_verifier(length: usize) -> Result<String, AuthError> {
    if !(43..=128).contains(&length) {
        return Err(AuthError::InvalidVerifierLength(length));
    }
    Ok(random_verifier(length))
}

fn random_verifier(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..UNRESERVED.len());
            UNRESERVED[idx] as char
        })
        .collect()
}

/// Derive the S256 code challenge: Base64URL without padding of SHA-256(verifier)
pub fn derive_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
