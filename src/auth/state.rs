//! Anti-forgery `state` nonce for the authorization redirect
//!
//! A fresh nonce is generated for every sign-in attempt and echoed back by
//! Twitch in the redirect.  A redirect whose `state` differs from the one
//! generated for the attempt is a forged or stale response and must never
//! have its token used.
//!
//! # References
//!
//! - RFC 6749 section 10.12 <https://www.rfc-editor.org/rfc/rfc6749#section-10.12>

use rand::distr::{Alphanumeric, SampleString};

use crate::error::{AuthError, Result};

/// Number of characters in a generated nonce.
///
/// 30 alphanumeric characters carry roughly 178 bits of entropy.
pub const STATE_LENGTH: usize = 30;

/// Generates a fresh `state` nonce of [`STATE_LENGTH`] alphanumeric
/// characters from the thread-local CSPRNG.
///
/// # Examples
///
/// ```
/// use twitch_session::auth::state::{generate, STATE_LENGTH};
///
/// let state = generate();
/// assert_eq!(state.len(), STATE_LENGTH);
/// assert_ne!(state, generate());
/// ```
pub fn generate() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), STATE_LENGTH)
}

/// Checks that the `state` returned in the redirect matches the one sent.
///
/// The comparison is exact and byte-for-byte.  A missing `state` never
/// matches.
///
/// # Errors
///
/// Returns [`AuthError::StateMismatch`] when the values differ.
pub fn verify(expected: &str, returned: Option<&str>) -> Result<()> {
    match returned {
        Some(value) if constant_time_eq(expected.as_bytes(), value.as_bytes()) => Ok(()),
        _ => Err(AuthError::StateMismatch.into()),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
