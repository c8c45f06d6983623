//! Account authentication key
//!
//! The API authenticates listing requests with the SHA-1 of `login|password`,
//! rendered as lowercase hex.

use sha1::{Digest, Sha1};

/// Separator placed between login and password before hashing
const CREDENTIAL_SEPARATOR: &str = "|";

/// Derive the API auth key for an account.
///
/// Pure and infallible; the same credentials always produce the same
/// 40-character key.
pub fn derive_auth_key(login: &str, password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(login.as_bytes());
    hasher.update(CREDENTIAL_SEPARATOR.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
