//! Opaque verification tokens.

use crate::error::VerifyError;
use serde::{Deserialize, Serialize};

/// Number of random bytes per token (hex-encoded, so 64 characters).
const TOKEN_BYTES: usize = 32;

/// An opaque, unguessable identifier for one pending verification attempt.
///
/// Tokens are the only handle a visitor holds: whoever presents a live token
/// is treated as the subject it was issued for. They carry 256 bits of OS
/// entropy, which makes collisions and guessing practically impossible —
/// the store relies on that instead of checking for duplicates on insert.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Generate a fresh token from the OS entropy source.
    pub fn generate() -> Result<Self, VerifyError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        getrandom::getrandom(&mut bytes)
            .map_err(|e| VerifyError::Entropy(e.to_string()))?;
        Ok(Self(hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
