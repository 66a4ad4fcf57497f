//! Cryptographic primitives for token signing
//!
//! Signature checks must not leak how many leading bytes matched, so all
//! comparisons of secret-derived material go through [`constant_time_eq`].

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Token signing key, keyed once at startup.
///
/// Holds the keyed MAC state rather than the raw secret; each signature
/// starts from a clone of it.
#[derive(Clone)]
pub struct HmacKey {
    keyed: HmacSha256,
    len: usize,
}

impl HmacKey {
    /// Shortest accepted secret, in bytes
    pub const MIN_KEY_LENGTH: usize = 32;

    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, HmacKeyError> {
        let secret = secret.as_ref();
        if secret.len() < Self::MIN_KEY_LENGTH {
            return Err(HmacKeyError::KeyTooShort {
                actual: secret.len(),
                minimum: Self::MIN_KEY_LENGTH,
            });
        }
        let keyed = HmacSha256::new_from_slice(secret).map_err(|_| HmacKeyError::Rejected)?;
        Ok(Self {
            keyed,
            len: secret.len(),
        })
    }

    /// HMAC-SHA256 tag over `data`
    pub fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = self.keyed.clone();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }
}

impl std::fmt::Debug for HmacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacKey")
            .field("key_length", &self.len)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HmacKeyError {
    #[error("signing secret too short: {actual} bytes, minimum {minimum}")]
    KeyTooShort { actual: usize, minimum: usize },

    #[error("signing secret rejected by HMAC")]
    Rejected,
}

/// Byte comparison whose running time depends only on the lengths.
///
/// Lengths are public here (every tag is 32 bytes), so a length mismatch
/// returns early.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
