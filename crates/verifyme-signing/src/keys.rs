//! Ephemeral P-256 key generation.
//!
//! A key lives for exactly one signing run and cannot be saved or loaded.
//! The secret scalar is zeroized when the [`EphemeralKey`] is dropped.

use p256::ecdsa::SigningKey;
use p256::ecdsa::VerifyingKey;
use p256::FieldBytes;
use rand_core::CryptoRngCore;

use crate::error::AttestError;

/// Upper bound on redraws of a candidate scalar at or above the curve order
/// (about 2^-32 per draw).
const MAX_SCALAR_DRAWS: usize = 8;

/// A single-use ECDSA P-256 key pair.
pub struct EphemeralKey {
    signing_key: SigningKey,
}

impl EphemeralKey {
    /// Generate a fresh key from the operating system's secure random source.
    pub fn generate() -> Result<Self, AttestError> {
        Self::generate_with_rng(&mut rand_core::OsRng)
    }

    /// Generate a fresh key from the given random source.
    ///
    /// Any failure of the source is returned as [`AttestError::Entropy`];
    /// there is no fallback.
    pub fn generate_with_rng(rng: &mut impl CryptoRngCore) -> Result<Self, AttestError> {
        let mut candidate = FieldBytes::default();
        for _ in 0..MAX_SCALAR_DRAWS {
            rng.try_fill_bytes(&mut candidate)?;
            if let Ok(signing_key) = SigningKey::from_bytes(&candidate) {
                tracing::debug!("generated ephemeral P-256 key");
                return Ok(Self { signing_key });
            }
        }
        Err(AttestError::Entropy(rand_core::Error::new(std::io::Error::other(
            "random source kept producing out-of-range scalars",
        ))))
    }

    /// The public half, safe to publish.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl std::fmt::Debug for EphemeralKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKey").field("verifying_key", self.verifying_key()).finish_non_exhaustive()
    }
}
