//! Randomized ECDSA P-256 signing of digests.

use base64::Engine;
use p256::ecdsa::signature::hazmat::RandomizedPrehashSigner;
use p256::ecdsa::Signature;
use rand_core::CryptoRng;
use rand_core::CryptoRngCore;
use rand_core::RngCore;

use crate::digest::Digest;
use crate::error::AttestError;
use crate::keys::EphemeralKey;

/// An ASN.1 DER-encoded ECDSA signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerSignature(Vec<u8>);

impl DerSignature {
    /// Wrap signature bytes without validating them; parsing happens at
    /// verification time.
    pub fn from_der_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Decode the base64 form published by the signer.
    pub fn from_base64(encoded: &str) -> Result<Self, AttestError> {
        Ok(Self(base64::engine::general_purpose::STANDARD.decode(encoded.trim())?))
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Sign a digest with fresh randomness from the operating system.
pub fn sign_digest(digest: &Digest, key: &EphemeralKey) -> Result<DerSignature, AttestError> {
    sign_digest_with_rng(digest, key, &mut rand_core::OsRng)
}

/// Sign a digest, drawing the per-signature randomness from `rng`.
///
/// The nonce is derived per RFC 6979 from the key and digest, mixed with 32
/// bytes drawn from `rng`, so repeated signatures over one digest differ.
/// Only the digest is signed; it is never hashed again.
pub fn sign_digest_with_rng(
    digest: &Digest,
    key: &EphemeralKey,
    rng: &mut impl CryptoRngCore,
) -> Result<DerSignature, AttestError> {
    let mut hedge = HedgeEntropy::draw(rng)?;
    let signature: Signature =
        key.signing_key().sign_prehash_with_rng(&mut hedge, digest.as_bytes()).map_err(AttestError::Crypto)?;
    Ok(DerSignature(signature.to_der().as_bytes().to_vec()))
}

/// Additional signing entropy drawn fallibly up front.
///
/// The curve library reads its hedging bytes infallibly, so the draw from
/// the real source happens here where a failure can still be reported.
struct HedgeEntropy {
    bytes: [u8; 32],
    read: usize,
}

impl HedgeEntropy {
    fn draw(rng: &mut impl CryptoRngCore) -> Result<Self, AttestError> {
        let mut bytes = [0u8; 32];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self { bytes, read: 0 })
    }
}

impl RngCore for HedgeEntropy {
    fn next_u32(&mut self) -> u32 {
        rand_core::impls::next_u32_via_fill(self)
    }

    fn next_u64(&mut self) -> u64 {
        rand_core::impls::next_u64_via_fill(self)
    }

    // Past the drawn block this yields zeros; RFC 6979 nonces stay
    // deterministic-safe for any additional input.
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest.iter_mut() {
            *byte = self.bytes.get(self.read).copied().unwrap_or(0);
            self.read = self.read.saturating_add(1);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for HedgeEntropy {}

#[cfg(test)]
mod tests {
    use p256::ecdsa::signature::hazmat::PrehashVerifier;

    use super::*;
    use crate::keys::tests::DeadRng;

    #[test]
    fn signature_is_der_and_verifies() {
        let key = EphemeralKey::generate().unwrap();
        let digest = Digest::of_bytes(b"artifact");
        let sig = sign_digest(&digest, &key).unwrap();

        let parsed = Signature::from_der(sig.as_bytes()).unwrap();
        assert!(key.verifying_key().verify_prehash(digest.as_bytes(), &parsed).is_ok());
    }

    #[test]
    fn signing_is_randomized() {
        let key = EphemeralKey::generate().unwrap();
        let digest = Digest::of_bytes(b"same digest twice");
        let first = sign_digest(&digest, &key).unwrap();
        let second = sign_digest(&digest, &key).unwrap();

        assert_ne!(first, second);
        for sig in [&first, &second] {
            let parsed = Signature::from_der(sig.as_bytes()).unwrap();
            assert!(key.verifying_key().verify_prehash(digest.as_bytes(), &parsed).is_ok());
        }
    }

    #[test]
    fn dead_entropy_source_fails_signing() {
        let key = EphemeralKey::generate().unwrap();
        let err = sign_digest_with_rng(&Digest::of_bytes(b"x"), &key, &mut DeadRng).unwrap_err();
        assert!(matches!(err, AttestError::Entropy(_)));
    }

    #[test]
    fn base64_roundtrip_preserves_bytes() {
        let key = EphemeralKey::generate().unwrap();
        let sig = sign_digest(&Digest::of_bytes(b"y"), &key).unwrap();
        assert_eq!(DerSignature::from_base64(&sig.to_base64()).unwrap(), sig);
    }

    #[test]
    fn hedge_entropy_pads_with_zeros() {
        let mut hedge = HedgeEntropy { bytes: [7; 32], read: 0 };
        let mut out = [1u8; 40];
        hedge.fill_bytes(&mut out);
        assert!(out[..32].iter().all(|&b| b == 7));
        assert!(out[32..].iter().all(|&b| b == 0));
    }
}
