//! Signature verification.
//!
//! Verification runs through fixed stages:
//!
//! ```text
//! decode inputs ─► parse public key ─► resolve message ─► digest ─► check ─► Accept | Reject
//! ```
//!
//! A failure in any stage before the check means the bundle is malformed and
//! is returned as an `Err`. The check itself never errors: a well-formed bundle
//! whose signature does not match is `Ok(Verdict::Reject)`.

use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::ecdsa::Signature;
use p256::ecdsa::VerifyingKey;

use crate::codec::decode_public_key;
use crate::digest::digest_message;
use crate::digest::Digest;
use crate::digest::MessageMode;
use crate::envelope::encoded_envelope_digest;
use crate::envelope::Envelope;
use crate::error::AttestError;
use crate::signer::DerSignature;

/// Outcome of checking a well-formed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Verdict {
    Accept,
    Reject,
}

impl Verdict {
    pub fn is_accept(self) -> bool {
        self == Self::Accept
    }

    /// Fold a rejection into [`AttestError::InvalidSignature`] for callers
    /// that only care about success.
    pub fn into_result(self) -> Result<(), AttestError> {
        match self {
            Self::Accept => Ok(()),
            Self::Reject => Err(AttestError::InvalidSignature),
        }
    }
}

/// Outcome of checking a signed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeVerdict {
    /// The signature matched; the decoded envelope is trustworthy.
    Accept(Envelope),
    Reject,
}

/// Checks signatures against one public key.
#[derive(Debug, Clone)]
pub struct Verifier {
    key: VerifyingKey,
}

impl Verifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build a verifier from the published `publickey` output.
    pub fn from_encoded_key(encoded: &str) -> Result<Self, AttestError> {
        Ok(Self::new(decode_public_key(encoded)?))
    }

    pub fn key(&self) -> &VerifyingKey {
        &self.key
    }

    /// The cryptographic check. A signature whose DER does not parse is a
    /// rejection, not a malformed bundle.
    pub fn verify_digest(&self, digest: &Digest, signature: &DerSignature) -> Verdict {
        let Ok(signature) = Signature::from_der(signature.as_bytes()) else {
            tracing::debug!("signature is not valid DER");
            return Verdict::Reject;
        };
        match self.key.verify_prehash(digest.as_bytes(), &signature) {
            Ok(()) => Verdict::Accept,
            Err(_) => Verdict::Reject,
        }
    }

    /// Resolve and digest `message`, then check `signature` over it.
    pub fn verify_message(
        &self,
        signature: &DerSignature,
        message: &str,
        mode: MessageMode,
    ) -> Result<Verdict, AttestError> {
        let (digest, source) = digest_message(message, mode)?;
        tracing::debug!(?source, %digest, "resolved message");
        Ok(self.verify_digest(&digest, signature))
    }

    /// Check an `environment` / `environment_signature` pair and decode the
    /// envelope when it is authentic.
    pub fn verify_envelope(&self, environment: &str, signature: &DerSignature) -> Result<EnvelopeVerdict, AttestError> {
        let environment = environment.trim();
        match self.verify_digest(&encoded_envelope_digest(environment), signature) {
            Verdict::Accept => Ok(EnvelopeVerdict::Accept(Envelope::decode(environment)?)),
            Verdict::Reject => Ok(EnvelopeVerdict::Reject),
        }
    }
}

/// Verify a published signature, public key, and message end to end.
///
/// `Err` means the inputs were malformed ([`AttestError::Decode`],
/// [`AttestError::KeyFormat`], or [`AttestError::Io`]); otherwise the verdict
/// says whether the signature matched.
pub fn verify(signature: &str, public_key: &str, message: &str, mode: MessageMode) -> Result<Verdict, AttestError> {
    let signature = DerSignature::from_base64(signature)?;
    let verifier = Verifier::from_encoded_key(public_key)?;
    let verdict = verifier.verify_message(&signature, message, mode)?;
    tracing::debug!(?verdict, "verification finished");
    Ok(verdict)
}
