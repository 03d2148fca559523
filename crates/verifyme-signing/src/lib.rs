//! Ephemeral-key attestation of build artifacts.
//!
//! Each signing run generates a fresh ECDSA P-256 key, signs `SHA-256(artifact)`
//! with it, and optionally signs a provenance [`Envelope`] with the same key.
//! The key is never stored; a verifier needs only the published public key,
//! signature, and message.
//!
//! # Signing
//!
//! ```
//! use verifyme_signing::{verify, Attestor, MessageMode, Verdict};
//!
//! let attestor = Attestor::generate()?;
//! let att = attestor.attest_bytes(b"release tarball")?;
//!
//! let verdict = verify(&att.signature, &att.publickey, "release tarball", MessageMode::Literal)?;
//! assert_eq!(verdict, Verdict::Accept);
//! # Ok::<(), verifyme_signing::AttestError>(())
//! ```
//!
//! # Verification outcomes
//!
//! [`verify`] returns `Err` when the bundle is malformed (bad base64, a key
//! that is not a P-256 `PUBLIC KEY` block, an unreadable message file) and
//! `Ok(Verdict::Reject)` when a well-formed signature does not match.

pub mod attestation;
pub mod codec;
pub mod config;
pub mod digest;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod signer;
pub mod verifier;

pub use attestation::Attestation;
pub use attestation::Attestor;
pub use attestation::Provenance;
pub use config::RunIdentity;
pub use digest::Digest;
pub use digest::MessageMode;
pub use envelope::Envelope;
pub use error::AttestError;
pub use error::KeyFormatError;
pub use keys::EphemeralKey;
pub use signer::DerSignature;
pub use verifier::verify;
pub use verifier::EnvelopeVerdict;
pub use verifier::Verdict;
pub use verifier::Verifier;
