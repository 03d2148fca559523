//! Single-line textual form of a public key.
//!
//! `base64(PEM(SPKI(point)))`: the PEM frame keeps the key recognizable to
//! standard tooling, and the outer base64 turns its multi-line text into one
//! line for a line-oriented pipeline log.

use base64::Engine;
use p256::ecdsa::VerifyingKey;
use p256::pkcs8::spki;
use p256::pkcs8::DecodePublicKey;
use p256::pkcs8::EncodePublicKey;
use p256::pkcs8::LineEnding;

use crate::error::AttestError;
use crate::error::KeyFormatError;

/// PEM label of an SPKI public key block.
pub const PUBLIC_KEY_PEM_LABEL: &str = "PUBLIC KEY";

/// Encode a public key as `base64(PEM(SPKI))` on a single line.
pub fn encode_public_key(key: &VerifyingKey) -> Result<String, AttestError> {
    let pem = key.to_public_key_pem(LineEnding::LF).map_err(AttestError::Encode)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(pem.as_bytes()))
}

/// Decode a key produced by [`encode_public_key`].
///
/// Malformed base64 is a [`AttestError::Decode`]; everything wrong with what
/// the base64 contained is a [`AttestError::KeyFormat`].
pub fn decode_public_key(encoded: &str) -> Result<VerifyingKey, AttestError> {
    let pem_bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
    let pem = std::str::from_utf8(&pem_bytes).map_err(|_| KeyFormatError::NotUtf8)?;
    Ok(parse_public_key_pem(pem)?)
}

/// Parse a P-256 SPKI `PUBLIC KEY` PEM block.
pub fn parse_public_key_pem(pem: &str) -> Result<VerifyingKey, KeyFormatError> {
    let label = pem_label(pem).ok_or(KeyFormatError::MissingPemBlock)?;
    if label != PUBLIC_KEY_PEM_LABEL {
        return Err(KeyFormatError::UnexpectedBlockType(label.to_string()));
    }

    VerifyingKey::from_public_key_pem(pem.trim()).map_err(|e| match e {
        spki::Error::OidUnknown { oid } => KeyFormatError::UnsupportedAlgorithm(oid.to_string()),
        spki::Error::AlgorithmParametersMissing => {
            KeyFormatError::UnsupportedAlgorithm("missing curve parameters".to_string())
        }
        other => KeyFormatError::Malformed(other.to_string()),
    })
}

/// Label of the first `-----BEGIN <label>-----` line, if any.
fn pem_label(pem: &str) -> Option<&str> {
    pem.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("-----BEGIN ")?.strip_suffix("-----"))
}
