//! Error types for attestation signing and verification.

/// Errors from key generation, signing, and verification.
///
/// On the verification side the variants fall into two classes: malformed
/// input (see [`AttestError::is_malformed_input`]) aborts, while
/// [`AttestError::InvalidSignature`] is the controlled negative result.
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    /// The secure random source could not supply bytes.
    #[error("entropy source unavailable: {0}")]
    Entropy(#[from] rand_core::Error),

    /// The signing primitive rejected its input.
    #[error("signing failed: {0}")]
    Crypto(p256::ecdsa::Error),

    /// The run's own public key could not be written as SPKI PEM.
    #[error("public key encoding failed: {0}")]
    Encode(p256::pkcs8::spki::Error),

    /// A base64 argument could not be decoded.
    #[error("invalid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The public key text is not a P-256 SPKI `PUBLIC KEY` PEM block.
    #[error("invalid public key: {0}")]
    KeyFormat(#[from] KeyFormatError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inputs were well-formed but the signature does not match.
    #[error("invalid signature")]
    InvalidSignature,
}

impl AttestError {
    /// Whether this error means the bundle itself is garbage, as opposed to a
    /// well-formed bundle that failed the cryptographic check.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::KeyFormat(_) | Self::Io(_) | Self::Json(_))
    }
}

/// Reasons a public key container is rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyFormatError {
    /// The decoded key bytes are not UTF-8 text.
    #[error("PEM text is not valid UTF-8")]
    NotUtf8,

    /// No `-----BEGIN ...-----` line was found.
    #[error("no PEM block found")]
    MissingPemBlock,

    /// The PEM block is some other kind of object.
    #[error("unsupported public key type: {0}")]
    UnexpectedBlockType(String),

    /// The SPKI names an algorithm or curve other than ECDSA P-256.
    #[error("unsupported public key algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The container or the curve point could not be parsed.
    #[error("malformed public key: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_input_classification() {
        assert!(AttestError::KeyFormat(KeyFormatError::MissingPemBlock).is_malformed_input());
        assert!(AttestError::Io(std::io::Error::other("boom")).is_malformed_input());
        assert!(!AttestError::InvalidSignature.is_malformed_input());
    }

    #[test]
    fn key_encoding_failure_is_not_malformed_input() {
        let err = AttestError::Encode(p256::pkcs8::spki::Error::KeyMalformed);
        assert!(!err.is_malformed_input());
        assert!(err.to_string().starts_with("public key encoding failed"));
    }

    #[test]
    fn key_format_messages_name_the_block_type() {
        let err = AttestError::from(KeyFormatError::UnexpectedBlockType("CERTIFICATE".into()));
        assert_eq!(err.to_string(), "invalid public key: unsupported public key type: CERTIFICATE");
    }
}
