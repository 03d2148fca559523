//! Signed provenance envelope.
//!
//! The envelope binds a run's identity to the artifact digest. It is
//! serialized as compact JSON with a fixed field order, base64-encoded, and
//! the base64 text is what gets hashed and signed:
//!
//! ```text
//! {"RunUrl":"…","GitHubSha":"…","ArtifactSha":"<hex>","VerifierSha":"<hex>"}
//!   ──base64──► environment ──SHA-256──► digest ──ECDSA──► environment_signature
//! ```

use base64::Engine;
use serde::Deserialize;
use serde::Serialize;

use crate::config::RunIdentity;
use crate::digest::Digest;
use crate::error::AttestError;
use crate::keys::EphemeralKey;
use crate::signer::sign_digest;
use crate::signer::DerSignature;

/// Provenance record for one signing run. Field order is the wire order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    /// `<server>/<repo>/actions/runs/<id>`.
    #[serde(rename = "RunUrl")]
    pub run_url: String,
    /// Commit the artifact was built from.
    #[serde(rename = "GitHubSha")]
    pub commit_sha: String,
    /// Hex SHA-256 of the artifact.
    #[serde(rename = "ArtifactSha")]
    pub artifact_sha: String,
    /// Hex SHA-256 of the binary that produced this envelope.
    #[serde(rename = "VerifierSha")]
    pub verifier_sha: String,
}

impl Envelope {
    /// Envelope for `artifact` built during the run described by `identity`.
    pub fn for_run(identity: &RunIdentity, artifact: &Digest, verifier_sha: &str) -> Self {
        EnvelopeBuilder::default()
            .run_url(identity.run_url())
            .commit_sha(&identity.commit_sha)
            .artifact_digest(artifact)
            .verifier_sha(verifier_sha)
            .build()
    }

    /// Compact JSON in field-declaration order.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, AttestError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// The single-line `environment` output: base64 of the canonical JSON.
    pub fn encode(&self) -> Result<String, AttestError> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_canonical_json()?))
    }

    /// Parse an `environment` output back into an envelope.
    pub fn decode(encoded: &str) -> Result<Self, AttestError> {
        let json = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Encode the envelope and sign it with the run's key.
    pub fn sign(&self, key: &EphemeralKey) -> Result<SignedEnvelope, AttestError> {
        let environment = self.encode()?;
        let signature = sign_digest(&encoded_envelope_digest(&environment), key)?;
        tracing::debug!(run_url = %self.run_url, "signed provenance envelope");
        Ok(SignedEnvelope { environment, signature })
    }
}

/// Digest that the envelope signature covers: SHA-256 of the base64 text.
pub fn encoded_envelope_digest(environment: &str) -> Digest {
    Digest::of_bytes(environment.as_bytes())
}

/// An encoded envelope and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    /// base64(JSON(envelope)).
    pub environment: String,
    pub signature: DerSignature,
}

/// Field-by-field envelope construction. Setter order has no effect on the
/// result; unset fields are empty strings.
#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    envelope: Envelope,
}

impl EnvelopeBuilder {
    pub fn run_url(mut self, run_url: impl Into<String>) -> Self {
        self.envelope.run_url = run_url.into();
        self
    }

    pub fn commit_sha(mut self, commit_sha: impl Into<String>) -> Self {
        self.envelope.commit_sha = commit_sha.into();
        self
    }

    pub fn artifact_digest(mut self, digest: &Digest) -> Self {
        self.envelope.artifact_sha = digest.to_hex();
        self
    }

    pub fn verifier_sha(mut self, verifier_sha: impl Into<String>) -> Self {
        self.envelope.verifier_sha = verifier_sha.into();
        self
    }

    pub fn build(self) -> Envelope {
        self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> RunIdentity {
        RunIdentity {
            server_url: "https://github.com".into(),
            repository: "octo/widgets".into(),
            run_id: "99".into(),
            commit_sha: "deadbeef".into(),
        }
    }

    #[test]
    fn json_has_fixed_field_order_and_no_whitespace() {
        let env = Envelope::for_run(&identity(), &Digest::of_bytes(b""), "cafe");
        let json = String::from_utf8(env.to_canonical_json().unwrap()).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"RunUrl":"https://github.com/octo/widgets/actions/runs/99","#,
                r#""GitHubSha":"deadbeef","#,
                r#""ArtifactSha":"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855","#,
                r#""VerifierSha":"cafe"}"#
            )
        );
    }

    #[test]
    fn construction_order_does_not_change_bytes() {
        let digest = Digest::of_bytes(b"artifact");
        let forward = EnvelopeBuilder::default()
            .run_url("u")
            .commit_sha("c")
            .artifact_digest(&digest)
            .verifier_sha("v")
            .build();
        let backward = EnvelopeBuilder::default()
            .verifier_sha("v")
            .artifact_digest(&digest)
            .commit_sha("c")
            .run_url("u")
            .build();

        assert_eq!(forward.to_canonical_json().unwrap(), backward.to_canonical_json().unwrap());
        assert_eq!(
            encoded_envelope_digest(&forward.encode().unwrap()),
            encoded_envelope_digest(&backward.encode().unwrap())
        );
    }

    #[test]
    fn encode_decode_preserves_fields() {
        let env = Envelope::for_run(&identity(), &Digest::of_bytes(b"a"), "b");
        let encoded = env.encode().unwrap();
        assert!(!encoded.contains('\n'));
        assert_eq!(Envelope::decode(&encoded).unwrap(), env);
    }

    #[test]
    fn decode_rejects_non_json() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("not json");
        assert!(matches!(Envelope::decode(&encoded).unwrap_err(), AttestError::Json(_)));
    }

    #[test]
    fn signature_covers_the_base64_text() {
        use p256::ecdsa::signature::hazmat::PrehashVerifier;
        use p256::ecdsa::Signature;

        let key = EphemeralKey::generate().unwrap();
        let signed = Envelope::for_run(&identity(), &Digest::of_bytes(b"a"), "b").sign(&key).unwrap();

        let sig = Signature::from_der(signed.signature.as_bytes()).unwrap();
        let over_text = Digest::of_bytes(signed.environment.as_bytes());
        assert!(key.verifying_key().verify_prehash(over_text.as_bytes(), &sig).is_ok());
    }
}
