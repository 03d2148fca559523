//! Artifact attestation: one ephemeral key signs an artifact digest and,
//! optionally, a provenance envelope.

use std::path::Path;

use p256::ecdsa::VerifyingKey;
use serde::Deserialize;
use serde::Serialize;

use crate::codec::encode_public_key;
use crate::config::RunIdentity;
use crate::digest::Digest;
use crate::envelope::Envelope;
use crate::error::AttestError;
use crate::keys::EphemeralKey;
use crate::signer::sign_digest;

/// Everything a verifier needs, in published form.
///
/// All binary values are base64 except `sha256`, which is hex.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attestation {
    /// base64(PEM(SPKI(public key))).
    pub publickey: String,
    /// base64(DER(ECDSA(SHA-256(artifact)))).
    pub signature: String,
    /// hex(SHA-256(artifact)).
    pub sha256: String,
    /// base64(JSON(envelope)), when provenance was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// base64(DER(ECDSA(SHA-256(environment)))).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_signature: Option<String>,
}

impl Attestation {
    /// Named outputs in publication order.
    pub fn outputs(&self) -> Vec<(&'static str, &str)> {
        let mut outputs = vec![
            ("publickey", self.publickey.as_str()),
            ("signature", self.signature.as_str()),
            ("sha256", self.sha256.as_str()),
        ];
        if let (Some(environment), Some(environment_signature)) = (&self.environment, &self.environment_signature) {
            outputs.push(("environment", environment));
            outputs.push(("environment_signature", environment_signature));
        }
        outputs
    }
}

/// Inputs for the provenance envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provenance {
    pub identity: RunIdentity,
    /// Hex SHA-256 of the binary doing the signing, computed by the caller.
    pub verifier_sha: String,
}

/// Signs artifacts for one run.
///
/// Owns the run's only key; every signature it produces is bound to that
/// key, and the key is dropped with the attestor.
#[derive(Debug)]
pub struct Attestor {
    key: EphemeralKey,
    provenance: Option<Provenance>,
}

impl Attestor {
    /// Create an attestor with a freshly generated key.
    pub fn generate() -> Result<Self, AttestError> {
        Ok(Self::with_key(EphemeralKey::generate()?))
    }

    pub fn with_key(key: EphemeralKey) -> Self {
        Self { key, provenance: None }
    }

    /// Also produce a signed envelope for each attestation.
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    pub fn public_key(&self) -> &VerifyingKey {
        self.key.verifying_key()
    }

    /// Attest the contents of a file, streamed.
    pub fn attest_file(&self, path: &Path) -> Result<Attestation, AttestError> {
        let digest = Digest::of_file(path)?;
        tracing::info!(path = %path.display(), sha256 = %digest, "attesting artifact");
        self.attest_digest(&digest)
    }

    /// Attest an in-memory artifact.
    pub fn attest_bytes(&self, artifact: &[u8]) -> Result<Attestation, AttestError> {
        self.attest_digest(&Digest::of_bytes(artifact))
    }

    /// Attest an artifact by its digest. Either every output is produced or
    /// an error is returned.
    pub fn attest_digest(&self, digest: &Digest) -> Result<Attestation, AttestError> {
        let publickey = encode_public_key(self.key.verifying_key())?;
        let signature = sign_digest(digest, &self.key)?;

        let signed_envelope = match &self.provenance {
            Some(provenance) => {
                let envelope = Envelope::for_run(&provenance.identity, digest, &provenance.verifier_sha);
                Some(envelope.sign(&self.key)?)
            }
            None => None,
        };
        let (environment, environment_signature) = match signed_envelope {
            Some(signed) => (Some(signed.environment), Some(signed.signature.to_base64())),
            None => (None, None),
        };

        Ok(Attestation {
            publickey,
            signature: signature.to_base64(),
            sha256: digest.to_hex(),
            environment,
            environment_signature,
        })
    }
}
