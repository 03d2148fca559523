//! `verifyme verify` and `verifyme verify-envelope`.

use std::path::Path;

use anyhow::Context;
use verifyme_signing::verify;
use verifyme_signing::DerSignature;
use verifyme_signing::Digest;
use verifyme_signing::EnvelopeVerdict;
use verifyme_signing::MessageMode;
use verifyme_signing::Verdict;
use verifyme_signing::Verifier;

/// Exit code for a well-formed bundle that fails verification.
pub const EXIT_REJECT: u8 = 1;

/// Result of a verify command whose inputs were well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Valid,
    InvalidSignature,
    /// The envelope signature is valid but names a different artifact.
    ArtifactMismatch { expected: String, actual: String },
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accept => Self::Valid,
            Verdict::Reject => Self::InvalidSignature,
        }
    }
}

pub fn message_mode(file: bool, literal: bool) -> MessageMode {
    match (file, literal) {
        (true, _) => MessageMode::Path,
        (_, true) => MessageMode::Literal,
        _ => MessageMode::Auto,
    }
}

/// Malformed input is an `Err`; a signature that does not match is `Ok(Verdict::Reject)`.
pub fn run(signature: &str, public_key: &str, message: &str, mode: MessageMode) -> anyhow::Result<Verdict> {
    verify(signature, public_key, message, mode).context("unable to verify malformed bundle")
}

pub fn run_envelope(
    signature: &str,
    public_key: &str,
    environment: &str,
    artifact: Option<&Path>,
) -> anyhow::Result<Outcome> {
    let signature = DerSignature::from_base64(signature).context("environment signature is not base64")?;
    let verifier = Verifier::from_encoded_key(public_key).context("unable to parse public key")?;

    let envelope = match verifier.verify_envelope(environment, &signature).context("unable to decode envelope")? {
        EnvelopeVerdict::Accept(envelope) => envelope,
        EnvelopeVerdict::Reject => return Ok(Outcome::InvalidSignature),
    };

    println!("RunUrl:      {}", envelope.run_url);
    println!("GitHubSha:   {}", envelope.commit_sha);
    println!("ArtifactSha: {}", envelope.artifact_sha);
    println!("VerifierSha: {}", envelope.verifier_sha);

    if let Some(path) = artifact {
        let digest = Digest::of_file(path).with_context(|| format!("failed to hash {}", path.display()))?;
        if digest.to_hex() != envelope.artifact_sha {
            return Ok(Outcome::ArtifactMismatch {
                expected: envelope.artifact_sha,
                actual: digest.to_hex(),
            });
        }
    }

    Ok(Outcome::Valid)
}

/// Print the outcome and return its exit code.
pub fn report(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Valid => {
            println!("valid signature");
            0
        }
        Outcome::InvalidSignature => {
            eprintln!("invalid signature");
            EXIT_REJECT
        }
        Outcome::ArtifactMismatch { expected, actual } => {
            eprintln!("artifact digest {actual} does not match envelope ArtifactSha {expected}");
            EXIT_REJECT
        }
    }
}

#[cfg(test)]
mod tests {
    use verifyme_signing::Attestor;
    use verifyme_signing::Provenance;

    use super::*;

    #[test]
    fn mode_flags() {
        assert_eq!(message_mode(false, false), MessageMode::Auto);
        assert_eq!(message_mode(true, false), MessageMode::Path);
        assert_eq!(message_mode(false, true), MessageMode::Literal);
    }

    #[test]
    fn valid_invalid_and_malformed_are_distinct() {
        let att = Attestor::generate().unwrap().attest_bytes(b"payload").unwrap();

        let valid = run(&att.signature, &att.publickey, "payload", MessageMode::Literal).unwrap();
        assert_eq!(valid, Verdict::Accept);

        let invalid = run(&att.signature, &att.publickey, "payloaD", MessageMode::Literal).unwrap();
        assert_eq!(invalid, Verdict::Reject);

        assert!(run("%%%", &att.publickey, "payload", MessageMode::Literal).is_err());
    }

    #[test]
    fn envelope_artifact_check() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"bits").unwrap();
        let other = dir.path().join("other.bin");
        std::fs::write(&other, b"other bits").unwrap();

        let att = Attestor::generate()
            .unwrap()
            .with_provenance(Provenance::default())
            .attest_file(&artifact)
            .unwrap();
        let env = att.environment.as_deref().unwrap();
        let env_sig = att.environment_signature.as_deref().unwrap();

        let outcome = run_envelope(env_sig, &att.publickey, env, Some(&artifact)).unwrap();
        assert_eq!(outcome, Outcome::Valid);

        let outcome = run_envelope(env_sig, &att.publickey, env, Some(&other)).unwrap();
        assert_eq!(
            outcome,
            Outcome::ArtifactMismatch {
                expected: Digest::of_bytes(b"bits").to_hex(),
                actual: Digest::of_bytes(b"other bits").to_hex(),
            }
        );

        let outcome = run_envelope(&att.signature, &att.publickey, env, None).unwrap();
        assert_eq!(outcome, Outcome::InvalidSignature);
    }

    #[test]
    fn report_exit_codes() {
        assert_eq!(report(Outcome::Valid), 0);
        assert_eq!(report(Outcome::InvalidSignature), EXIT_REJECT);
        let mismatch = Outcome::ArtifactMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(report(mismatch), EXIT_REJECT);
    }

    #[test]
    fn verdicts_map_to_outcomes() {
        assert_eq!(Outcome::from(Verdict::Accept), Outcome::Valid);
        assert_eq!(Outcome::from(Verdict::Reject), Outcome::InvalidSignature);
    }
}
