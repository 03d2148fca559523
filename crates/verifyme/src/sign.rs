//! `verifyme sign`: attest one artifact with a fresh key.

use std::path::Path;

use anyhow::Context;
use verifyme_signing::Attestor;
use verifyme_signing::Digest;
use verifyme_signing::Provenance;
use verifyme_signing::RunIdentity;

use crate::output;

pub fn run(path: &Path, envelope: bool, run_config: Option<&Path>, github_output: Option<&Path>) -> anyhow::Result<()> {
    tracing::info!(artifact = %path.display(), "starting signer");

    let mut attestor = Attestor::generate().context("failed to generate signing key")?;
    if envelope {
        attestor = attestor.with_provenance(provenance(run_config)?);
    }

    // Nothing is printed until every output exists.
    let attestation =
        attestor.attest_file(path).with_context(|| format!("failed to sign {}", path.display()))?;

    output::publish(&attestation.outputs(), github_output, &mut std::io::stdout().lock())
}

fn provenance(run_config: Option<&Path>) -> anyhow::Result<Provenance> {
    let identity = match run_config {
        Some(path) => RunIdentity::load(path).with_context(|| format!("failed to load {}", path.display()))?,
        None => RunIdentity::from_env(),
    };
    let verifier_sha = self_digest()?;
    tracing::info!(self_hash = %verifier_sha, run_url = %identity.run_url(), "building provenance envelope");

    Ok(Provenance {
        identity,
        verifier_sha,
    })
}

/// Hex SHA-256 of the running executable.
fn self_digest() -> anyhow::Result<String> {
    let exe = std::env::current_exe().context("failed to locate own executable")?;
    let digest = Digest::of_file(&exe).with_context(|| format!("failed to hash {}", exe.display()))?;
    Ok(digest.to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_digest_is_hex_sha256() {
        let digest = self_digest().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn provenance_from_run_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{"server_url":"https://ci.example","repository":"a/b","run_id":"5","commit_sha":"c0ffee"}"#,
        )
        .unwrap();

        let provenance = provenance(Some(&path)).unwrap();
        assert_eq!(provenance.identity.run_url(), "https://ci.example/a/b/actions/runs/5");
        assert_eq!(provenance.identity.commit_sha, "c0ffee");
    }

    #[test]
    fn missing_artifact_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output_file = dir.path().join("out");
        let err = run(&dir.path().join("missing.bin"), false, None, Some(&output_file)).unwrap_err();

        assert!(format!("{err:#}").contains("failed to sign"));
        assert!(!output_file.exists());
    }

    #[test]
    fn signing_appends_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("artifact.bin");
        std::fs::write(&artifact, b"bits").unwrap();
        let output_file = dir.path().join("out");

        run(&artifact, false, None, Some(&output_file)).unwrap();

        let written = std::fs::read_to_string(&output_file).unwrap();
        let names: Vec<_> = written.lines().filter_map(|l| l.split_once('=')).map(|(k, _)| k).collect();
        assert_eq!(names, ["publickey", "signature", "sha256"]);
        assert!(written.contains(&format!("sha256={}", Digest::of_bytes(b"bits"))));
    }
}
