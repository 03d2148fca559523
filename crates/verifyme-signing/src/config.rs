//! Run identity: where and from which commit an artifact was built.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::AttestError;

/// Environment variable holding the CI server's base URL.
pub const ENV_SERVER_URL: &str = "GITHUB_SERVER_URL";
/// Environment variable holding the `owner/name` repository identifier.
pub const ENV_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// Environment variable holding the workflow run identifier.
pub const ENV_RUN_ID: &str = "GITHUB_RUN_ID";
/// Environment variable holding the commit SHA being built.
pub const ENV_COMMIT_SHA: &str = "GITHUB_SHA";

/// Provenance inputs for an envelope.
///
/// Built by the caller and passed in explicitly; nothing in the signing core
/// reads process state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunIdentity {
    /// Scheme and host, e.g. `https://github.com`.
    pub server_url: String,
    /// Repository identifier, e.g. `octo/widgets`.
    pub repository: String,
    /// Workflow run identifier.
    pub run_id: String,
    /// Commit being built.
    pub commit_sha: String,
}

impl RunIdentity {
    /// Read the identity from the CI environment. Unset variables become
    /// empty strings.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the identity from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).unwrap_or_default();
        Self {
            server_url: get(ENV_SERVER_URL),
            repository: get(ENV_REPOSITORY),
            run_id: get(ENV_RUN_ID),
            commit_sha: get(ENV_COMMIT_SHA),
        }
    }

    /// Load the identity from a JSON file.
    pub fn load(path: &Path) -> Result<Self, AttestError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// URL of the run: `<server>/<repo>/actions/runs/<id>`.
    pub fn run_url(&self) -> String {
        format!("{}/{}/actions/runs/{}", self.server_url, self.repository, self.run_id)
    }
}
