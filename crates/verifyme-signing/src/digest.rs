//! SHA-256 digests of artifacts and messages.

use std::fs::File;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;

use sha2::Digest as _;
use sha2::Sha256;

use crate::error::AttestError;

/// Size of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 digest of exactly one byte sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Digest of an in-memory byte string.
    pub fn of_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(bytes.as_ref()).into())
    }

    /// Digest of everything readable from `reader`, streamed through a
    /// fixed-size buffer.
    pub fn of_reader(mut reader: impl Read) -> Result<Self, AttestError> {
        let mut hasher = Sha256::new();
        std::io::copy(&mut reader, &mut hasher)?;
        Ok(Self(hasher.finalize().into()))
    }

    /// Digest of a file's contents.
    pub fn of_file(path: &Path) -> Result<Self, AttestError> {
        Self::of_reader(File::open(path)?)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex, as embedded in envelopes and pipeline output.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// How a message argument is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageMode {
    /// A file if the argument opens as one, otherwise the literal bytes.
    ///
    /// A literal that happens to name a file on disk is silently hashed as
    /// that file. Use [`MessageMode::Path`] or [`MessageMode::Literal`] when
    /// the caller knows which it means.
    #[default]
    Auto,
    /// Always a file path; failure to open is an error.
    Path,
    /// Always the literal bytes of the argument.
    Literal,
}

/// What a message argument resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageSource<'a> {
    File(&'a Path),
    Literal(&'a [u8]),
}

/// Resolve `arg` under `mode` and digest the result.
///
/// In [`MessageMode::Auto`] an argument that cannot be opened is taken
/// literally; an argument that opens but then fails to read (a directory,
/// say) is an [`AttestError::Io`].
pub fn digest_message(arg: &str, mode: MessageMode) -> Result<(Digest, MessageSource<'_>), AttestError> {
    let path = Path::new(arg);
    match mode {
        MessageMode::Literal => Ok((Digest::of_bytes(arg), MessageSource::Literal(arg.as_bytes()))),
        MessageMode::Path => Ok((Digest::of_file(path)?, MessageSource::File(path))),
        MessageMode::Auto => match File::open(path) {
            Ok(file) => {
                tracing::warn!(argument = arg, "message argument names a file; hashing its contents");
                Ok((Digest::of_reader(file)?, MessageSource::File(path)))
            }
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    tracing::debug!("message argument is not a file; hashing it literally");
                } else {
                    tracing::warn!(
                        argument = arg,
                        error = %e,
                        "message argument exists but cannot be opened; hashing it literally"
                    );
                }
                Ok((Digest::of_bytes(arg), MessageSource::Literal(arg.as_bytes())))
            }
        },
    }
}
