//! `verifyme`: sign a build artifact with a single-use key, or verify a
//! published signature bundle.
//!
//! Exit codes: `0` success or valid signature, `1` well-formed but invalid
//! signature (or an envelope naming another artifact), `2` malformed input or
//! a failed signing run.

mod output;
mod sign;
mod verify;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Exit code for malformed input and failed signing runs.
const EXIT_ABORT: u8 = 2;

/// Ephemeral-key artifact attestation.
#[derive(Parser, Debug)]
#[command(name = "verifyme", version, about, long_about = None)]
struct Cli {
    /// Log filter for stderr (trace, debug, info, warn, error, or an EnvFilter directive).
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a single-use key, sign an artifact, and print the outputs.
    Sign {
        /// Artifact to sign.
        path: PathBuf,
        /// Also sign a provenance envelope describing this run.
        #[arg(long)]
        envelope: bool,
        /// JSON file with the run identity; defaults to the GITHUB_* environment.
        #[arg(long, requires = "envelope")]
        run_config: Option<PathBuf>,
        /// File to append `name=value` output lines to.
        #[arg(long, env = "GITHUB_OUTPUT")]
        github_output: Option<PathBuf>,
    },

    /// Verify a signature over a message (a file path or a literal string).
    Verify {
        /// Signature, base64 DER.
        signature: String,
        /// Public key, base64 of the PEM text.
        public_key: String,
        /// File path or literal message.
        message: String,
        /// Treat the message strictly as a file path.
        #[arg(long, conflicts_with = "literal")]
        file: bool,
        /// Treat the message strictly as literal bytes.
        #[arg(long)]
        literal: bool,
    },

    /// Verify an `environment` envelope and print its fields.
    VerifyEnvelope {
        /// The `environment_signature` output.
        signature: String,
        /// Public key, base64 of the PEM text.
        public_key: String,
        /// The `environment` output.
        environment: String,
        /// Artifact whose digest must match the envelope's ArtifactSha.
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Command::Sign {
            path,
            envelope,
            run_config,
            github_output,
        } => sign::run(&path, envelope, run_config.as_deref(), github_output.as_deref()).map(|()| 0),
        Command::Verify {
            signature,
            public_key,
            message,
            file,
            literal,
        } => verify::run(&signature, &public_key, &message, verify::message_mode(file, literal))
            .map(|verdict| verify::report(verdict.into())),
        Command::VerifyEnvelope {
            signature,
            public_key,
            environment,
            artifact,
        } => verify::run_envelope(&signature, &public_key, &environment, artifact.as_deref()).map(verify::report),
    };

    ExitCode::from(exit_status(result))
}

/// Collapse a command result into the process exit status.
fn exit_status(result: anyhow::Result<u8>) -> u8 {
    result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        EXIT_ABORT
    })
}
