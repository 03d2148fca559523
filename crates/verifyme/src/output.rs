//! Pipeline output lines.
//!
//! Every output is written to stdout twice, once as a legacy workflow
//! command and once as `name=value`. When an output file is configured the
//! `name=value` form is appended there as well.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::Context;

/// `::set-output name=<name>::<value>`
pub fn workflow_command(name: &str, value: &str) -> String {
    format!("::set-output name={name}::{value}")
}

/// `<name>=<value>`
pub fn key_value(name: &str, value: &str) -> String {
    format!("{name}={value}")
}

/// Write all outputs to `out` and, if given, append them to `output_file`.
///
/// The output file is opened before anything reaches `out`, so a run that
/// cannot record its outputs prints none of them.
pub fn publish(outputs: &[(&str, &str)], output_file: Option<&Path>, out: &mut impl Write) -> anyhow::Result<()> {
    let mut file = output_file
        .map(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open output file {}", path.display()))
        })
        .transpose()?;

    for (name, value) in outputs {
        writeln!(out, "{}", workflow_command(name, value))?;
        writeln!(out, "{}", key_value(name, value))?;
    }

    if let Some(file) = file.as_mut() {
        for (name, value) in outputs {
            writeln!(file, "{}", key_value(name, value))?;
        }
    }

    Ok(())
}
