use crate::{mask::Masked, redact::redact};
use anyhow::{Context, Result};
use std::io::{self, Read};
use tracing::{debug, info};

/// Redact each non-blank line of `input`.
fn redact_lines(input: &str) -> Vec<String> {
    input
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let redacted = redact(line);
            debug!(original = %Masked(line), "raw input");
            info!(redacted = %redacted, changed = redacted != line, "redacted input");
            redacted
        })
        .collect()
}

/// Redact `text`, or stdin when none is given, and print the result.
///
/// # Errors
/// Returns an error if stdin cannot be read.
pub fn execute(text: Option<String>) -> Result<()> {
    let input = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            buffer
        }
    };

    for line in redact_lines(&input) {
        println!("{line}");
    }

    Ok(())
}
