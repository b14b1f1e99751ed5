// UI layer: dispatches the parsed command line to the client and prints
// the result. Output goes to any `Write` so the flows can be checked in
// tests without capturing stdout.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;
use tracing::info;

use crate::api::{ForensicsClient, Transport};
use crate::cli::{Action, Cli};
use crate::envelope::Envelope;

/// Run the action selected on the command line. A missing `--image` or
/// `--images` prints an error and returns without touching the client.
pub fn run<T: Transport, W: Write>(api: &ForensicsClient<T>, cli: &Cli, out: &mut W) -> Result<()> {
    let envelope = match cli.action {
        Action::Health => with_spinner("Checking API health...".into(), || api.check_health()),
        Action::Metadata => {
            let Some(image) = &cli.image else {
                writeln!(out, "Error: extracting metadata requires the --image argument")?;
                return Ok(());
            };
            with_spinner(format!("Extracting metadata from {}...", image.display()), || {
                api.extract_metadata(image)
            })
        }
        Action::Batch => {
            let images = match &cli.images {
                Some(images) if !images.is_empty() => images,
                _ => {
                    writeln!(out, "Error: batch metadata extraction requires the --images argument")?;
                    return Ok(());
                }
            };
            with_spinner(
                format!("Extracting metadata from {} images...", images.len()),
                || api.batch_extract_metadata(images.as_slice()),
            )
        }
        Action::Forensics => {
            let Some(image) = &cli.image else {
                writeln!(out, "Error: forensics analysis requires the --image argument")?;
                return Ok(());
            };
            with_spinner(format!("Running forensics analysis on {}...", image.display()), || {
                api.analyze_forensics(image)
            })
        }
    };

    print_envelope(&envelope, cli.compact, out)?;
    if cli.action == Action::Forensics {
        print_verdict(&envelope, out)?;
    }
    Ok(())
}

/// Print the envelope as JSON. Non-ASCII text is written as-is.
pub fn print_envelope<W: Write>(envelope: &Envelope, compact: bool, out: &mut W) -> Result<()> {
    let text = if compact {
        serde_json::to_string(envelope.as_value())?
    } else {
        serde_json::to_string_pretty(envelope.as_value())?
    };
    writeln!(out, "{text}")?;
    Ok(())
}

/// For a successful forensics envelope, print a tamper warning with the
/// 1-indexed indicator list, or the all-clear line. Other envelopes print
/// nothing.
pub fn print_verdict<W: Write>(envelope: &Envelope, out: &mut W) -> io::Result<()> {
    if !envelope.is_success() {
        return Ok(());
    }

    let verdict = envelope.forensics().unwrap_or_default();
    writeln!(out)?;
    if verdict.is_tampered {
        writeln!(out, "Warning: the image may have been tampered with!")?;
        for (i, indicator) in verdict.tampering_indicators.iter().enumerate() {
            writeln!(
                out,
                "Tampering indicator {}: {}",
                i + 1,
                indicator.description.as_deref().unwrap_or("None")
            )?;
        }
    } else {
        writeln!(out, "No signs of tampering detected in the image")?;
    }
    Ok(())
}

/// Show a spinner on stderr while `f` runs. Hidden when stderr is not a
/// terminal.
fn with_spinner<R>(message: String, f: impl FnOnce() -> R) -> R {
    info!("{message}");
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = f();
    spinner.finish_and_clear();
    result
}
