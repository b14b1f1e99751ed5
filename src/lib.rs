// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) parses arguments and hands them to these modules.
//
// Module responsibilities:
// - `api`: the blocking HTTP client for the image forensics service
//   (health, metadata, batch metadata, forensics) and its transport seam.
// - `envelope`: the `{status, ...}` JSON response shape and typed views
//   of the forensics payload.
// - `cli`: command-line flags.
// - `ui`: dispatches an action to `api` and prints the result.
// - `telemetry`: tracing subscriber setup.
pub mod api;
pub mod cli;
pub mod envelope;
pub mod telemetry;
pub mod ui;
