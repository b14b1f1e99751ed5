// Command-line arguments. Kept separate from `ui` so the dispatch logic can
// be driven by a hand-built `Cli` in tests.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{ClientConfig, BASE_URL_ENV, DEFAULT_BASE_URL};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "imgforensics",
    version,
    about = "Image metadata extraction and forensics analysis client"
)]
pub struct Cli {
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL, help = "Base URL of the forensics API service")]
    pub url: String,

    #[arg(long, value_enum, help = "Operation to perform")]
    pub action: Action,

    #[arg(long, help = "Image file path (metadata, forensics)")]
    pub image: Option<PathBuf>,

    #[arg(long, num_args = 1.., help = "Image file paths (batch)")]
    pub images: Option<Vec<PathBuf>>,

    #[arg(long, value_name = "SECS", help = "Per-request timeout; unbounded when omitted")]
    pub timeout: Option<u64>,

    #[arg(long, default_value_t = false, help = "Print JSON on a single line")]
    pub compact: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Action {
    Health,
    Metadata,
    Batch,
    Forensics,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.url.as_str());
        match self.timeout {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}
