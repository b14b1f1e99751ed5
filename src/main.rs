// Entrypoint for the CLI application.
// - Keeps `main` small: parse flags, build the client and hand both to `ui::run`.
// - Returns `anyhow::Result`; only client construction can fail here, every
//   request outcome is printed as an envelope.

use clap::Parser;
use imgforensics_cli::{api::ForensicsClient, cli::Cli, telemetry, ui};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    let api = ForensicsClient::new(cli.client_config())?;

    let stdout = std::io::stdout();
    ui::run(&api, &cli, &mut stdout.lock())?;
    Ok(())
}
