//! The main entry point for the `geostac` CLI binary.

use anyhow::Result;
use clap::Parser;

use geostac_cli::{Cli, Commands};
use geostac_core::observability::{LogFormat, init_logging};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let config = cli.config();
    let geostore_url = cli.geostore_url.clone();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        match cli.command {
            Commands::Create(args) => {
                geostac_cli::commands::create::execute(args, &config, &geostore_url).await
            }
            Commands::Update(args) => {
                geostac_cli::commands::update::execute(args, &config, &geostore_url).await
            }
        }
    })
}
