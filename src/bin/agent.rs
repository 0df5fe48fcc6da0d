use std::path::PathBuf;

use clap::Parser;

use tally_client::{shutdown, Client, ClientConfig, TallyError};

#[derive(Parser)]
#[command(
    name = "tally-agent",
    about = "Uploads wager records to the collection service and reports the winners"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "client.toml", env = "CONFIG_PATH")]
    config: String,

    /// Override the client identifier from the config file.
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    /// Override the collection service address from the config file.
    #[arg(long, env = "SERVER_ADDR")]
    server_addr: Option<String>,

    /// Record file to upload; defaults to `<data_dir>/agency-<id>.csv`.
    #[arg(long)]
    dataset: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => {}
        Err(TallyError::Interrupted) => {
            tracing::info!("workflow interrupted by shutdown request");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<(), TallyError> {
    let mut config = ClientConfig::load(&cli.config)?;
    if let Some(id) = cli.client_id {
        config.client_id = id;
    }
    if let Some(addr) = cli.server_addr {
        config.server_addr = addr;
    }
    config.validate()?;
    tracing::info!(config = %cli.config, client_id = %config.client_id, "loaded config");

    let dataset = cli.dataset.unwrap_or_else(|| config.dataset_path());
    tracing::info!(dataset = %dataset.display(), "opening record source");
    let source = tokio::fs::File::open(&dataset).await?;

    let shutdown = shutdown::listen();
    let mut client = Client::new(config, shutdown);

    let announcement = client.run(source).await?;
    tracing::info!(winners = announcement.winners.len(), "workflow complete");
    Ok(())
}
