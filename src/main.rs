use anyhow::{Context, Result};
use clap::Parser;
use suncache::{
    Config,
    cache::store,
    cli::{Cli, Command},
    feed::FeedClient,
    logging,
    populate::Populator,
    server,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Loading config from {:?}", cli);

    let mut config = Config::load(cli.config_file.as_deref()).context("Failed to load config")?;
    if let Some(cache_dir) = cli.cache_dir {
        config.cache_dir = cache_dir;
    }
    config.validate()?;

    match cli.command {
        Command::Populate => {
            let client = FeedClient::new(&config)?;
            let summary = Populator::new(&config, &client)
                .run()
                .await
                .inspect_err(|e| tracing::error!("Run aborted: {}", e))?;
            println!("{}", summary);
        }
        Command::Serve { bind_address } => {
            server::serve(config.cache_dir, &bind_address).await?;
        }
        Command::List => {
            let names = store::list_images(&config.cache_dir)
                .inspect_err(|e| tracing::error!("Error: {}", e))?;
            println!("{}", serde_json::to_string(&names)?);
        }
    }

    Ok(())
}
