use std::sync::Arc;

use clap::Parser;
use form_saver::cli::commands::{
    cmd_data_clear_all, cmd_data_clear_site, cmd_data_show, cmd_init, cmd_relay, cmd_sites_add,
    cmd_sites_list, cmd_sites_remove, cmd_sites_toggle, cmd_stats,
};
use form_saver::cli::config::{
    AppConfig, Cli, Commands, DataCommand, SitesCommand, read_config, resolve_store_path,
};
use form_saver::store::adapter::StoreAdapter;
use form_saver::store::file_store::JsonFileStore;
use form_saver::trace::subscriber::{init_tracing, level_for_verbosity};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let loaded = read_config(cli.config.as_deref());
    let configured_level = match &loaded {
        Ok(config) => config.logging.level.clone(),
        Err(_) => AppConfig::default().logging.level,
    };
    init_tracing(&level_for_verbosity(cli.verbose, &configured_level));

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default config");
        AppConfig::default()
    });

    let store_path = resolve_store_path(cli.store.as_deref(), &config);
    tracing::debug!(store = %store_path, "using store");
    let store = StoreAdapter::new(Arc::new(JsonFileStore::new(store_path)));

    let output = match cli.command {
        Commands::Init => cmd_init(&store).await?,
        Commands::Sites { action } => match action {
            SitesCommand::List => cmd_sites_list(&store).await?,
            SitesCommand::Add { site } => cmd_sites_add(&store, &site).await?,
            SitesCommand::Remove { site } => cmd_sites_remove(&store, &site).await?,
            SitesCommand::Toggle { site } => cmd_sites_toggle(&store, &site).await?,
        },
        Commands::Data { action } => match action {
            DataCommand::Show { url } => cmd_data_show(&store, &url).await?,
            DataCommand::ClearSite { site, yes } => cmd_data_clear_site(&store, &site, yes).await?,
            DataCommand::ClearAll { yes } => cmd_data_clear_all(&store, yes).await?,
        },
        Commands::Stats => cmd_stats(&store).await?,
        Commands::Relay => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cmd_relay(&store, stdin, tokio::io::stdout()).await?;
            return Ok(());
        }
    };

    println!("{}", output);
    Ok(())
}
