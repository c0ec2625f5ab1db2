//! `lmdl` binary.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lmdl_cli::commands::{cmd_index, cmd_reset, cmd_search, cmd_similar_terms};
use lmdl_cli::config_handlers::handle_config_command;
use lmdl_cli::{Cli, Command, LmdlConfig};
use lmdl_query::SearchRequest;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_path = cli.config.as_deref();

    if let Command::Config { action } = cli.command {
        handle_config_command(config_path, action)?;
        return Ok(());
    }

    let config = LmdlConfig::load(config_path)?;
    tracing::debug!(core = %config.solr.core_url(), "Loaded configuration");

    match cli.command {
        Command::Index { file, labels } => cmd_index(&config, &file, labels).await,
        Command::SimilarTerms => cmd_similar_terms(&config).await,
        Command::Reset { yes } => cmd_reset(&config, yes).await,
        Command::Search {
            text,
            fields,
            type_filter,
            start,
            json,
        } => {
            let request = SearchRequest {
                text,
                fields,
                type_filter,
                start,
            };
            cmd_search(&config, request, json).await
        }
        Command::Config { .. } => Ok(()),
    }
}
