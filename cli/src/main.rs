mod commands;

use clap::Parser;
use commands::{ui, Cli, Commands};
use defraud_config::{ConfigError, Credentials, ErrorFormatter};
use defraud_core::DefraudError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    if let Err(err) = Credentials::load_dotenv() {
        eprintln!("{}", ErrorFormatter::new(&err));
        return ExitCode::FAILURE;
    }

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Build {
            dataset,
            out,
            index_name,
        } => commands::handle_build(dataset, out, index_name, config_path).await,
        Commands::Ask {
            claim,
            verbose,
            json,
            trust_index,
        } => commands::handle_ask(claim, verbose, json, trust_index, config_path).await,
        Commands::Verify {
            claim,
            json,
            trust_index,
        } => commands::handle_verify(claim, json, trust_index, config_path).await,
        Commands::Retrieve {
            query,
            top,
            trust_index,
        } => commands::handle_retrieve(query, top, trust_index, config_path).await,
        Commands::Web { query, top } => commands::handle_web(query, top, config_path).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report(err: &anyhow::Error) {
    let config_err = err.downcast_ref::<ConfigError>().or_else(|| {
        match err.downcast_ref::<DefraudError>() {
            Some(DefraudError::Configuration(inner)) => Some(inner),
            _ => None,
        }
    });
    match config_err {
        Some(cfg) => eprintln!("{}", ErrorFormatter::new(cfg)),
        None => ui::print_error(&format!("{err:#}")),
    }
}
