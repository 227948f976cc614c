use begrotingsanalyse::args::{Args, Command};
use begrotingsanalyse::{commands, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().begroting_home().path();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.base_url(), init_args.data_dir())
                .await?
                .print()
        }

        Command::Municipalities(municipalities_args) => {
            let config = Config::load(home).await?;
            commands::municipalities(config, municipalities_args.clone())
                .await?
                .print()
        }

        Command::Circulaires(circulaires_args) => {
            let config = Config::load(home).await?;
            commands::circulaires(config, circulaires_args.clone())
                .await?
                .print()
        }

        Command::Compare(compare_args) => {
            let config = Config::load(home).await?;
            commands::compare(config, compare_args.clone())
                .await?
                .print()
        }

        Command::Analyse(analyse_args) => {
            let config = Config::load(home).await?;
            commands::analyse(config, analyse_args.clone())
                .await?
                .print()
        }

        Command::ExportOverride(export_args) => {
            let config = Config::load(home).await?;
            commands::export_override(config, export_args.clone())
                .await?
                .print()
        }

        // works on a checkout of the data repository, no configuration needed
        Command::Prepare(prepare_args) => {
            commands::prepare(prepare_args.step(), prepare_args.root())
                .await?
                .print()
        }

        Command::Taxonomy(taxonomy_args) => {
            let config = Config::load(home).await?;
            commands::taxonomy(config, taxonomy_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
