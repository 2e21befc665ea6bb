use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use fxrates::core::config::SourceKind;
use fxrates::core::currency::CurrencyCode;
use fxrates::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    /// JSON rate history endpoint
    Api,
    /// Currency converter web page
    Page,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> SourceKind {
        match arg {
            SourceArg::Api => SourceKind::Api,
            SourceArg::Page => SourceKind::Page,
        }
    }
}

impl From<Commands> for fxrates::AppCommand {
    fn from(cmd: Commands) -> fxrates::AppCommand {
        match cmd {
            Commands::Fetch { output, source } => fxrates::AppCommand::Fetch {
                output,
                source: source.map(Into::into),
            },
            Commands::Rate {
                base,
                quote,
                source,
            } => fxrates::AppCommand::Rate {
                base,
                quote,
                source: source.map(Into::into),
            },
            Commands::Show { path } => fxrates::AppCommand::Show { path },
            Commands::Codes => fxrates::AppCommand::Codes,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch rates for every currency pair and save them (default)
    Fetch {
        /// Output file, overrides the configured one
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Rate source, overrides the configured one
        #[arg(short, long, value_enum)]
        source: Option<SourceArg>,
    },
    /// Display the latest rate for one pair
    Rate {
        base: CurrencyCode,
        quote: CurrencyCode,
        /// Rate source, overrides the configured one
        #[arg(short, long, value_enum)]
        source: Option<SourceArg>,
    },
    /// Display a saved rates file
    Show {
        /// Rates file, defaults to the configured output
        path: Option<PathBuf>,
    },
    /// List recognized currency codes
    Codes,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Fetch {
        output: None,
        source: None,
    });
    let result = match command {
        Commands::Setup => fxrates::cli::setup::setup(),
        cmd => fxrates::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
