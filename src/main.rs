use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use oxrates::cli::setup::{setup, setup_at_path};
use oxrates::core::log::init_logging;

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

impl From<Commands> for oxrates::AppCommand {
    fn from(cmd: Commands) -> oxrates::AppCommand {
        match cmd {
            Commands::Latest {
                base,
                symbols,
                no_cache,
            } => oxrates::AppCommand::Latest {
                base,
                symbols,
                skip_cache: no_cache,
            },
            Commands::Historical { date, no_cache } => oxrates::AppCommand::Historical {
                date,
                skip_cache: no_cache,
            },
            Commands::Currencies => oxrates::AppCommand::Currencies,
            Commands::Convert {
                amount,
                from,
                to,
                decimals,
                raw,
            } => oxrates::AppCommand::Convert {
                amount,
                from,
                to,
                decimals: (!raw).then_some(decimals),
            },
            Commands::Timeseries {
                start,
                end,
                no_cache,
            } => oxrates::AppCommand::TimeSeries {
                start,
                end,
                skip_cache: no_cache,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the latest rates
    Latest {
        /// Quote rates against this currency instead of the configured base
        #[arg(short, long)]
        base: Option<String>,
        /// Comma separated currencies to include, e.g. GBP,JPY
        #[arg(short, long)]
        symbols: Option<String>,
        /// Bypass the cache for this request
        #[arg(long)]
        no_cache: bool,
    },
    /// Show the rates of a past day
    Historical {
        /// Date such as 2021-01-31
        date: String,
        #[arg(long)]
        no_cache: bool,
    },
    /// List the currencies the provider knows
    Currencies,
    /// Convert an amount between two currencies
    Convert {
        amount: f64,
        from: String,
        to: String,
        /// Decimal places of the formatted result
        #[arg(short, long, default_value_t = 2)]
        decimals: usize,
        /// Print the unformatted number
        #[arg(long, conflicts_with = "decimals")]
        raw: bool,
    },
    /// Show daily rates from START up to, not including, END
    Timeseries {
        start: String,
        end: String,
        #[arg(long)]
        no_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => setup_at_path(path),
            None => setup(),
        },
        Some(cmd) => oxrates::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
