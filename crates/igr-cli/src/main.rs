mod documents;
mod rate;
mod valuation;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use igr_core::MatchMode;

#[derive(Debug, Parser)]
#[command(name = "igr-cli")]
#[command(about = "Maharashtra IGR land-rate lookup")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up the ready-reckoner rate for a village and survey numbers
    Rate {
        #[arg(long)]
        district: String,
        /// Financial year as listed by the portal (e.g. 2024-2025)
        #[arg(long)]
        year: String,
        #[arg(long)]
        taluka: String,
        #[arg(long)]
        village: String,
        /// Survey number; repeat the flag or pass a comma-separated list
        #[arg(long = "survey", required = true)]
        surveys: Vec<String>,
        /// Override `IGR_MATCH_MODE` (identifiers, lookup or scan-all)
        #[arg(long)]
        mode: Option<MatchMode>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
    /// Parse raw survey numbers and report which ones are usable
    Surveys {
        #[arg(required = true)]
        raw: Vec<String>,
    },
    /// Pull district, taluka, village and survey numbers out of a document
    Extract {
        /// Plain-text export (tables as `|`-separated rows) or a JSON document
        file: PathBuf,
        #[arg(long)]
        district: Option<String>,
        #[arg(long)]
        taluka: Option<String>,
        #[arg(long)]
        village: Option<String>,
    },
    /// Derive per-area rates and the market summary from Index-II records
    Valuation {
        /// JSON array of Index-II records
        file: PathBuf,
        /// Earliest registration date (dd/mm/yyyy)
        #[arg(long, value_parser = parse_date)]
        from: Option<NaiveDate>,
        /// Latest registration date (dd/mm/yyyy)
        #[arg(long, value_parser = parse_date)]
        to: Option<NaiveDate>,
        /// Land type to keep in the summary
        #[arg(long, conflicts_with = "any_type")]
        prakar: Option<String>,
        /// Summarize every land type
        #[arg(long)]
        any_type: bool,
    },
    /// Find the rural rate band containing an area
    AreaRate {
        /// Saved HTML of the rural rate grid
        file: PathBuf,
        /// Area in hectares
        #[arg(long)]
        area: f64,
    },
    /// Translate Marathi administrative names to English
    Translate {
        #[arg(required = true)]
        text: Vec<String>,
    },
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    igr_core::valuation::parse_registration_date(raw)
        .ok_or_else(|| format!("\"{raw}\" is not a dd/mm/yyyy date"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = igr_core::load_app_config_from_env()?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Rate {
            district,
            year,
            taluka,
            village,
            surveys,
            mode,
            headed,
        }) => {
            let mut config = config;
            if let Some(mode) = mode {
                config.match_mode = mode;
            }
            if headed {
                config.headless = false;
            }
            let request = rate::build_request(district, year, taluka, village, &surveys)?;
            rate::run_rate(&config, &request).await?;
        }
        Some(Commands::Surveys { raw }) => documents::run_surveys(&raw)?,
        Some(Commands::Extract {
            file,
            district,
            taluka,
            village,
        }) => documents::run_extract(&file, district, taluka, village)?,
        Some(Commands::Valuation {
            file,
            from,
            to,
            prakar,
            any_type,
        }) => valuation::run_valuation(&file, from, to, prakar, any_type)?,
        Some(Commands::AreaRate { file, area }) => valuation::run_area_rate(&file, area)?,
        Some(Commands::Translate { text }) => rate::run_translate(&config, &text).await?,
        None => println!("igr-cli: run with --help to list commands"),
    }

    Ok(())
}
