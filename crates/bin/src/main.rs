//! edgar-rss CLI binary.
//!
//! Indexes the SEC EDGAR monthly XBRL feeds into a local database and
//! downloads the instance documents of selected filers.

mod commands;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::Filers;
use edgar_rss::config::DEFAULT_WORK_DIR;
use edgar_rss::{EdgarError, FormFilter, IndexerConfig, SecIndexer};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "edgar-rss")]
#[command(about = "Index SEC EDGAR monthly XBRL feeds and download filings", long_about = None)]
#[command(version)]
struct Cli {
    /// Working directory holding the database, feed cache and filings
    #[arg(long = "wd", global = true, env = "EDGAR_RSS_WORK_DIR", default_value = DEFAULT_WORK_DIR)]
    work_dir: PathBuf,

    /// User agent sent to EDGAR (should identify you)
    #[arg(long, global = true, env = "EDGAR_RSS_USER_AGENT")]
    user_agent: Option<String>,

    /// Base URL of the EDGAR archive
    #[arg(long, global = true, env = "EDGAR_RSS_BASE_URL")]
    base_url: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download monthly feeds and index them into the database
    #[command(name = "getrss")]
    GetRss {
        /// First year to index
        from_year: i32,

        /// Last year to index
        to_year: i32,

        /// Month of the first year to start from
        #[arg(long = "fm", default_value_t = 1, value_parser = clap::value_parser!(i32).range(1..=12))]
        from_month: i32,

        /// Month of the last year to stop at
        #[arg(long = "tm", default_value_t = 12, value_parser = clap::value_parser!(i32).range(1..=12))]
        to_month: i32,

        /// Replace the table contents instead of merging into them
        #[arg(long)]
        replace: bool,
    },

    /// Download the XBRL instance documents of one or more filers
    #[command(name = "getxbrl")]
    GetXbrl {
        /// First filing year
        from_year: i32,

        /// Last filing year
        to_year: i32,

        #[command(flatten)]
        filer: FilerArgs,

        /// Form type to download, or "All"
        #[arg(long = "ft", default_value = "All")]
        form: FormFilter,
    },

    /// List indexed filings of one filer
    List {
        /// First filing year
        from_year: i32,

        /// Last filing year
        to_year: i32,

        #[command(flatten)]
        filer: SingleFilerArgs,

        /// Form type to list, or "All"
        #[arg(long = "ft", default_value = "All")]
        form: FormFilter,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Which filers to download for.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct FilerArgs {
    /// CIK of the filer
    #[arg(short, long)]
    cik: Option<String>,

    /// Ticker symbol of the filer
    #[arg(short, long)]
    ticker: Option<String>,

    /// File with one ticker per line
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct SingleFilerArgs {
    /// CIK of the filer
    #[arg(short, long)]
    cik: Option<String>,

    /// Ticker symbol of the filer
    #[arg(short, long)]
    ticker: Option<String>,
}

impl FilerArgs {
    fn into_filers(self) -> edgar_rss::Result<Filers> {
        match (self.cik, self.ticker, self.file) {
            (Some(cik), _, _) => Ok(Filers::Cik(cik)),
            (None, Some(ticker), _) => Ok(Filers::Ticker(ticker)),
            (None, None, Some(file)) => Ok(Filers::TickerFile(file)),
            (None, None, None) => Err(EdgarError::InvalidSymbol("No filer given".to_string())),
        }
    }
}

impl SingleFilerArgs {
    fn into_filers(self) -> edgar_rss::Result<Filers> {
        FilerArgs {
            cik: self.cik,
            ticker: self.ticker,
            file: None,
        }
        .into_filers()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(exit_code(&e));
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

const fn exit_code(error: &EdgarError) -> i32 {
    if error.is_lookup_failure() {
        2
    } else if error.is_database_failure() {
        3
    } else {
        1
    }
}

async fn run(cli: Cli) -> edgar_rss::Result<()> {
    let mut config = IndexerConfig::with_work_dir(&cli.work_dir);
    if let Some(user_agent) = cli.user_agent {
        config.user_agent = user_agent;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let indexer = SecIndexer::new(config)?;

    match cli.command {
        Commands::GetRss {
            from_year,
            to_year,
            from_month,
            to_month,
            replace,
        } => {
            commands::get_rss(&indexer, from_year, to_year, from_month, to_month, replace).await?;
        }
        Commands::GetXbrl {
            from_year,
            to_year,
            filer,
            form,
        } => {
            commands::get_xbrl(&indexer, filer.into_filers()?, from_year, to_year, form).await?;
        }
        Commands::List {
            from_year,
            to_year,
            filer,
            form,
            format,
        } => {
            commands::list(
                &indexer,
                filer.into_filers()?,
                from_year,
                to_year,
                form,
                format == OutputFormat::Json,
            )
            .await?;
        }
    }

    Ok(())
}
