//! kabucal CLI binary.
//!
//! Builds the earnings-announcement and market-holiday calendar, and prints
//! the underlying J-Quants and JPX data as tables.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use kabucal::{PipelineConfig, Sources, collect_announcements, generate};
use kabucal_data::dates::DateRange;
use kabucal_data::jpx::{ANNOUNCEMENT_PAGE_URL, JpxFetcher};
use kabucal_data::jquants::session::{EMAIL_ENV, PASSWORD_ENV};
use kabucal_data::jquants::{
    Credentials, JQUANTS_BASE_URL, JQuantsClient, Session, fetch_trading_calendar,
};
use kabucal_data::{AnnouncementRecord, IntoFrame, TradingDayRecord};
use kabucal_output::DEFAULT_OUTPUT;
use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kabucal")]
#[command(about = "Japanese earnings-announcement and market-holiday calendar", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// J-Quants account email
    #[arg(long, env = EMAIL_ENV, global = true, hide_env_values = true)]
    email: Option<String>,

    /// J-Quants account password
    #[arg(long, env = PASSWORD_ENV, global = true, hide_env_values = true)]
    password: Option<String>,

    /// J-Quants API base URL
    #[arg(long, default_value = JQUANTS_BASE_URL, global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, merge and write the ICS calendar
    Generate {
        /// Output file
        #[arg(long, short, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Holiday window length in days
        #[arg(long, default_value = "365")]
        days: u32,

        /// First day of the holiday window (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day of the holiday window (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Skip the JPX spreadsheets
        #[arg(long)]
        no_fallback: bool,

        /// JPX announcement listing page (relative links resolve against its host)
        #[arg(long, default_value = ANNOUNCEMENT_PAGE_URL)]
        jpx_url: String,
    },

    /// Print announcements as a table
    Announcements {
        /// Which source to show
        #[arg(long, value_enum, default_value_t = AnnouncementView::Merged)]
        source: AnnouncementView,

        /// JPX announcement listing page (relative links resolve against its host)
        #[arg(long, default_value = ANNOUNCEMENT_PAGE_URL)]
        jpx_url: String,
    },

    /// Print the trading calendar as a table
    Holidays {
        /// Window length in days
        #[arg(long, default_value = "365")]
        days: u32,

        /// First day (YYYY-MM-DD, default today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Include trading days
        #[arg(long)]
        all: bool,
    },

    /// Print listed-issue information
    Listed {
        /// Securities code
        #[arg(long)]
        code: Option<String>,

        /// As-of date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Print daily quotes for one code
    Quotes {
        /// Securities code
        code: String,

        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AnnouncementView {
    /// J-Quants and JPX combined
    Merged,
    /// J-Quants only
    Primary,
    /// JPX spreadsheets only
    Fallback,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let credentials = Credentials::new(cli.email, cli.password);
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Generate {
            output,
            days,
            from,
            to,
            no_fallback,
            jpx_url,
        } => {
            let config = PipelineConfig {
                output,
                days,
                from,
                to,
                use_fallback: !no_fallback,
            };
            generate_calendar(&credentials, &cli.api_url, &jpx_url, config, today).await?;
        }
        Commands::Announcements { source, jpx_url } => {
            show_announcements(&credentials, &cli.api_url, &jpx_url, source).await?;
        }
        Commands::Holidays { days, from, to, all } => {
            let config = PipelineConfig {
                days,
                from,
                to,
                ..Default::default()
            };
            let window = config.holiday_window(today)?;
            show_trading_calendar(&credentials, &cli.api_url, window, all).await?;
        }
        Commands::Listed { code, date } => {
            let session = connect(&credentials, &cli.api_url).await?;
            require_enabled(&session)?;
            let client = JQuantsClient::new(&session);

            let pb = spinner("Fetching listed issues...");
            let listed = client.listed_info(code.as_deref(), date.as_deref()).await;
            pb.finish_with_message(format!("Fetched {} issues", listed.len()));
            println!("{}", listed.to_frame()?);
        }
        Commands::Quotes { code, from, to } => {
            let range = match (from, to) {
                (Some(from), Some(to)) => Some(DateRange::new(from, to)?),
                (None, None) => None,
                _ => return Err("--from and --to must be given together".into()),
            };
            let session = connect(&credentials, &cli.api_url).await?;
            require_enabled(&session)?;
            let client = JQuantsClient::new(&session);

            let pb = spinner(format!("Fetching quotes for {}...", code));
            let quotes = client.daily_quotes(&code, range).await;
            pb.finish_with_message(format!("Fetched {} quotes", quotes.len()));
            println!("{}", quotes.to_frame()?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn spinner(message: impl Into<std::borrow::Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message(message);
    pb
}

async fn connect(
    credentials: &Credentials,
    api_url: &str,
) -> Result<Session, Box<dyn std::error::Error>> {
    let pb = spinner("Authenticating with J-Quants...");
    let session = Session::initialize_with_base_url(credentials, api_url).await?;
    pb.finish_with_message(format!("J-Quants session {}", session.state()));
    Ok(session)
}

fn require_enabled(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
    if session.is_enabled() {
        Ok(())
    } else {
        Err(format!("J-Quants credentials required (set {EMAIL_ENV} and {PASSWORD_ENV})").into())
    }
}

async fn generate_calendar(
    credentials: &Credentials,
    api_url: &str,
    jpx_url: &str,
    config: PipelineConfig,
    today: NaiveDate,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(credentials, api_url).await?;
    let client = JQuantsClient::new(&session);
    let jpx = JpxFetcher::with_page_url(jpx_url)?;

    let sources = Sources {
        primary: session.is_enabled().then_some(&client),
        fallback: Some(&jpx),
        calendar: &client,
    };

    let pb = spinner("Building calendar...");
    let summary = match generate(sources, &config, today).await {
        Ok(summary) => summary,
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };
    pb.finish_with_message(format!(
        "Wrote {} events ({} announcements, {} holidays) to {}",
        summary.events,
        summary.announcements,
        summary.holidays,
        summary.path.display()
    ));
    Ok(())
}

async fn show_announcements(
    credentials: &Credentials,
    api_url: &str,
    jpx_url: &str,
    view: AnnouncementView,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = match view {
        AnnouncementView::Fallback => Session::disabled(),
        _ => connect(credentials, api_url).await?,
    };
    let client = JQuantsClient::new(&session);
    let jpx = JpxFetcher::with_page_url(jpx_url)?;

    let primary = (view != AnnouncementView::Fallback && session.is_enabled()).then_some(&client);
    let fallback = (view != AnnouncementView::Primary).then_some(&jpx);

    let pb = spinner("Fetching announcements...");
    let records = collect_announcements(primary, fallback).await;
    pb.finish_with_message(format!("Fetched {} announcements", records.len()));

    println!("{}", AnnouncementRecord::to_frame(&records)?);
    Ok(())
}

async fn show_trading_calendar(
    credentials: &Credentials,
    api_url: &str,
    window: DateRange,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = connect(credentials, api_url).await?;
    require_enabled(&session)?;
    let client = JQuantsClient::new(&session);

    let pb = spinner(format!("Fetching trading calendar {}...", window));
    let mut days = fetch_trading_calendar(&client, window).await;
    if !all {
        days.retain(TradingDayRecord::is_holiday);
    }
    pb.finish_with_message(format!("Fetched {} days", days.len()));

    println!("{}", TradingDayRecord::to_frame(&days)?);
    Ok(())
}
