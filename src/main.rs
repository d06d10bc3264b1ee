// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};

use ep_cohesion::{
    compare_voting_cohesion, configure_logging, latest_run, load_pairings, record_run,
    save_pairings, scan_documents, setup_database, AnalysisConfig, CachedDocumentSource,
    ComparisonReport, Roster,
};

/// Roll-call cohesion of a national party against the EU political groups
#[derive(Debug, Parser)]
#[command(name = "ep-cohesion", version, about)]
struct Cli {
    /// Directory for the daily rolling log file
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Stdout log filter, e.g. `debug` or `ep_cohesion=debug`
    #[arg(long, global = true, env = "EP_COHESION_LOG")]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compare a party's votes with every group over a date range
    Compare(CompareArgs),

    /// Scan documents for identifier pairings and store them
    Pairings(PairingsArgs),

    /// Browse a comparison report in the terminal
    View(ViewArgs),
}

/// Options shared by the commands that read roll-call documents
#[derive(Debug, Args)]
struct RangeArgs {
    /// JSON analysis configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// First day (yyyy-mm-dd), overrides the configuration
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day (yyyy-mm-dd), overrides the configuration
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Only use cached documents
    #[arg(long)]
    offline: bool,

    /// Document cache directory, overrides the configuration
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// SQLite database for pairings and runs
    #[arg(long, default_value = "ep-cohesion.db")]
    db: PathBuf,
}

impl RangeArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(start) = self.start {
            config.start_date = start;
        }
        if let Some(end) = self.end {
            config.end_date = end;
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        config.offline |= self.offline;

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Roster CSV (kind,mep_id,name,country,affiliation,affiliation_country,period)
    #[arg(long)]
    roster: PathBuf,

    /// National party name as written in the roster
    #[arg(long)]
    party: String,

    /// National party's country (omit for independents)
    #[arg(long)]
    country: Option<String>,

    /// Also write the report as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Debug, Args)]
struct PairingsArgs {
    #[command(flatten)]
    range: RangeArgs,
}

#[derive(Debug, Args)]
struct ViewArgs {
    /// SQLite database holding the runs
    #[arg(long, default_value = "ep-cohesion.db")]
    db: PathBuf,

    /// Report JSON file, instead of the latest stored run
    #[arg(long, conflicts_with = "db")]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal
    let log_to_stdout = !matches!(cli.command, Commands::View(_));
    configure_logging(&cli.log_dir, cli.log.as_deref(), log_to_stdout);

    match cli.command {
        Commands::Compare(args) => run_compare(args),
        Commands::Pairings(args) => run_pairings(args),
        Commands::View(args) => run_view(args),
    }
}

fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).with_context(|| format!("opening {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_compare(args: CompareArgs) -> Result<()> {
    let config = args.range.analysis_config()?;

    let groups = config.group_registry()?;
    let roster = Roster::load(&args.roster, groups)
        .with_context(|| format!("loading roster {}", args.roster.display()))?;
    let party = roster.find_party(&args.party, args.country.as_deref())?;

    let conn = open_database(&args.range.db)?;
    let mut pairings = load_pairings(&conn)?;
    let mut source = CachedDocumentSource::from_config(&config)?;

    let report = compare_voting_cohesion(
        party,
        &roster.groups,
        &mut pairings,
        &mut source,
        config.start_date,
        config.end_date,
    )?;

    save_pairings(&conn, &pairings)?;
    let run_id = record_run(&conn, party, &report)?;

    println!("{}", report.summary());
    println!("\n✓ Run {} stored in {}", run_id, args.range.db.display());

    if let Some(output) = &args.output {
        fs::write(output, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", output.display()))?;
        println!("✓ Report written to {}", output.display());
    }

    Ok(())
}

fn run_pairings(args: PairingsArgs) -> Result<()> {
    let config = args.range.analysis_config()?;
    let conn = open_database(&args.range.db)?;

    let mut source = CachedDocumentSource::from_config(&config)?;
    let scanned = scan_documents(&mut source, config.start_date, config.end_date)?;

    let mut pairings = load_pairings(&conn)?;
    let known = pairings.len();
    pairings.merge(&scanned);
    save_pairings(&conn, &pairings)?;

    println!(
        "✓ {} pairings found, {} new, {} stored",
        scanned.len(),
        pairings.len() - known,
        pairings.len()
    );
    Ok(())
}

fn load_report(args: &ViewArgs) -> Result<(ComparisonReport, String)> {
    if let Some(path) = &args.report {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("parsing report {}", path.display()))?;
        return Ok((report, path.display().to_string()));
    }

    let conn = open_database(&args.db)?;
    let run = latest_run(&conn)?
        .with_context(|| format!("no run stored in {}, run `compare` first", args.db.display()))?;
    Ok((run.report, format!("run {} ({})", run.run_id, run.created_at)))
}

#[cfg(feature = "tui")]
fn run_view(args: ViewArgs) -> Result<()> {
    let (report, origin) = load_report(&args)?;

    let mut app = ui::App::new(report, origin);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_view(args: ViewArgs) -> Result<()> {
    let (report, origin) = load_report(&args)?;
    println!("{}\n", origin);
    println!("{}", report.summary());
    eprintln!("\nRebuild with `--features tui` for the interactive viewer");
    Ok(())
}
