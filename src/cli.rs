//! CLI definition and dispatch.

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::{self, CsvAdapter, DatasetSummary};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::aggregate::{CompanyTotal, YearPoint};
use crate::domain::config_validation::{
    DEFAULT_BATCH_SIZE, backend, default_listen, listen_addr, validate_config,
};
use crate::domain::country_stats::CountryStats;
use crate::domain::error::TradeMapError;
use crate::domain::lookup::{CompanyDetail, StatsLimits, company_report, country_report};
use crate::domain::map_summary::{MapCountry, max_total_trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;
use crate::ports::trade_store::{ContactDetails, TradeSink, TradeStore};

#[derive(Parser, Debug)]
#[command(
    name = "trademap",
    version,
    about = "Trade flow statistics by country and company"
)]
pub struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Where trades are read from: a CSV export held in memory, or the store a
/// config file names.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Trade export CSV, loaded into memory
    #[arg(short, long)]
    pub input: Option<PathBuf>,
    /// INI config naming the database
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
    /// Also write the JSON report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ContactArgs {
    /// Full name of the contact person
    #[arg(long = "name")]
    pub contact_name: String,
    #[arg(long)]
    pub position: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    /// LinkedIn profile URL
    #[arg(long)]
    pub linkedin: Option<String>,
}

impl From<ContactArgs> for ContactDetails {
    fn from(args: ContactArgs) -> Self {
        ContactDetails {
            contact_name: args.contact_name,
            position: args.position,
            email: args.email,
            phone: args.phone,
            linkedin_url: args.linkedin,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a trade export into the configured database
    Import {
        #[arg(short, long)]
        config: PathBuf,
        /// Defaults to [data] csv_path
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Describe the columns of a trade export
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Per-country totals, as used to colour the map
    Countries {
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long)]
        json: bool,
        /// Only list the country names, sorted
        #[arg(long)]
        names: bool,
    },
    /// Statistics for one country
    Country {
        name: String,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Statistics for one company
    Company {
        name: String,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Set the stored address and/or website of a company
    Profile {
        company: String,
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        website: Option<String>,
    },
    /// Add a contact person to a company
    Contact {
        company: String,
        #[arg(short, long)]
        config: PathBuf,
        #[command(flatten)]
        contact: ContactArgs,
    },
    /// Serve the JSON API
    Serve {
        #[command(flatten)]
        source: SourceArgs,
    },
}

impl Command {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Import { config, .. }
            | Command::Profile { config, .. }
            | Command::Contact { config, .. } => Some(config),
            Command::Inspect { .. } => None,
            Command::Countries { source, .. }
            | Command::Country { source, .. }
            | Command::Company { source, .. }
            | Command::Serve { source } => source.config.as_deref(),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Import { config, input } => run_import(&config, input.as_deref()),
        Command::Inspect { input } => run_inspect(&input),
        Command::Countries {
            source,
            json,
            names,
        } => run_countries(&source, json, names),
        Command::Country {
            name,
            source,
            report,
        } => run_country(&name, &source, &report),
        Command::Company {
            name,
            source,
            report,
        } => run_company(&name, &source, &report),
        Command::Profile {
            company,
            config,
            address,
            website,
        } => run_profile(&config, &company, address.as_deref(), website.as_deref()),
        Command::Contact {
            company,
            config,
            contact,
        } => run_contact(&config, &company, contact.into()),
        Command::Serve { source } => run_serve(&source),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins, then `-v`, then the
/// config's `[log] level`, then `warn`.
pub fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => cli
            .command
            .config_path()
            .and_then(|p| FileConfigAdapter::from_file(p).ok())
            .and_then(|c| c.get_string("log", "level"))
            .unwrap_or_else(|| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,trademap={level},tower_http={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TradeMapError> {
    let config = FileConfigAdapter::from_file(path)?;
    validate_config(&config)?;
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(config)
}

pub type SharedStore = Box<dyn TradeStore + Send + Sync>;

/// An opened trade source with the settings read alongside it.
pub struct StoreContext {
    pub store: SharedStore,
    pub limits: StatsLimits,
    pub listen: SocketAddr,
}

pub fn open_store(source: &SourceArgs) -> Result<StoreContext, TradeMapError> {
    if let Some(input) = &source.input {
        return Ok(StoreContext {
            store: Box::new(CsvAdapter::from_path(input)?),
            limits: StatsLimits::default(),
            listen: default_listen(),
        });
    }

    let path = source
        .config
        .as_deref()
        .ok_or_else(|| TradeMapError::ConfigMissing {
            section: "data".into(),
            key: "csv_path".into(),
        })?;
    let config = load_config(path)?;
    Ok(StoreContext {
        store: open_configured_store(&config)?,
        limits: StatsLimits::from_config(&config),
        listen: listen_addr(&config)?,
    })
}

/// The database named by `[database] backend`. A config with no backend but a
/// `[data] csv_path` serves that export from memory.
pub fn open_configured_store(config: &dyn ConfigPort) -> Result<SharedStore, TradeMapError> {
    if config.get_string("database", "backend").is_none() {
        if let Some(csv_path) = config.get_string("data", "csv_path") {
            return Ok(Box::new(CsvAdapter::from_path(csv_path)?));
        }
    }
    match backend(config).as_str() {
        "postgres" => open_postgres(config),
        _ => open_sqlite(config),
    }
}

#[cfg(not(all(feature = "sqlite", feature = "postgres")))]
fn missing_backend(name: &str) -> TradeMapError {
    TradeMapError::ConfigInvalid {
        section: "database".into(),
        key: "backend".into(),
        reason: format!("trademap was built without the {name} feature"),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<SharedStore, TradeMapError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<SharedStore, TradeMapError> {
    Err(missing_backend("sqlite"))
}

#[cfg(feature = "postgres")]
fn open_postgres(config: &dyn ConfigPort) -> Result<SharedStore, TradeMapError> {
    use crate::adapters::postgres_adapter::PostgresAdapter;

    let adapter = PostgresAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(_config: &dyn ConfigPort) -> Result<SharedStore, TradeMapError> {
    Err(missing_backend("postgres"))
}

fn run_import(config_path: &Path, input: Option<&Path>) -> Result<(), TradeMapError> {
    let config = load_config(config_path)?;
    let input = input
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("data", "csv_path").map(PathBuf::from))
        .ok_or_else(|| TradeMapError::ConfigMissing {
            section: "data".into(),
            key: "csv_path".into(),
        })?;

    let transactions = csv_adapter::read_transactions(csv_adapter::open_export(&input)?)?;
    tracing::info!(path = %input.display(), rows = transactions.len(), "read trade export");

    let batch_size = config.get_count("import", "batch_size", DEFAULT_BATCH_SIZE as usize);
    let summary = open_sink(&config)?.import(&transactions, batch_size)?;

    println!("Countries: {}", summary.countries);
    println!("Companies: {}", summary.companies);
    println!("Trades:    {}", summary.trades);
    Ok(())
}

fn run_profile(
    config_path: &Path,
    company: &str,
    address: Option<&str>,
    website: Option<&str>,
) -> Result<(), TradeMapError> {
    let config = load_config(config_path)?;
    let company = company.trim();
    if !open_sink(&config)?.update_company_profile(company, address, website)? {
        return Err(TradeMapError::CompanyNotFound {
            name: company.to_string(),
        });
    }
    println!("Updated {company}");
    Ok(())
}

fn run_contact(
    config_path: &Path,
    company: &str,
    contact: ContactDetails,
) -> Result<(), TradeMapError> {
    let config = load_config(config_path)?;
    let company = company.trim();
    let id = open_sink(&config)?
        .add_contact(company, &contact)?
        .ok_or_else(|| TradeMapError::CompanyNotFound {
            name: company.to_string(),
        })?;
    println!("Added contact {id} to {company}");
    Ok(())
}

/// Writable database named by `[database] backend`, schema in place.
pub fn open_sink(config: &dyn ConfigPort) -> Result<Box<dyn TradeSink>, TradeMapError> {
    match backend(config).as_str() {
        "postgres" => open_postgres_sink(config),
        _ => open_sqlite_sink(config),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite_sink(config: &dyn ConfigPort) -> Result<Box<dyn TradeSink>, TradeMapError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite_sink(_config: &dyn ConfigPort) -> Result<Box<dyn TradeSink>, TradeMapError> {
    Err(missing_backend("sqlite"))
}

#[cfg(feature = "postgres")]
fn open_postgres_sink(config: &dyn ConfigPort) -> Result<Box<dyn TradeSink>, TradeMapError> {
    use crate::adapters::postgres_adapter::PostgresAdapter;

    let adapter = PostgresAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres_sink(_config: &dyn ConfigPort) -> Result<Box<dyn TradeSink>, TradeMapError> {
    Err(missing_backend("postgres"))
}

fn run_inspect(input: &Path) -> Result<(), TradeMapError> {
    let summary = csv_adapter::inspect(csv_adapter::open_export(input)?)?;
    print_inspection(&summary);
    Ok(())
}

fn print_inspection(summary: &DatasetSummary) {
    println!("Rows: {}", summary.rows);
    println!("\nColumns:");
    let width = summary
        .columns
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, distinct) in &summary.columns {
        println!("  {name:<width$}  {distinct} distinct");
    }
    if !summary.sample.is_empty() {
        println!("\nFirst {} rows:", summary.sample.len());
        for row in &summary.sample {
            println!("  {}", row.join(" | "));
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), TradeMapError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TradeMapError::Io(std::io::Error::other(e.to_string())))?;
    println!("{json}");
    Ok(())
}

fn run_countries(source: &SourceArgs, json: bool, names: bool) -> Result<(), TradeMapError> {
    let ctx = open_store(source)?;
    if names {
        let names = ctx.store.list_countries()?;
        if json {
            return print_json(&names);
        }
        for name in &names {
            println!("{name}");
        }
        return Ok(());
    }

    let mut countries = ctx.store.map_countries()?;
    if json {
        return print_json(&countries);
    }

    countries.sort_by(|a, b| b.total_trade.total_cmp(&a.total_trade));
    print_map_table(&countries);
    Ok(())
}

fn print_map_table(countries: &[MapCountry]) {
    let max = max_total_trade(countries);
    println!(
        "{:<24} {:>14} {:>14} {:>16} {:>16} {:>7}",
        "Country", "Export kg", "Import kg", "Export USD", "Import USD", "Share"
    );
    for c in countries {
        // Same scale the map colours by.
        let share = if max > 0.0 { c.total_trade / max * 100.0 } else { 0.0 };
        println!(
            "{:<24} {:>14.2} {:>14.2} {:>16.2} {:>16.2} {:>6.1}%",
            c.name, c.export_volume, c.import_volume, c.export_value, c.import_value, share
        );
    }
    eprintln!("{} countries", countries.len());
}

fn run_country(name: &str, source: &SourceArgs, report: &ReportArgs) -> Result<(), TradeMapError> {
    let ctx = open_store(source)?;
    let stats = country_report(&*ctx.store, name, ctx.limits)?;

    if let Some(path) = &report.output {
        JsonReportAdapter::new().write_country(&stats, path)?;
    }
    if report.json {
        print_json(&stats)
    } else {
        print_country(&stats);
        Ok(())
    }
}

fn run_company(name: &str, source: &SourceArgs, report: &ReportArgs) -> Result<(), TradeMapError> {
    let ctx = open_store(source)?;
    let detail = company_report(&*ctx.store, name, ctx.limits)?;

    if let Some(path) = &report.output {
        JsonReportAdapter::new().write_company(&detail, path)?;
    }
    if report.json {
        print_json(&detail)
    } else {
        print_company(&detail);
        Ok(())
    }
}

fn print_flow(label: &str, volume: f64, value: f64, avg: f64) {
    println!("  {label:<8} {volume:>16.2} kg {value:>16.2} USD   avg {avg:.4} USD/kg");
}

fn print_companies(title: &str, companies: &[CompanyTotal]) {
    if companies.is_empty() {
        return;
    }
    println!("\n{title}:");
    for (i, c) in companies.iter().enumerate() {
        let home = c
            .home_country
            .as_deref()
            .map(|h| format!(" ({h})"))
            .unwrap_or_default();
        println!("  {:>2}. {}{}  {:.2} USD", i + 1, c.name, home, c.value);
    }
}

fn print_countries<'a>(title: &str, countries: impl IntoIterator<Item = (&'a str, f64)>) {
    let rows: Vec<_> = countries.into_iter().collect();
    if rows.is_empty() {
        return;
    }
    println!("\n{title}:");
    for (i, (name, value)) in rows.iter().enumerate() {
        println!("  {:>2}. {}  {:.2} USD", i + 1, name, value);
    }
}

fn print_country(stats: &CountryStats) {
    println!("{} ({})", stats.country_name, stats.country_code);
    println!("  Trades   {}", stats.trade_count);
    print_flow(
        "Exports",
        stats.total_export_volume,
        stats.total_export_value,
        stats.avg_export_price,
    );
    print_flow(
        "Imports",
        stats.total_import_volume,
        stats.total_import_value,
        stats.avg_import_price,
    );
    println!("  Balance  {:.2} USD", stats.trade_balance);

    print_companies("Top exporters", &stats.top_exporters);
    print_companies("Top buyers", &stats.top_buyers);
    print_companies("Top importers", &stats.top_importers);
    print_companies("Top sellers", &stats.top_sellers);
    print_countries(
        "Top destinations",
        stats.top_destinations.iter().map(|c| (c.country.as_str(), c.value)),
    );
    print_countries(
        "Top sources",
        stats.top_sources.iter().map(|c| (c.country.as_str(), c.value)),
    );

    if !stats.yearly_exports.is_empty() || !stats.yearly_imports.is_empty() {
        println!("\nBy year (export USD / import USD):");
        let mut years: Vec<i32> = stats
            .yearly_exports
            .iter()
            .chain(&stats.yearly_imports)
            .map(|p| p.year)
            .collect();
        years.sort_unstable();
        years.dedup();
        for year in years {
            let find = |series: &[YearPoint]| {
                series.iter().find(|p| p.year == year).map_or(0.0, |p| p.value)
            };
            println!(
                "  {year}  {:>16.2} {:>16.2}",
                find(stats.yearly_exports.as_slice()),
                find(stats.yearly_imports.as_slice())
            );
        }
    }
}

fn print_company(detail: &CompanyDetail) {
    let stats = &detail.stats;
    if stats.country_name.is_empty() {
        println!("{}", stats.company_name);
    } else {
        println!("{} ({})", stats.company_name, stats.country_name);
    }
    if let Some(address) = &detail.address {
        println!("  Address  {address}");
    }
    if let Some(website) = &detail.website {
        println!("  Website  {website}");
    }
    for contact in &detail.contacts {
        print_contact(&contact.details);
    }
    if !stats.has_trades() {
        println!("  No recorded trades");
        return;
    }
    println!("  Trades   {}", stats.trade_count);
    print_flow(
        "Exports",
        stats.total_export_volume,
        stats.total_export_value,
        stats.avg_export_price,
    );
    print_flow(
        "Imports",
        stats.total_import_volume,
        stats.total_import_value,
        stats.avg_import_price,
    );

    print_companies("Top customers", &stats.top_customers);
    print_countries(
        "Top destination countries",
        stats
            .top_destination_countries
            .iter()
            .map(|c| (c.country.as_str(), c.value)),
    );
    print_companies("Top suppliers", &stats.top_suppliers);
    print_countries(
        "Top source countries",
        stats
            .top_source_countries
            .iter()
            .map(|c| (c.country.as_str(), c.value)),
    );
}

fn print_contact(contact: &ContactDetails) {
    let mut line = format!("  Contact  {}", contact.contact_name);
    if let Some(position) = &contact.position {
        line.push_str(&format!(", {position}"));
    }
    for reach in [&contact.email, &contact.phone, &contact.linkedin_url]
        .into_iter()
        .flatten()
    {
        line.push_str(&format!(" <{reach}>"));
    }
    println!("{line}");
}

fn run_serve(source: &SourceArgs) -> Result<(), TradeMapError> {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{AppState, serve};
        use std::sync::Arc;

        let ctx = open_store(source)?;
        let state = AppState {
            store: Arc::from(ctx.store),
            limits: ctx.limits,
        };
        eprintln!("Starting web server on http://{}", ctx.listen);

        tokio::runtime::Runtime::new()?.block_on(serve(state, ctx.listen))
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = source;
        Err(TradeMapError::Io(std::io::Error::other(
            "the web feature is required for serve",
        )))
    }
}
