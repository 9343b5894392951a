use anyhow::{bail, Context, Result};
use env_logger::Env;
use std::env;
use std::fs;
use std::io::{self, Read};

use fleet_trip_import::{
    ImportConfig, ImportSession, ImportStatus, ReferenceData, SqliteTripStore, TripStore,
};

const USAGE: &str = "Usage:
  fleet-import preview <file|-> [--header]
  fleet-import import <file|-> --date YYYY-MM-DD [--header]
  fleet-import trips";

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let args: Vec<String> = env::args().skip(1).collect();
    let config = ImportConfig::load()?;

    match args.first().map(String::as_str) {
        Some("preview") => run_preview(&args[1..], &config),
        Some("import") => run_import(&args[1..], &config),
        Some("trips") => run_list_trips(&config),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

struct ImportArgs {
    source: String,
    has_header: bool,
    departure_date: Option<String>,
}

fn parse_args(args: &[String], config: &ImportConfig) -> Result<ImportArgs> {
    let mut source = None;
    let mut has_header = config.has_header;
    let mut departure_date = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--header" => has_header = true,
            "--no-header" => has_header = false,
            "--date" => {
                let value = iter.next().context("--date needs a value (YYYY-MM-DD)")?;
                departure_date = Some(value.clone());
            }
            other if source.is_none() => source = Some(other.to_string()),
            other => bail!("Unexpected argument: {}\n{}", other, USAGE),
        }
    }

    let source = match source {
        Some(s) => s,
        None => bail!("Missing input file\n{}", USAGE),
    };

    Ok(ImportArgs {
        source,
        has_header,
        departure_date,
    })
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read pasted text from stdin")?;
        return Ok(text);
    }

    fs::read_to_string(source).with_context(|| format!("Failed to read input file: {}", source))
}

fn load_session(args: &ImportArgs, config: &ImportConfig) -> Result<ImportSession> {
    let reference = ReferenceData::load(&config.vehicles_path, &config.drivers_path, &config.rules_path)?;
    let text = read_input(&args.source)?;
    Ok(ImportSession::new(reference, &text, args.has_header))
}

fn print_preview(session: &ImportSession) {
    let report = session.preview();

    println!("\n📋 Import preview");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for row in &report.rows {
        let icon = match row.status {
            ImportStatus::Valid => "✓",
            ImportStatus::Warning => "⚠",
            ImportStatus::Error => "✗",
            ImportStatus::Duplicate => "≡",
        };
        let commission = match row.commission {
            Some(value) => format!("{:.2}", value),
            None => "-".to_string(),
        };

        println!(
            "{} line {:>3} | {:<9} | {:<10} | {} → {} | {:>8} | {}",
            icon,
            row.row_index,
            row.status.as_str(),
            row.plate,
            row.origin,
            row.destination,
            commission,
            row.message
        );
    }

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", report.summary_line());
}

fn run_preview(args: &[String], config: &ImportConfig) -> Result<()> {
    let args = parse_args(args, config)?;
    let session = load_session(&args, config)?;
    print_preview(&session);
    Ok(())
}

fn run_import(args: &[String], config: &ImportConfig) -> Result<()> {
    let args = parse_args(args, config)?;
    let departure_date = match &args.departure_date {
        Some(date) => date.clone(),
        None => bail!("import needs --date YYYY-MM-DD"),
    };

    let session = load_session(&args, config)?;
    print_preview(&session);

    let mut store = SqliteTripStore::open(&config.database_path)?;
    let outcome = session.commit(&mut store, &departure_date, &config.actor)?;

    println!("\n✅ Imported {} trips", outcome.imported);
    println!("✓ Skipped errors: {}", outcome.skipped_errors);
    println!("✓ Skipped duplicates: {}", outcome.skipped_duplicates);
    println!("✓ Batch: {}", outcome.batch_fingerprint);

    Ok(())
}

fn run_list_trips(config: &ImportConfig) -> Result<()> {
    let store = SqliteTripStore::open(&config.database_path)?;
    let trips = store.list_trips()?;

    println!("🚚 {} trips in {}", trips.len(), config.database_path.display());
    for stored in trips {
        let trip = &stored.trip;
        let commission = trip
            .driver_commission
            .map(|value| format!("{:.2}", value))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{} | {} | {} | {} | {} → {} | {}",
            trip.departure_date,
            stored.id,
            trip.vehicle_id,
            trip.driver_id,
            trip.origin,
            trip.destination,
            commission
        );
    }

    Ok(())
}
