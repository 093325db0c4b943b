use std::io::Write;

use paper_core::model::BankId;
use serde::Serialize;
use services::{AppConfig, AppServices, Clock};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod args;

use args::{ArgsError, Command, Invocation, print_usage};

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    // Diagnostics go to stderr so stdout stays valid JSON.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn resolve_bank(
    services: &AppServices,
    bank: Option<BankId>,
) -> Result<BankId, Box<dyn std::error::Error>> {
    match bank {
        Some(bank) => Ok(bank),
        None => services
            .catalog()
            .default_bank()
            .map(|descriptor| descriptor.id.clone())
            .ok_or_else(|| "no question banks configured".into()),
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    // `main` prints the error itself; only the usage is added here.
    let Invocation { global, command } = args::parse(argv).inspect_err(|_| print_usage())?;
    if command == Command::Help {
        print_usage();
        return Ok(());
    }

    let mut config = AppConfig::from_env();
    if let Some(data_dir) = global.data_dir {
        config = config.with_data_dir(data_dir);
    }
    if let Some(db_url) = global.db_url {
        config = config.with_db_url(db_url);
    }

    prepare_sqlite_file(&config.database_url())?;
    let services = AppServices::from_config(&config, Clock::system()).await?;

    match command {
        Command::Help => Ok(()),
        Command::Banks => print_json(&services.browse().list_banks()),
        Command::Topics { bank } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.browse().bank_summary(&bank).await?)
        }
        Command::Groups { bank, topic } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.browse().topic_groups(&bank, &topic).await?)
        }
        Command::Generate { bank, request } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.papers().generate(&bank, request).await?)
        }
        Command::Search { bank, term } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.browse().search(&bank, &term).await?)
        }
        Command::Practice { bank, request } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.practice().draw(&bank, &request).await?)
        }
        Command::ReviewGroups { bank } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.reviews().groups(&bank).await?)
        }
        Command::ReviewStatus { bank } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.reviews().status(&bank).await?)
        }
        Command::ReviewSet { bank, update } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.reviews().update(&bank, update).await?)
        }
        Command::Note { bank, text } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.notes().submit(&bank, &text).await?)
        }
        Command::Notes { bank } => {
            let bank = resolve_bank(&services, bank)?;
            print_json(&services.notes().list(&bank).await?)
        }
        Command::CheckImages => {
            let missing = services.images().audit().await?;
            for entry in &missing {
                tracing::warn!(
                    bank = %entry.bank_id,
                    question = %entry.question_id,
                    kind = ?entry.kind,
                    reference = %entry.reference,
                    "missing image"
                );
            }
            print_json(&missing)
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
