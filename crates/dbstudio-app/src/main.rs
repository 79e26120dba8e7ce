//! dbstudio command line front-end
//!
//! Loads settings, initialises logging and drivers, and exposes the
//! service operations as commands that print JSON to stdout.

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dbstudio_core::RecordNode;
use dbstudio_drivers::DriverRegistry;
use dbstudio_schema::MetadataEnricher;
use dbstudio_services::{DatabaseService, InMemoryConnectionRegistry, InMemoryOverrideStore};
use dbstudio_settings::{StudioSettings, logging};
use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => StudioSettings::load_from(path)?,
        None => StudioSettings::load()?,
    };

    let mut logging_config = settings.logging.clone();
    if let Some(filter) = &cli.log {
        logging_config.filter = filter.clone();
    }
    let _log_guard = logging::init(&logging_config)?;

    let service = build_service(settings);
    run(&service, cli.command).await
}

fn build_service(settings: StudioSettings) -> DatabaseService {
    tracing::debug!(
        connections = settings.connections.len(),
        overrides = settings.column_overrides.len(),
        type_aliases = settings.type_aliases.len(),
        "settings loaded"
    );

    let enricher = MetadataEnricher::new().with_type_aliases(settings.type_aliases);
    DatabaseService::new(
        DriverRegistry::with_defaults(),
        Arc::new(InMemoryConnectionRegistry::with_records(settings.connections)),
        Arc::new(InMemoryOverrideStore::with_overrides(settings.column_overrides)),
    )
    .with_enricher(enricher)
}

async fn run(service: &DatabaseService, command: Command) -> Result<()> {
    match command {
        Command::Connections => print_json(&service.get_connections().await?),
        Command::Structure { connection } => {
            print_json(&service.get_database_structure(&connection).await?)
        }
        Command::Table(args) => print_json(
            &service
                .get_table_info(&args.connection, &args.schema, &args.table)
                .await?,
        ),
        Command::Rows {
            table,
            page,
            per_page,
        } => print_json(
            &service
                .get_table_rows(&table.connection, &table.schema, &table.table, page, per_page)
                .await?,
        ),
        Command::Record { table, id } => print_json(
            &service
                .get_record(&table.connection, &table.schema, &table.table, &id)
                .await?,
        ),
        Command::Merge {
            connection,
            input,
            diff,
        } => {
            let payload = match input {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read record tree from {:?}", path))?,
                None => {
                    let mut buffer = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buffer)
                        .await
                        .context("Failed to read record tree from stdin")?;
                    buffer
                }
            };
            let record: RecordNode =
                serde_json::from_str(&payload).context("Record tree is not valid JSON")?;

            let result = service.get_merge_sql(&connection, &record).await?;
            if diff {
                print!("{}", result.diff_sql);
                Ok(())
            } else {
                print_json(&result)
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
