use anyhow::Result;
use clap::Parser;
use tracing::info;

use csvload_core::config::{IngestConfig, PgConfig};
use csvload_core::loader::ChunkedTableLoader;
use csvload_core::schema::{ColumnType, LoadSpec, TableSchema};
use csvload_core::sink::PostgresSink;
use csvload_core::source::{self, SourceLocator};
use csvload_core::telemetry::init_tracing;

const DEFAULT_CSV_URL: &str = "https://d37ci6vzurychx.cloudfront.net/misc/taxi_zone_lookup.csv";

/// Load the taxi zone lookup CSV into PostgreSQL.
#[derive(Parser, Debug)]
#[command(name = "ingest-zones")]
struct Args {
    /// PostgreSQL user
    #[arg(long, default_value = "root")]
    pg_user: String,

    /// PostgreSQL password
    #[arg(long, default_value = "root")]
    pg_password: String,

    /// PostgreSQL host
    #[arg(long, default_value = "localhost")]
    pg_host: String,

    /// PostgreSQL port
    #[arg(long, default_value_t = 5432)]
    pg_port: u16,

    /// PostgreSQL database name
    #[arg(long, default_value = "ny_taxi")]
    pg_db: String,

    /// Target table name
    #[arg(long, default_value = "taxi_zone_lookup")]
    target_table: String,

    /// Chunk size for processing
    #[arg(long, default_value_t = 50_000)]
    chunksize: usize,

    /// Path or URL of the CSV file
    #[arg(long, default_value = DEFAULT_CSV_URL)]
    csv_path: String,
}

fn zone_lookup_schema() -> TableSchema {
    TableSchema::new()
        .with("LocationID", ColumnType::Int64)
        .with("Borough", ColumnType::Text)
        .with("Zone", ColumnType::Text)
        .with("service_zone", ColumnType::Text)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = IngestConfig {
        postgres: PgConfig {
            user: args.pg_user,
            password: args.pg_password,
            host: args.pg_host,
            port: args.pg_port,
            database: args.pg_db,
        },
        table: args.target_table,
        source: args.csv_path,
        chunk_size: args.chunksize,
    };
    config.validate()?;

    let locator = SourceLocator::parse(&config.source);
    info!("Reading from: {}", locator);

    // Open the source before touching the database, so a missing local
    // file fails without any connection attempt.
    let spec = LoadSpec::new(zone_lookup_schema(), config.chunk_size);
    let mut reader = source::open(&locator, &spec).await?;

    let sink = PostgresSink::connect(&config.postgres).await?;
    let mut loader = ChunkedTableLoader::new(sink, config.table.as_str());
    let report = loader.run(&mut reader).await?;

    println!(
        "SUCCESS - Loaded {} rows into '{}' in {:.1}s",
        report.metrics.rows_loaded, report.table, report.elapsed_seconds
    );
    Ok(())
}
