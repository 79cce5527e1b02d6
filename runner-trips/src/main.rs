use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;

use csvload_core::config::{IngestConfig, PgConfig};
use csvload_core::loader::ChunkedTableLoader;
use csvload_core::schema::{ColumnType, LoadSpec, TableSchema};
use csvload_core::sink::PostgresSink;
use csvload_core::source::{self, SourceLocator};
use csvload_core::telemetry::init_tracing;

const TRIPS_URL_PREFIX: &str =
    "https://github.com/DataTalksClub/nyc-tlc-data/releases/download/yellow/";

/// Load one month of yellow taxi trip data into PostgreSQL.
#[derive(Parser, Debug)]
#[command(name = "ingest-trips")]
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
    #[arg(long, default_value = "yellow_taxi_data")]
    target_table: String,

    /// Year of data to ingest
    #[arg(long, default_value_t = 2021)]
    year: i32,

    /// Month of data to ingest
    #[arg(long, default_value_t = 1)]
    month: u32,

    /// Chunk size for processing
    #[arg(long, default_value_t = 100_000)]
    chunksize: usize,
}

fn trips_schema() -> TableSchema {
    TableSchema::new()
        .with("VendorID", ColumnType::Int64)
        .with("passenger_count", ColumnType::Int64)
        .with("trip_distance", ColumnType::Float64)
        .with("RatecodeID", ColumnType::Int64)
        .with("store_and_fwd_flag", ColumnType::Text)
        .with("PULocationID", ColumnType::Int64)
        .with("DOLocationID", ColumnType::Int64)
        .with("payment_type", ColumnType::Int64)
        .with("fare_amount", ColumnType::Float64)
        .with("extra", ColumnType::Float64)
        .with("mta_tax", ColumnType::Float64)
        .with("tip_amount", ColumnType::Float64)
        .with("tolls_amount", ColumnType::Float64)
        .with("improvement_surcharge", ColumnType::Float64)
        .with("total_amount", ColumnType::Float64)
        .with("congestion_surcharge", ColumnType::Float64)
}

fn trips_spec(chunk_size: usize) -> LoadSpec {
    LoadSpec::new(trips_schema(), chunk_size)
        .parse_dates(&["tpep_pickup_datetime", "tpep_dropoff_datetime"])
}

fn trips_url(year: i32, month: u32) -> String {
    format!("{TRIPS_URL_PREFIX}yellow_tripdata_{year}-{month:02}.csv.gz")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if !(1..=12).contains(&args.month) {
        bail!("month must be between 1 and 12, got {}", args.month);
    }

    let config = IngestConfig {
        postgres: PgConfig {
            user: args.pg_user,
            password: args.pg_password,
            host: args.pg_host,
            port: args.pg_port,
            database: args.pg_db,
        },
        table: args.target_table,
        source: trips_url(args.year, args.month),
        chunk_size: args.chunksize,
    };
    config.validate()?;

    let locator = SourceLocator::parse(&config.source);
    info!("Reading from: {}", locator);

    let spec = trips_spec(config.chunk_size);
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
