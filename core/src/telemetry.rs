use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "csvload_core=info,ingest_zones=info,ingest_trips=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct LoadMetrics {
    pub chunks_loaded: usize,
    pub rows_loaded: u64,
    pub table_replaces: usize,
    pub appends: usize,
}
