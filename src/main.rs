use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tx_pipeline::application::pipeline::{Pipeline, RunOutcome};
use tx_pipeline::application::report;
use tx_pipeline::config::{BrokerConfig, PipelineConfig};
use tx_pipeline::domain::ports::{MessageBrokerRef, TransactionStoreRef};
use tx_pipeline::domain::scoring::{AmountRiskScorer, RandomRiskScorer, RiskScorer};
use tx_pipeline::infrastructure::in_memory::{InMemoryBroker, InMemoryTransactionStore};
use tx_pipeline::interfaces::csv::report_writer::ReportWriter;
use tx_pipeline::interfaces::csv::transaction_reader::TransactionReader;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scoring {
    /// Uniformly random score
    Random,
    /// Deterministic score from amount and currency
    Amount,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV of transactions to submit (from_account,to_account,amount,currency)
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "TX_PIPELINE_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Messages each stage handles concurrently
    #[arg(long, env = "TX_PIPELINE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Deliveries before an unsettled message is dead-lettered
    #[arg(long, env = "TX_PIPELINE_MAX_DELIVERY_COUNT", default_value_t = 10)]
    max_delivery_count: u32,

    /// Risk scoring policy used by the enricher
    #[arg(long, value_enum, env = "TX_PIPELINE_SCORING", default_value_t = Scoring::Random)]
    scoring: Scoring,
}

fn open_store(db_path: Option<PathBuf>) -> Result<TransactionStoreRef> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = tx_pipeline::infrastructure::rocksdb::RocksDBStore::open(&path)
                .into_diagnostic()?;
            info!(path = %path.display(), "Using RocksDB transaction store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
        None => Ok(Arc::new(InMemoryTransactionStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let store = open_store(cli.db_path)?;
    let broker: MessageBrokerRef = Arc::new(InMemoryBroker::new(BrokerConfig {
        max_delivery_count: cli.max_delivery_count,
        ..BrokerConfig::default()
    }));
    let scorer: Arc<dyn RiskScorer> = match cli.scoring {
        Scoring::Random => Arc::new(RandomRiskScorer),
        Scoring::Amount => Arc::new(AmountRiskScorer),
    };
    let config = PipelineConfig {
        concurrency: cli.concurrency,
        ..PipelineConfig::default()
    };

    let pipeline = Pipeline::new(store.clone(), broker.clone(), scorer, config);
    let running = pipeline.spawn();
    let submitter = pipeline.submitter();

    // Submit every readable row; bad rows are reported and skipped.
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = TransactionReader::new(file);
    for request in reader.requests() {
        match request {
            Ok(request) => {
                if let Err(e) = submitter.submit(request).await {
                    error!(error = %e, "Error submitting transaction");
                }
            }
            Err(e) => {
                error!(error = %e, "Error reading transaction");
            }
        }
    }

    // Ctrl-C stops the workers once their in-flight messages are settled.
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    if running.finish(interrupt).await.into_diagnostic()? == RunOutcome::Interrupted {
        warn!("Report reflects a partially processed batch");
    }

    let rows = report::snapshot(store.as_ref(), broker.as_ref())
        .await
        .into_diagnostic()?;
    info!(rows = rows.len(), "Pipeline drained");

    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_rows(rows).into_diagnostic()?;

    Ok(())
}
