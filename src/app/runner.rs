//! Entry point shared by both binaries: argument parsing, logging, validation
//! and wiring of client, storage and pipeline for one dataset.

use crate::config::{CliConfig, LocalStorage};
use crate::core::client::{Credentials, PassiveTotalClient};
use crate::core::etl::{EtlEngine, RunReport};
use crate::core::pipeline::ResolutionPipeline;
use crate::core::reader::read_indicators;
use crate::core::{ConfigProvider, Dataset};
use crate::utils::error::{ErrorSeverity, Result};
use crate::utils::logger;
use crate::utils::validation::Validate;
use clap::Parser;
use std::time::Duration;

/// Parses the command line, runs the export and returns the process exit code.
pub async fn run<D: Dataset>(dataset: D) -> i32 {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    match execute(dataset, config).await {
        Ok(report) => {
            println!(
                "✅ {} of {} indicators exported",
                report.written.len(),
                report.total_queries
            );
            for (query, failure) in &report.abandoned {
                println!("⚠️  Skipped {}: {}", query.defanged(), failure);
            }
            for query in &report.truncated {
                println!("⚠️  Incomplete results for {}", query.defanged());
            }
            0
        }
        Err(e) => {
            tracing::error!(
                "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            }
        }
    }
}

async fn execute<D: Dataset>(dataset: D, config: CliConfig) -> Result<RunReport> {
    let config = config.with_file_overrides()?;
    config.validate()?;

    let queries = read_indicators(config.query_file())?;

    let storage = LocalStorage::new(config.output_path().to_string());
    storage.ensure_base_dir()?;

    let client = PassiveTotalClient::new(
        Credentials {
            username: config.username().to_string(),
            api_key: config.api_key().to_string(),
        },
        config.timeout_seconds().map(Duration::from_secs),
    )?;

    let pipeline = ResolutionPipeline::new(dataset, client, storage, config.api_endpoint());
    tracing::debug!("Using endpoint: {}", pipeline.endpoint());

    let engine = EtlEngine::new_with_monitoring(pipeline, config.monitor);
    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    engine.run(&queries).await
}
