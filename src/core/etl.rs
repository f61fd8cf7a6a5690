use crate::core::{Extraction, FetchFailure, Pipeline, Query};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What happened to each indicator in one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub total_queries: usize,
    pub written: Vec<String>,
    pub abandoned: Vec<(Query, FetchFailure)>,
    /// Queries whose file was written from fewer pages than the API advertised.
    pub truncated: Vec<Query>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Processes queries strictly one after another. A query that fails at the
    /// HTTP level is skipped; any other error ends the run.
    pub async fn run(&self, queries: &[Query]) -> Result<RunReport> {
        let mut report = RunReport {
            total_queries: queries.len(),
            ..RunReport::default()
        };
        tracing::info!("Starting export for {} indicators", queries.len());

        for query in queries {
            // Extract
            let result_set = match self.pipeline.extract(query).await? {
                Extraction::Collected(set) => set,
                Extraction::Abandoned { query, failure } => {
                    report.abandoned.push((query, failure));
                    continue;
                }
            };
            if !result_set.is_complete() {
                report.truncated.push(query.clone());
            }

            // Transform
            let result_set = self.pipeline.transform(result_set).await?;

            // Load
            let output_path = self.pipeline.load(result_set).await?;
            report.written.push(output_path);

            if self.monitor.is_enabled() {
                self.monitor.log_stats(&format!("After {}", query.defanged()));
            }
        }

        self.monitor.log_final_stats();
        tracing::info!(
            "Finished: {} files written, {} indicators skipped",
            report.written.len(),
            report.abandoned.len()
        );
        Ok(report)
    }
}
