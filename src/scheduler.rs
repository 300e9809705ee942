use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::SchedulerConfig;
use crate::orchestrator::ScanOrchestrator;

/// Periodic scan trigger. A deployment can instead rely on an external
/// cron hitting the HTTP trigger endpoint; the orchestrator's run guard
/// keeps the two safe against each other.
pub struct ScanScheduler {
    scheduler: JobScheduler,
    orchestrator: Arc<ScanOrchestrator>,
    config: SchedulerConfig,
}

impl ScanScheduler {
    pub async fn new(orchestrator: Arc<ScanOrchestrator>, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            orchestrator,
            config,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let orchestrator = Arc::clone(&self.orchestrator);
        // tokio-cron-scheduler expects a 6-field expression with seconds.
        let cron = format!("0 {}", self.config.scan_interval);

        let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
            let orchestrator = Arc::clone(&orchestrator);
            Box::pin(async move {
                match orchestrator.run_scan().await {
                    Ok(summary) => tracing::info!(
                        processed = summary.processed,
                        emails_sent = summary.emails_sent,
                        errors = summary.errors,
                        "Scheduled scan finished"
                    ),
                    Err(e) => tracing::error!(error = %e, "Scheduled scan failed"),
                }
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;
        tracing::info!(interval = %self.config.scan_interval, "Scan scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Scan scheduler shutdown");
        Ok(())
    }
}
