use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{AppError, FetchError, Result};
use crate::extractor::PriceExtractor;
use crate::fetcher::PageFetcher;
use crate::models::{TrackedItem, TrackedItemUpdate};
use crate::notifier::{Notifier, PriceDropEvent};
use crate::store::TrackerStore;

/// Terminal state of one tracked item within one run.
#[derive(Debug)]
pub enum ScanOutcome {
    /// Drop detected, notification dispatched, record updated.
    AlertedAndUpdated,
    /// No drop; only the check timestamp was touched.
    Unchanged,
    /// Item left untouched this run; the next run retries it.
    Skipped(SkipReason),
}

#[derive(Debug)]
pub enum SkipReason {
    Fetch(FetchError),
    Extract,
    Notify(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Fetch(e) => write!(f, "fetch failed: {}", e),
            SkipReason::Extract => write!(f, "no price found on page"),
            SkipReason::Notify(e) => write!(f, "notification failed: {}", e),
        }
    }
}

struct ItemReport {
    item_id: String,
    outcome: ScanOutcome,
}

/// Aggregate report for one run. Observability only: skipped items carry
/// no retry state here, the next scheduled run is the retry mechanism.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub processed: usize,
    pub emails_sent: usize,
    pub errors: usize,
    pub error_details: Vec<String>,
}

/// Runs the scan-all-pending-items cycle.
///
/// Each item is an isolated failure domain: fetch, extract and notify
/// failures are recorded and never abort the run. Store errors are the
/// exception, since partial processing against an unreachable store
/// would leave it inconsistent, so they fail the whole run.
pub struct ScanOrchestrator {
    store: Arc<dyn TrackerStore>,
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    extractor: PriceExtractor,
    max_concurrent: usize,
    // Two runs racing on the same item could read the same stale price
    // and double-notify; overlapping triggers are rejected instead.
    run_guard: Mutex<()>,
}

impl ScanOrchestrator {
    pub fn new(
        store: Arc<dyn TrackerStore>,
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            notifier,
            extractor: PriceExtractor::new(),
            max_concurrent: max_concurrent.max(1),
            run_guard: Mutex::new(()),
        }
    }

    pub async fn run_scan(&self) -> Result<ScanSummary> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| AppError::Conflict("a scan is already running".to_string()))?;

        let items = self.store.find_pending().await?;
        tracing::info!(pending = items.len(), "Scan started");

        let reports: Vec<Result<ItemReport>> = stream::iter(items)
            .map(|item| self.process_item(item))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut summary = ScanSummary {
            processed: 0,
            emails_sent: 0,
            errors: 0,
            error_details: Vec::new(),
        };

        for report in reports {
            let report = report?;
            summary.processed += 1;
            match report.outcome {
                ScanOutcome::AlertedAndUpdated => summary.emails_sent += 1,
                ScanOutcome::Unchanged => {}
                ScanOutcome::Skipped(reason) => {
                    summary.errors += 1;
                    summary
                        .error_details
                        .push(format!("Tracker {}: {}", report.item_id, reason));
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            emails_sent = summary.emails_sent,
            errors = summary.errors,
            "Scan completed"
        );
        Ok(summary)
    }

    /// Pending → Fetching → Extracting → Comparing → terminal state.
    ///
    /// Returns Err only for store failures, which are run-fatal. Note
    /// the ordering on the drop path: notify first, persist only after
    /// confirmed dispatch, so a delivery failure can never leave a
    /// record falsely marked as alerted.
    async fn process_item(&self, item: TrackedItem) -> Result<ItemReport> {
        let report = |outcome| ItemReport {
            item_id: item.id.clone(),
            outcome,
        };

        let content = match self.fetcher.fetch(&item.url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(item = %item.id, url = %item.url, error = %e, "Fetch failed, skipping");
                return Ok(report(ScanOutcome::Skipped(SkipReason::Fetch(e))));
            }
        };

        let Some(new_price) = self.extractor.extract(&content) else {
            tracing::warn!(item = %item.id, url = %item.url, "No price found, skipping");
            return Ok(report(ScanOutcome::Skipped(SkipReason::Extract)));
        };

        let now = Utc::now();
        if new_price < item.price {
            let event = PriceDropEvent::new(&item, item.price, new_price);
            if let Err(e) = self.notifier.notify(&event).await {
                // Do not mark alert_sent; a lost user-visible alert is
                // worse than a duplicate attempt next run.
                tracing::error!(item = %item.id, error = %e, "Notification failed, rolling back");
                return Ok(report(ScanOutcome::Skipped(SkipReason::Notify(
                    e.to_string(),
                ))));
            }

            self.store
                .update_by_id(&item.id, TrackedItemUpdate::alerted(new_price, now))
                .await?;

            tracing::info!(
                item = %item.id,
                url = %item.url,
                old_price = item.price,
                new_price,
                "Price drop alert sent"
            );
            Ok(report(ScanOutcome::AlertedAndUpdated))
        } else {
            self.store
                .update_by_id(&item.id, TrackedItemUpdate::checked(now))
                .await?;
            Ok(report(ScanOutcome::Unchanged))
        }
    }
}
