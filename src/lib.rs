pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod models;
pub mod notifier;
pub mod orchestrator;
pub mod scheduler;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, FetchError};
pub use extractor::PriceExtractor;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use models::{NewTrackedItem, TrackedItem, TrackedItemUpdate};
pub use notifier::{EmailNotifier, Notifier, PriceDropEvent};
pub use orchestrator::{ScanOrchestrator, ScanSummary};
pub use store::{SqliteTrackerStore, TrackerStore};

pub type Result<T> = std::result::Result<T, AppError>;
