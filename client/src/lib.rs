//! # Psorcast Client
//!
//! Keeps the participant's singleton reports cached on device and in step
//! with the research data backend.
//!
//! Each report category gets a [`SingletonReport`] that:
//! - reads its value lazily from a [`LocalStore`] and caches it in memory
//! - merges remote values with the category rules from `psorcast-engine`
//! - pushes local changes to a [`ReportStore`], tracking whether the last
//!   push landed
//! - broadcasts a change event on the shared [`ChangeBus`]
//!
//! ## Example
//!
//! ```rust
//! use psorcast_client::{ChangeBus, MemoryLocalStore, MemoryReportStore, ReportRegistry};
//! use psorcast_engine::TaskResult;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> psorcast_client::Result<()> {
//! let remote = Arc::new(MemoryReportStore::new());
//! let registry = ReportRegistry::new(
//!     remote.clone(),
//!     Arc::new(MemoryLocalStore::new()),
//!     ChangeBus::default(),
//! );
//!
//! let viewed = TaskResult::new("Insights", chrono::Utc::now())
//!     .with_answer("insightViewedIdentifier", "Sleep");
//! registry.upload(&viewed).await?;
//!
//! assert!(registry.insights.is_synced());
//! assert!(remote.payload("Insights").is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod local;
pub mod notify;
pub mod registry;
pub mod report;
pub mod store;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use error::{Result, SyncError};
pub use local::{FileLocalStore, LocalStore, MemoryLocalStore};
pub use notify::ChangeBus;
pub use registry::{ReloadSummary, ReportRegistry};
pub use report::{SingletonReport, SyncOutcome};
pub use store::{singleton_date, MemoryReportStore, Report, ReportStore};
pub use telemetry::init_tracing;
