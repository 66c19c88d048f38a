//! # tracklog-core
//!
//! Buffered telemetry collection for applications.
//!
//! This library provides:
//! - An event collector that bounds memory under load and batches delivery
//! - A crash-durable snapshot of pending events
//! - An HTTP transport with caller-driven retry
//! - A lazily generated, persisted per-install identity
//! - Hierarchical trackers that name event sources
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracklog_core::{Collector, Config, FileIdentityStorage, SimpleEvent, Tracker};
//!
//! # async fn demo() -> tracklog_core::Result<()> {
//! let config = Config::load()?;
//! let identity_path = Config::data_dir().expect("data dir").join("identity");
//! let collector = Collector::new(
//!     &config.collector,
//!     Arc::new(FileIdentityStorage::new(identity_path)),
//! )?;
//!
//! let screen: Tracker<SimpleEvent> = Tracker::<SimpleEvent>::root(collector.clone()).child("weather");
//! screen.track(&SimpleEvent::new("view").with_param("station", "lublin"));
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use collector::{Collector, CollectorStats};
pub use config::{CollectorConfig, Config};
pub use entry::Entry;
pub use error::{Error, Result};
pub use event::{Event, ParamValue, Parameters, SimpleEvent};
pub use identity::{FileIdentityStorage, Identity, IdentityStorage, InMemoryIdentityStorage};
pub use snapshot::SnapshotStore;
pub use tracker::Tracker;
pub use transport::{HttpTransport, Transport};

// Public modules
pub mod buffer;
pub mod codec;
pub mod collector;
pub mod config;
pub mod entry;
pub mod error;
pub mod event;
pub mod identity;
pub mod logging;
pub mod snapshot;
pub mod tracker;
pub mod transport;
