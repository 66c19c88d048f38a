//! Event collector
//!
//! The collector buffers events in memory, mirrors them to a snapshot file
//! and ships them to the collection endpoint in batches.
//!
//! ## Architecture
//!
//! [`Collector`] is a cheap handle. All state lives in one spawned task that
//! processes commands in order:
//!
//! ```text
//! collect ─▶ append ─▶ overflow bound ─▶ snapshot ─▶ len > flush_limit? ─▶ flush
//!                                                                            │
//!            requeue (failed batch first) ◀─── FlushCompleted ◀── Transport ─┘
//! ```
//!
//! Nothing here fails outward: snapshot and transport problems are logged
//! and the affected events stay pending. A failed batch is retried only when
//! a later `collect` crosses the threshold or `flush` is called again.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracklog_core::{Collector, CollectorConfig, InMemoryIdentityStorage, SimpleEvent};
//!
//! # async fn demo() -> tracklog_core::Result<()> {
//! let config = CollectorConfig {
//!     endpoint: Some("https://stats.example.com/events".to_string()),
//!     ..Default::default()
//! };
//! let collector = Collector::new(&config, Arc::new(InMemoryIdentityStorage::new()))?;
//!
//! collector.collect("weather.list", &SimpleEvent::new("view").with_param("screen", "home"));
//! collector.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod actor;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::config::CollectorConfig;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::identity::IdentityStorage;
use crate::transport::{HttpTransport, Transport};

use actor::{Command, CollectorActor};

pub use actor::CollectorStats;

/// Handle to a running collector
///
/// Clones share the same buffer. The task stops once every handle is
/// dropped and in-flight submissions have completed, or on
/// [`shutdown`](Collector::shutdown).
#[derive(Clone)]
pub struct Collector {
    tx: mpsc::UnboundedSender<Command>,
}

impl Collector {
    /// Start a collector submitting over HTTP
    ///
    /// Must be called from within a tokio runtime. Returns an error if the
    /// configuration is invalid or the endpoint is missing.
    pub fn new(config: &CollectorConfig, storage: Arc<dyn IdentityStorage>) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, storage, Arc::new(transport))
    }

    /// Start a collector with a custom transport
    ///
    /// The snapshot is restored before the first command is processed.
    pub fn with_transport(
        config: &CollectorConfig,
        storage: Arc<dyn IdentityStorage>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::Config(format!("collector requires a tokio runtime: {}", e))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut actor = CollectorActor::new(config, storage, transport, rx, tx.downgrade());
        actor.restore();
        runtime.spawn(actor.run());

        Ok(Self { tx })
    }

    /// Record an event from `source_id`, timestamped now
    pub fn collect<E: Event + ?Sized>(&self, source_id: impl Into<String>, event: &E) {
        self.send(Command::Collect(Entry::from_event(source_id, event)));
    }

    /// Submit everything buffered; no-op when empty
    pub fn flush(&self) {
        self.send(Command::Flush);
    }

    /// Replace the buffer with the snapshot contents, if readable
    pub fn restore(&self) {
        self.send(Command::Restore);
    }

    /// Delete the snapshot file
    pub fn clear(&self) {
        self.send(Command::Clear);
    }

    /// Entries currently buffered, oldest first
    ///
    /// Batches in flight are not included.
    pub async fn pending(&self) -> Result<Vec<Entry>> {
        self.request(Command::Pending).await
    }

    /// The tracking identity, resolving it if needed
    pub async fn identity(&self) -> Result<String> {
        self.request(Command::Identity).await
    }

    /// Number of submissions awaiting a transport outcome
    pub async fn in_flight(&self) -> Result<usize> {
        self.request(Command::InFlight).await
    }

    pub async fn stats(&self) -> Result<CollectorStats> {
        self.request(Command::Stats).await
    }

    /// Wait until no submission is in flight
    pub async fn wait_idle(&self) -> Result<()> {
        self.request(Command::WaitIdle).await
    }

    /// Flush, wait for outstanding submissions, write a final snapshot and stop
    pub async fn shutdown(self) -> Result<()> {
        self.request(Command::Shutdown).await
    }

    fn send(&self, cmd: Command) {
        if self.tx.send(cmd).is_err() {
            tracing::warn!("Collector is not running, command dropped");
        }
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| Error::Closed)?;
        response.await.map_err(|_| Error::Closed)
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("running", &!self.tx.is_closed())
            .finish()
    }
}
