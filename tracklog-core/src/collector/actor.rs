//! Task owning the buffer
//!
//! Single-owner pattern: one task holds the buffer, identity cache and
//! in-flight table, and processes [`Command`]s in arrival order. Transport
//! completions come back through the same channel, so nothing else ever
//! touches the buffer.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};
use tokio::sync::oneshot;

use crate::buffer::{Batch, Buffer};
use crate::config::CollectorConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::identity::{Identity, IdentityStorage};
use crate::snapshot::SnapshotStore;
use crate::transport::Transport;

/// Commands processed by the collector task.
pub(crate) enum Command {
    /// Append an entry.
    Collect(Entry),
    /// Submit everything buffered.
    Flush,
    /// Reload the buffer from the snapshot.
    Restore,
    /// Delete the snapshot file.
    Clear,
    /// Outcome of a submission started by `Flush`.
    FlushCompleted { batch: u64, result: Result<()> },
    Pending(oneshot::Sender<Vec<Entry>>),
    Identity(oneshot::Sender<String>),
    InFlight(oneshot::Sender<usize>),
    Stats(oneshot::Sender<CollectorStats>),
    /// Reply once no submission is in flight.
    WaitIdle(oneshot::Sender<()>),
    /// Flush, wait for in-flight submissions, persist and stop.
    Shutdown(oneshot::Sender<()>),
}

/// Collector counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CollectorStats {
    /// Entries accepted through `collect`
    pub events_collected: usize,
    /// Entries in batches the transport reported as delivered
    pub events_delivered: usize,
    /// Entries discarded by the overflow bound
    pub events_dropped: usize,
    /// Submissions started
    pub flushes: usize,
    /// Submissions that failed and were requeued
    pub flush_failures: usize,
}

pub(crate) struct CollectorActor {
    buffer: Buffer,
    identity: Identity,
    storage: Arc<dyn IdentityStorage>,
    transport: Arc<dyn Transport>,
    snapshot: SnapshotStore,
    /// Detached batches awaiting a transport outcome, oldest first
    in_flight: BTreeMap<u64, Batch>,
    next_batch: u64,
    idle_waiters: Vec<oneshot::Sender<()>>,
    stats: CollectorStats,
    rx: UnboundedReceiver<Command>,
    tx: WeakUnboundedSender<Command>,
}

impl CollectorActor {
    pub(crate) fn new(
        config: &CollectorConfig,
        storage: Arc<dyn IdentityStorage>,
        transport: Arc<dyn Transport>,
        rx: UnboundedReceiver<Command>,
        tx: WeakUnboundedSender<Command>,
    ) -> Self {
        Self {
            buffer: Buffer::new(config.flush_limit, config.foolproof),
            identity: Identity::Unset,
            storage,
            transport,
            snapshot: SnapshotStore::from_config(config),
            in_flight: BTreeMap::new(),
            next_batch: 0,
            idle_waiters: Vec::new(),
            stats: CollectorStats::default(),
            rx,
            tx,
        }
    }

    pub(crate) async fn run(mut self) {
        tracing::debug!(snapshot = ?self.snapshot.path(), "Collector started");

        let mut done = None;
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Shutdown(reply) => {
                    self.shutdown().await;
                    done = Some(reply);
                    break;
                }
                cmd => self.handle(cmd),
            }
        }

        // Every handle is gone or shutdown was requested
        self.persist();
        tracing::debug!(pending = self.buffer.len(), "Collector stopped");

        if let Some(done) = done {
            let _ = done.send(());
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Collect(entry) => self.collect(entry),
            Command::Flush => self.flush(),
            Command::Restore => self.restore(),
            Command::Clear => self.clear(),
            Command::FlushCompleted { batch, result } => self.complete(batch, result),
            Command::Pending(reply) => {
                let _ = reply.send(self.buffer.to_vec());
            }
            Command::Identity(reply) => {
                let identity = self.identity.resolve(self.storage.as_ref()).to_string();
                let _ = reply.send(identity);
            }
            Command::InFlight(reply) => {
                let _ = reply.send(self.in_flight.len());
            }
            Command::Stats(reply) => {
                let _ = reply.send(self.stats.clone());
            }
            Command::WaitIdle(reply) => {
                if self.in_flight.is_empty() {
                    let _ = reply.send(());
                } else {
                    self.idle_waiters.push(reply);
                }
            }
            // A second shutdown while the first is draining
            Command::Shutdown(done) => {
                let _ = done.send(());
            }
        }
    }

    fn collect(&mut self, entry: Entry) {
        self.stats.events_collected += 1;

        let outcome = self.buffer.push(entry);
        self.stats.events_dropped += outcome.dropped;

        self.persist();

        if self.buffer.should_flush() {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let Some(tx) = self.tx.upgrade() else {
            tracing::debug!("Collector closing, flush deferred to snapshot");
            return;
        };

        let batch = self.buffer.take();
        let entries = Arc::clone(batch.entries());
        let id = self.next_batch;
        self.next_batch += 1;
        self.in_flight.insert(id, batch);
        self.stats.flushes += 1;

        let identity = self.identity.resolve(self.storage.as_ref()).to_string();
        let transport = Arc::clone(&self.transport);

        tracing::debug!(batch = id, count = entries.len(), "Flushing entries");

        tokio::spawn(async move {
            let result = transport.send(&identity, &entries).await;
            if tx
                .send(Command::FlushCompleted { batch: id, result })
                .is_err()
            {
                tracing::warn!(batch = id, "Collector stopped before flush completed");
            }
        });
    }

    fn complete(&mut self, id: u64, result: Result<()>) {
        let Some(batch) = self.in_flight.remove(&id) else {
            tracing::warn!(batch = id, "Completion for unknown batch");
            return;
        };

        match result {
            Ok(()) => {
                self.stats.events_delivered += batch.len();
                tracing::debug!(batch = id, count = batch.len(), "Flush ok");
            }
            Err(e) => {
                self.stats.flush_failures += 1;
                tracing::warn!(
                    batch = id,
                    count = batch.len(),
                    error = %e,
                    "Flush failed, requeueing"
                );
                let outcome = self.buffer.requeue(batch);
                self.stats.events_dropped += outcome.dropped;
            }
        }

        self.persist();

        if self.in_flight.is_empty() {
            for waiter in self.idle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    /// Load the snapshot into the buffer
    ///
    /// The snapshot starts with any in-flight batches; when they match, they
    /// are skipped so a later requeue cannot duplicate them.
    pub(crate) fn restore(&mut self) {
        let Some(mut entries) = self.snapshot.read() else {
            tracing::debug!("No snapshot to restore");
            return;
        };

        let in_flight: Vec<&Entry> = self.in_flight.values().flat_map(|b| b.entries().iter()).collect();
        if !in_flight.is_empty()
            && entries.len() >= in_flight.len()
            && entries.iter().zip(&in_flight).all(|(a, b)| a == *b)
        {
            entries.drain(..in_flight.len());
        }

        let count = entries.len();
        let outcome = self.buffer.replace(entries);
        self.stats.events_dropped += outcome.dropped;
        tracing::info!(count, "Restored pending entries");
    }

    fn clear(&mut self) {
        if self.snapshot.remove() {
            tracing::debug!("Snapshot cleared");
        }
    }

    async fn shutdown(&mut self) {
        self.flush();

        while !self.in_flight.is_empty() {
            match self.rx.recv().await {
                Some(cmd) => self.handle(cmd),
                None => break,
            }
        }
    }

    /// Mirror in-flight batches followed by the live buffer to disk
    fn persist(&self) {
        let pending: Vec<Entry> = self
            .in_flight
            .values()
            .flat_map(|batch| batch.entries().iter().cloned())
            .chain(self.buffer.iter().cloned())
            .collect();

        self.snapshot.write(&pending);
    }
}
