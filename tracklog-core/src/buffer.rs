//! Bounded in-memory queue of pending entries

use std::collections::VecDeque;
use std::sync::Arc;

use crate::entry::Entry;

/// Arrival-ordered pending entries with a soft flush threshold and a hard cap
///
/// After every [`push`](Buffer::push) the length is at most `foolproof`.
/// Overflow keeps the newest `foolproof - 1` entries and appends a single
/// overflow marker.
///
/// Every entry carries its arrival sequence number, which survives a round
/// trip through [`take`](Buffer::take) and [`requeue`](Buffer::requeue).
#[derive(Debug)]
pub struct Buffer {
    entries: VecDeque<(u64, Entry)>,
    next_seq: u64,
    flush_limit: usize,
    foolproof: usize,
}

/// What happened to the buffer on an append or requeue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushOutcome {
    /// Entries discarded to stay within the hard cap
    pub dropped: usize,
}

/// Entries detached by [`Buffer::take`]
#[derive(Debug, Clone)]
pub struct Batch {
    seqs: Vec<u64>,
    entries: Arc<[Entry]>,
}

impl Batch {
    pub fn entries(&self) -> &Arc<[Entry]> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Buffer {
    pub fn new(flush_limit: usize, foolproof: usize) -> Self {
        debug_assert!(flush_limit < foolproof);
        Self {
            entries: VecDeque::with_capacity(foolproof.min(1024)),
            next_seq: 0,
            flush_limit,
            foolproof,
        }
    }

    /// Append an entry, trimming the oldest entries on overflow
    pub fn push(&mut self, entry: Entry) -> PushOutcome {
        let seq = self.next_seq();
        self.entries.push_back((seq, entry));
        self.enforce_bound()
    }

    /// Whether the length is strictly above the flush threshold
    pub fn should_flush(&self) -> bool {
        self.entries.len() > self.flush_limit
    }

    /// Detach the whole contents as a batch, leaving the buffer empty
    pub fn take(&mut self) -> Batch {
        let (seqs, entries): (Vec<u64>, Vec<Entry>) =
            std::mem::take(&mut self.entries).into_iter().unzip();
        Batch {
            seqs,
            entries: entries.into(),
        }
    }

    /// Put a failed batch back where its entries arrived
    ///
    /// The batch is merged by arrival sequence, so it lands after any older
    /// requeued entries and ahead of everything collected since it left.
    pub fn requeue(&mut self, batch: Batch) -> PushOutcome {
        let mut live = std::mem::take(&mut self.entries).into_iter().peekable();
        let mut merged = VecDeque::with_capacity(live.len() + batch.len());

        for (seq, entry) in batch.seqs.into_iter().zip(batch.entries.iter().cloned()) {
            while let Some(older) = live.next_if(|(s, _)| *s < seq) {
                merged.push_back(older);
            }
            merged.push_back((seq, entry));
        }
        merged.extend(live);

        self.entries = merged;
        self.enforce_bound()
    }

    /// Replace the contents, e.g. with a restored snapshot
    pub fn replace(&mut self, entries: Vec<Entry>) -> PushOutcome {
        self.entries.clear();
        for entry in entries {
            let seq = self.next_seq();
            self.entries.push_back((seq, entry));
        }
        self.enforce_bound()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().map(|(_, entry)| entry)
    }

    pub fn to_vec(&self) -> Vec<Entry> {
        self.iter().cloned().collect()
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn enforce_bound(&mut self) -> PushOutcome {
        if self.entries.len() <= self.foolproof {
            return PushOutcome::default();
        }

        let dropped = self.entries.len() - (self.foolproof - 1);
        self.entries.drain(..dropped);
        let seq = self.next_seq();
        self.entries.push_back((seq, Entry::overflow_marker()));

        tracing::warn!(
            dropped,
            foolproof = self.foolproof,
            "Buffer overflow, oldest entries dropped"
        );

        PushOutcome { dropped }
    }
}
