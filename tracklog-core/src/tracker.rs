//! Hierarchical event sources
//!
//! A [`Tracker`] is an immutable path of segments bound to a collector.
//! Children extend the path without touching the parent, so a screen can
//! hand out trackers to its subviews freely:
//!
//! ```text
//! weather                     root.child("weather")
//! weather.list                  .child("list")
//! weather.list.:3f9a0c2e7d41    .chain(None)        one per instance
//! ```

use std::marker::PhantomData;

use crate::collector::Collector;
use crate::event::Event;

/// Forwards typed events to a collector under a dotted source path
pub struct Tracker<E> {
    path: Vec<String>,
    collector: Collector,
    _event: PhantomData<fn(&E)>,
}

impl<E: Event> Tracker<E> {
    /// Tracker with an empty path
    pub fn root(collector: Collector) -> Self {
        Self::with_path(Vec::new(), collector)
    }

    pub fn with_path(path: Vec<String>, collector: Collector) -> Self {
        Self {
            path,
            collector,
            _event: PhantomData,
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Segments joined with `.`
    pub fn identifier(&self) -> String {
        self.path.join(".")
    }

    pub fn track(&self, event: &E) {
        self.collector.collect(self.identifier(), event);
    }

    /// New tracker one segment deeper, possibly for a different event type
    pub fn child<F: Event>(&self, segment: impl Into<String>) -> Tracker<F> {
        let mut path = self.path.clone();
        path.push(segment.into());
        Tracker::with_path(path, self.collector.clone())
    }

    /// Child with a random `:xxxxxxxxxxxx` segment, optionally prefixed
    pub fn chain<F: Event>(&self, prefix: Option<&str>) -> Tracker<F> {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        let id = format!(":{}", &simple[simple.len() - 12..]);

        match prefix {
            Some(prefix) => self.child(format!("{}-{}", prefix, id)),
            None => self.child(id),
        }
    }
}

impl<E> Clone for Tracker<E> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            collector: self.collector.clone(),
            _event: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Tracker<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollectorConfig;
    use crate::entry::Entry;
    use crate::event::SimpleEvent;
    use crate::identity::InMemoryIdentityStorage;
    use crate::transport::Transport;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send(&self, _identity: &str, _batch: &[Entry]) -> crate::Result<()> {
            Ok(())
        }
    }

    fn collector() -> (TempDir, Collector) {
        let dir = TempDir::new().unwrap();
        let config = CollectorConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let collector = Collector::with_transport(
            &config,
            Arc::new(InMemoryIdentityStorage::new()),
            Arc::new(NullTransport),
        )
        .unwrap();
        (dir, collector)
    }

    #[tokio::test]
    async fn test_child_extends_path_without_mutating_parent() {
        let (_dir, collector) = collector();
        let root: Tracker<SimpleEvent> = Tracker::root(collector);
        let weather: Tracker<SimpleEvent> = root.child("weather");
        let list: Tracker<SimpleEvent> = weather.child("list");

        assert_eq!(root.identifier(), "");
        assert_eq!(weather.identifier(), "weather");
        assert_eq!(list.identifier(), "weather.list");
        assert_eq!(list.path().len(), 2);
    }

    #[tokio::test]
    async fn test_chain_appends_unique_segment() {
        let (_dir, collector) = collector();
        let root: Tracker<SimpleEvent> = Tracker::<SimpleEvent>::root(collector).child("app");
        let a: Tracker<SimpleEvent> = root.chain(None);
        let b: Tracker<SimpleEvent> = root.chain(Some("station"));

        let a_segment = a.path().last().unwrap();
        assert!(a_segment.starts_with(':'));
        assert_eq!(a_segment.len(), 13);
        assert!(a_segment[1..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let b_segment = b.path().last().unwrap();
        assert!(b_segment.starts_with("station-:"));
        assert_ne!(root.chain::<SimpleEvent>(None).identifier(), a.identifier());
    }

    #[tokio::test]
    async fn test_track_forwards_identifier() {
        let (_dir, collector) = collector();
        let tracker: Tracker<SimpleEvent> = Tracker::<SimpleEvent>::root(collector.clone())
            .child::<SimpleEvent>("a")
            .child("b");

        tracker.track(&SimpleEvent::new("view").with_param("screen", "home"));

        let pending = collector.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].source_id, "a.b");
        assert_eq!(pending[0].kind, "view");

        collector.shutdown().await.unwrap();
    }
}
