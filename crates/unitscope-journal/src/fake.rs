//! Fake: test doubles for the journal and the unit inventory.
//!
//! [`FakeJournal`] hands out one [`FakeFeed`] per `open` call; tests push
//! records through the feed, end it, or inject errors. A feed nobody
//! writes to behaves like a reader blocked on the journal.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::{LogSource, RecordStream, SourceError, UnitInventory};
use unitscope_types::{JournalRecord, MatchSpec, UnitInfo};

type FeedItem = Result<JournalRecord, SourceError>;

/// Test-side handle on one opened reader
#[derive(Clone)]
pub struct FakeFeed {
    spec: MatchSpec,
    since: Duration,
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<FeedItem>>>>,
}

impl FakeFeed {
    /// Match clauses the reader was opened with
    pub fn spec(&self) -> &MatchSpec {
        &self.spec
    }

    pub fn since(&self) -> Duration {
        self.since
    }

    /// Deliver a record. Returns false once the reader is gone.
    pub fn send(&self, record: JournalRecord) -> bool {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(Ok(record)).is_ok(),
            None => false,
        }
    }

    /// Deliver a read error
    pub fn fail(&self, message: &str) -> bool {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(Err(SourceError::Command(message.to_string()))).is_ok(),
            None => false,
        }
    }

    /// End the stream, which the reader sees as the journal expiring
    pub fn finish(&self) {
        self.tx.lock().take();
    }

    /// True once the reader has dropped its end of the stream
    pub fn is_closed(&self) -> bool {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}

#[derive(Default)]
struct JournalState {
    history: Vec<JournalRecord>,
    fail_next_open: Option<String>,
    feeds: Vec<FakeFeed>,
}

/// In-memory journal for deterministic tests
#[derive(Default)]
pub struct FakeJournal {
    state: Mutex<JournalState>,
}

impl FakeJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records replayed into every newly opened reader
    pub fn with_history(self, history: Vec<JournalRecord>) -> Self {
        self.state.lock().history = history;
        self
    }

    /// Make the next `open` fail with the given reason
    pub fn fail_next_open(&self, reason: &str) {
        self.state.lock().fail_next_open = Some(reason.to_string());
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().feeds.len()
    }

    pub fn feed(&self, index: usize) -> Option<FakeFeed> {
        self.state.lock().feeds.get(index).cloned()
    }

    pub fn last_feed(&self) -> Option<FakeFeed> {
        self.state.lock().feeds.last().cloned()
    }
}

impl LogSource for FakeJournal {
    fn open<'a>(
        &'a self,
        spec: &'a MatchSpec,
        since: Duration,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if let Some(reason) = state.fail_next_open.take() {
                return Err(SourceError::Command(reason));
            }

            let (tx, rx) = mpsc::unbounded_channel();
            for record in &state.history {
                let _ = tx.send(Ok(record.clone()));
            }

            state.feeds.push(FakeFeed {
                spec: spec.clone(),
                since,
                tx: Arc::new(Mutex::new(Some(tx))),
            });

            let stream = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            });
            Ok(Box::pin(stream) as RecordStream)
        })
    }
}

/// In-memory unit inventory
#[derive(Default)]
pub struct FakeInventory {
    units: Mutex<Vec<UnitInfo>>,
}

impl FakeInventory {
    pub fn new(units: Vec<UnitInfo>) -> Self {
        Self {
            units: Mutex::new(units),
        }
    }

    fn set_state(&self, name: &str, active: &str, sub: &str) -> Result<(), SourceError> {
        let mut units = self.units.lock();
        let unit = units
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| SourceError::Command(format!("Unit {} not found.", name)))?;
        unit.active_state = active.to_string();
        unit.sub_state = sub.to_string();
        Ok(())
    }
}

impl UnitInventory for FakeInventory {
    fn list_units(&self) -> BoxFuture<'_, Result<Vec<UnitInfo>, SourceError>> {
        Box::pin(async move { Ok(self.units.lock().clone()) })
    }

    fn start_unit<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), SourceError>> {
        Box::pin(async move { self.set_state(name, "active", "running") })
    }

    fn stop_unit<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), SourceError>> {
        Box::pin(async move { self.set_state(name, "inactive", "dead") })
    }
}
