//! Source trait: abstract interface over a follow-mode log reader.
//!
//! `journalctl.rs` provides the real implementation.
//! `fake.rs` provides a test double.

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use futures::future::BoxFuture;

use crate::SourceError;
use unitscope_types::{JournalRecord, MatchSpec};

/// Records in arrival order. The stream ending means the source expired.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<JournalRecord, SourceError>> + Send>>;

/// A log source that can be tailed under a set of match clauses.
///
/// Object-safe thanks to boxed futures, so a switcher can hold it as
/// `Arc<dyn LogSource>`.
pub trait LogSource: Send + Sync {
    /// Open a follow-mode reader scoped to `spec`, replaying entries no
    /// older than `since` before following new ones.
    fn open<'a>(
        &'a self,
        spec: &'a MatchSpec,
        since: Duration,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>>;
}
