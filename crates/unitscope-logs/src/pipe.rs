use std::time::Duration;

use chrono::{DateTime, Local};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::filter::SearchFilter;
use crate::format::{LogPalette, format_record, strip_ansi};
use crate::lines::LineAssembler;
use unitscope_journal::{LogSource, RecordStream, SourceError};
use unitscope_types::MatchSpec;

/// Delivery channel capacity (lines)
pub const DEFAULT_CAPACITY: usize = 1024;

/// How far back a new pipeline replays before following
pub const DEFAULT_SINCE: Duration = Duration::from_secs(24 * 60 * 60);

/// Delay between pump drain cycles
pub const DEFAULT_PUMP_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum PipeError {
    #[error("failed to open log source: {0}")]
    Open(#[source] SourceError),
    #[error("invalid search term: {0}")]
    Filter(#[from] regex::Error),
    #[error("log source expired while following")]
    Expired,
    #[error("log source failed: {0}")]
    Source(#[source] SourceError),
    #[error("delivery channel already attached to a consumer")]
    Detached,
    #[error("display stopped consuming the log")]
    ConsumerGone,
    #[error("pipeline task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// A fatal pipeline exit, reported to whoever owns the view
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipeFault {
    pub view: String,
    /// Generation of the pipeline that failed
    pub generation: u64,
    pub message: String,
}

/// Construction-time settings for pipelines
#[derive(Clone, Debug)]
pub struct PipeOptions {
    /// View label used in logs and fault reports
    pub view: String,
    pub capacity: usize,
    pub since: Duration,
    pub pump_interval: Duration,
    pub palette: LogPalette,
    /// Where fatal exits are reported (None = log only)
    pub faults: Option<mpsc::UnboundedSender<PipeFault>>,
    /// Tag copied into this pipeline's faults
    pub generation: u64,
}

impl Default for PipeOptions {
    fn default() -> Self {
        Self {
            view: "log".to_string(),
            capacity: DEFAULT_CAPACITY,
            since: DEFAULT_SINCE,
            pump_interval: DEFAULT_PUMP_INTERVAL,
            palette: LogPalette::default(),
            faults: None,
            generation: 0,
        }
    }
}

/// One live follow-read-filter-deliver unit of work.
///
/// The reader task owns the journal stream and the sending half of the
/// delivery channel; both are dropped before the task completes, so a
/// finished task always means a closed channel.
pub struct LogPipe {
    /// Cancels the reader, also fired if the pipe is dropped.
    /// Declared first so it fires before `rx` closes.
    guard: DropGuard,

    /// Receiving half until a consumer takes it
    rx: Option<mpsc::Receiver<Vec<u8>>>,

    cancel: CancellationToken,
    cancelled_at: Option<DateTime<Local>>,

    /// Shutdown handle
    task: JoinHandle<Result<(), PipeError>>,
}

impl LogPipe {
    /// Open the source for `spec` and start the reader task.
    ///
    /// Open failures are returned as-is; nothing is retried.
    pub async fn start(
        source: &dyn LogSource,
        spec: MatchSpec,
        search: SearchFilter,
        options: &PipeOptions,
    ) -> Result<Self, PipeError> {
        let stream = source
            .open(&spec, options.since)
            .await
            .map_err(PipeError::Open)?;

        let (tx, rx) = mpsc::channel(options.capacity.max(1));
        let cancel = CancellationToken::new();

        tracing::debug!(
            view = %options.view,
            clauses = spec.len(),
            search = %search.term(),
            "starting log pipeline"
        );

        let reader = PipeReader {
            stream,
            tx,
            cancel: cancel.clone(),
            search,
            palette: options.palette.clone(),
            assembler: LineAssembler::new(),
        };

        let view = options.view.clone();
        let generation = options.generation;
        let faults = options.faults.clone();
        let task = tokio::spawn(async move {
            let result = reader.run().await;
            if let Err(e) = &result {
                tracing::error!(view = %view, error = %e, "log pipeline stopped");
                if let Some(faults) = faults {
                    let _ = faults.send(PipeFault {
                        view,
                        generation,
                        message: e.to_string(),
                    });
                }
            }
            result
        });

        Ok(Self {
            guard: cancel.clone().drop_guard(),
            rx: Some(rx),
            cancel,
            cancelled_at: None,
            task,
        })
    }

    /// Hand the delivery channel to its single consumer
    pub fn take_receiver(&mut self) -> Option<mpsc::Receiver<Vec<u8>>> {
        self.rx.take()
    }

    /// Signal the reader to stop. Only the first call has any effect;
    /// returns whether this call sent the signal.
    pub fn cancel(&mut self) -> bool {
        if self.cancelled_at.is_some() {
            return false;
        }
        self.cancelled_at = Some(Local::now());
        self.cancel.cancel();
        true
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Local>> {
        self.cancelled_at
    }

    /// True once the reader has exited and the channel is closed
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the reader to exit.
    ///
    /// `Ok` means it stopped because it was cancelled.
    pub async fn wait(self) -> Result<(), PipeError> {
        let LogPipe { guard, task, .. } = self;
        let _ = guard.disarm();
        task.await?
    }
}

/// The reader half of a pipeline, moved into its task
struct PipeReader {
    stream: RecordStream,
    tx: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
    search: SearchFilter,
    palette: LogPalette,
    assembler: LineAssembler,
}

impl PipeReader {
    async fn run(mut self) -> Result<(), PipeError> {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                _ = self.tx.closed() => return self.consumer_gone(),
                next = self.stream.next() => next,
            };

            let record = match next {
                Some(Ok(record)) => record,
                Some(Err(e)) => return Err(PipeError::Source(e)),
                None => return Err(PipeError::Expired),
            };

            let rendered = format_record(&record, &self.palette);
            for line in self.assembler.push(rendered.as_bytes()) {
                if !self.search.matches(&strip_ansi(&line)) {
                    continue;
                }

                // Backpressure: a full channel stalls the reader
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Ok(()),
                    sent = self.tx.send(line) => {
                        if sent.is_err() {
                            return self.consumer_gone();
                        }
                    }
                }
            }
        }
    }

    /// The receiver went away; only a cancelled pipeline may lose it quietly
    fn consumer_gone(&self) -> Result<(), PipeError> {
        if self.cancel.is_cancelled() {
            return Ok(());
        }
        Err(PipeError::ConsumerGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use unitscope_journal::JournalCtl;
    use unitscope_journal::fake::FakeJournal;
    use unitscope_types::JournalRecord;

    fn record(message: &str) -> JournalRecord {
        JournalRecord::new(1_700_000_000_000_000)
            .with_field("PRIORITY", "6")
            .with_field("SYSLOG_IDENTIFIER", "app")
            .with_field("MESSAGE", message)
    }

    fn visible(line: &[u8]) -> String {
        String::from_utf8(strip_ansi(line).into_owned()).unwrap()
    }

    async fn start(journal: &FakeJournal, search: &str, capacity: usize) -> LogPipe {
        let options = PipeOptions {
            capacity,
            ..Default::default()
        };
        LogPipe::start(
            journal,
            MatchSpec::default(),
            SearchFilter::new(search).unwrap(),
            &options,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_delivers_formatted_lines() {
        let journal = FakeJournal::new().with_history(vec![record("one"), record("two")]);
        let mut pipe = start(&journal, "", DEFAULT_CAPACITY).await;
        let mut rx = pipe.take_receiver().unwrap();

        assert!(visible(&rx.recv().await.unwrap()).ends_with("app one\n"));
        assert!(visible(&rx.recv().await.unwrap()).ends_with("app two\n"));
        assert!(pipe.take_receiver().is_none());
    }

    #[tokio::test]
    async fn test_search_filters_lines() {
        let history = vec![record("ERROR one"), record("fine"), record("ERROR two")];
        let journal = FakeJournal::new().with_history(history);
        let mut pipe = start(&journal, "ERROR", DEFAULT_CAPACITY).await;
        let mut rx = pipe.take_receiver().unwrap();

        assert!(visible(&rx.recv().await.unwrap()).ends_with("ERROR one\n"));
        assert!(visible(&rx.recv().await.unwrap()).ends_with("ERROR two\n"));

        pipe.cancel();
        pipe.wait().await.unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_multiline_message_splits_into_lines() {
        let journal = FakeJournal::new().with_history(vec![record("first\nsecond")]);
        let mut pipe = start(&journal, "", DEFAULT_CAPACITY).await;
        let mut rx = pipe.take_receiver().unwrap();

        assert!(visible(&rx.recv().await.unwrap()).ends_with("app first\n"));
        assert_eq!(visible(&rx.recv().await.unwrap()), "second\n");
    }

    #[tokio::test]
    async fn test_cancel_closes_channel_once() {
        let journal = FakeJournal::new();
        let mut pipe = start(&journal, "", DEFAULT_CAPACITY).await;
        let mut rx = pipe.take_receiver().unwrap();
        let feed = journal.last_feed().unwrap();

        assert!(pipe.cancel());
        assert!(!pipe.cancel());
        assert!(pipe.cancelled_at().is_some());

        pipe.wait().await.unwrap();
        assert!(feed.is_closed());
        assert!(rx.recv().await.is_none());
        assert!(!feed.send(record("late")));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_while_blocked_on_full_channel() {
        let history = (0..8).map(|i| record(&format!("line {}", i))).collect();
        let journal = FakeJournal::new().with_history(history);
        let mut pipe = start(&journal, "", 1).await;
        let _rx = pipe.take_receiver().unwrap();

        // Reader is parked on send with nobody draining
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pipe.is_finished());

        pipe.cancel();
        tokio::time::timeout(Duration::from_secs(1), pipe.wait())
            .await
            .expect("reader did not observe cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn test_backpressure_does_not_drop() {
        let history = (0..50).map(|i| record(&format!("line {}", i))).collect();
        let journal = FakeJournal::new().with_history(history);
        let mut pipe = start(&journal, "", 2).await;
        let mut rx = pipe.take_receiver().unwrap();

        for i in 0..50 {
            let line = rx.recv().await.unwrap();
            assert!(visible(&line).ends_with(&format!("line {}\n", i)));
            if i % 10 == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        }
        pipe.cancel();
        pipe.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_expiry_is_fatal_and_reported() {
        let journal = FakeJournal::new();
        let (fault_tx, mut fault_rx) = mpsc::unbounded_channel();
        let options = PipeOptions {
            view: "main".to_string(),
            faults: Some(fault_tx),
            ..Default::default()
        };
        let mut pipe = LogPipe::start(
            &journal,
            MatchSpec::default(),
            SearchFilter::new("").unwrap(),
            &options,
        )
        .await
        .unwrap();
        let mut rx = pipe.take_receiver().unwrap();

        journal.last_feed().unwrap().finish();

        assert!(rx.recv().await.is_none());
        assert!(matches!(pipe.wait().await, Err(PipeError::Expired)));

        let fault = fault_rx.recv().await.unwrap();
        assert_eq!(fault.view, "main");
        assert!(fault.message.contains("expired"));
    }

    #[tokio::test]
    async fn test_source_error_is_fatal() {
        let journal = FakeJournal::new();
        let mut pipe = start(&journal, "", DEFAULT_CAPACITY).await;
        let _rx = pipe.take_receiver().unwrap();

        journal.last_feed().unwrap().fail("journal rotated away");
        assert!(matches!(pipe.wait().await, Err(PipeError::Source(_))));
    }

    #[tokio::test]
    async fn test_open_failure_propagates() {
        let journal = Arc::new(FakeJournal::new());
        journal.fail_next_open("permission denied");

        let result = LogPipe::start(
            journal.as_ref(),
            MatchSpec::default(),
            SearchFilter::new("").unwrap(),
            &PipeOptions::default(),
        )
        .await;

        match result {
            Err(PipeError::Open(e)) => assert_eq!(e.to_string(), "permission denied"),
            other => panic!("expected open error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_lost_consumer_is_reported() {
        let journal = FakeJournal::new();
        let (fault_tx, mut fault_rx) = mpsc::unbounded_channel();
        let options = PipeOptions {
            view: "main".to_string(),
            faults: Some(fault_tx),
            generation: 7,
            ..Default::default()
        };
        let mut pipe = LogPipe::start(
            &journal,
            MatchSpec::default(),
            SearchFilter::new("").unwrap(),
            &options,
        )
        .await
        .unwrap();

        drop(pipe.take_receiver());

        assert!(matches!(pipe.wait().await, Err(PipeError::ConsumerGone)));
        let fault = fault_rx.recv().await.unwrap();
        assert_eq!(fault.generation, 7);
        assert!(journal.last_feed().unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_failed_journalctl_start_is_open_error() {
        let result = LogPipe::start(
            &JournalCtl::with_program("false"),
            MatchSpec::default(),
            SearchFilter::new("").unwrap(),
            &PipeOptions::default(),
        )
        .await;

        assert!(matches!(result, Err(PipeError::Open(SourceError::Command(_)))));
    }

    #[tokio::test]
    async fn test_dropping_pipe_stops_reader() {
        let journal = FakeJournal::new();
        let pipe = start(&journal, "", DEFAULT_CAPACITY).await;
        let feed = journal.last_feed().unwrap();

        drop(pipe);
        tokio::time::timeout(Duration::from_secs(1), async {
            while !feed.is_closed() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("reader kept running after drop");
    }
}
