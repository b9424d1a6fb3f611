use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("display sink failed: {0}")]
pub struct SinkError(pub String);

/// Somewhere rendered log bytes end up
pub trait DisplaySink: Send + 'static {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    fn clear(&mut self);

    fn scroll_to_end(&mut self);

    fn set_title(&mut self, title: &str);
}

/// Drain a delivery channel into a sink in batches.
///
/// Each cycle takes everything currently queued without waiting, hands it
/// to the sink in one write, then sleeps for `interval`. Returns the number
/// of bytes written once the channel is closed and empty.
pub async fn pump<S: DisplaySink>(
    mut rx: mpsc::Receiver<Vec<u8>>,
    sink: &mut S,
    interval: Duration,
) -> Result<u64, SinkError> {
    let mut written = 0u64;
    let mut batch = Vec::new();

    loop {
        let mut closed = false;
        loop {
            match rx.try_recv() {
                Ok(line) => batch.extend_from_slice(&line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }

        if !batch.is_empty() {
            sink.write(&batch)?;
            written += batch.len() as u64;
            batch.clear();
        }

        if closed {
            tracing::debug!(bytes = written, "pump finished");
            return Ok(written);
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CaptureSink {
        writes: Vec<Vec<u8>>,
        fail: bool,
    }

    impl DisplaySink for CaptureSink {
        fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
            if self.fail {
                return Err(SinkError("closed".to_string()));
            }
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        fn clear(&mut self) {
            self.writes.clear();
        }

        fn scroll_to_end(&mut self) {}

        fn set_title(&mut self, _title: &str) {}
    }

    #[tokio::test]
    async fn test_queued_lines_are_batched() {
        let (tx, rx) = mpsc::channel(16);
        for line in ["a\n", "b\n", "c\n"] {
            tx.send(line.as_bytes().to_vec()).await.unwrap();
        }
        drop(tx);

        let mut sink = CaptureSink::default();
        let written = pump(rx, &mut sink, Duration::from_millis(1)).await.unwrap();

        assert_eq!(written, 6);
        assert_eq!(sink.writes, vec![b"a\nb\nc\n".to_vec()]);
    }

    #[tokio::test]
    async fn test_pump_ends_when_channel_closes() {
        let (tx, rx) = mpsc::channel(4);
        let handle = tokio::spawn(async move {
            let mut sink = CaptureSink::default();
            let written = pump(rx, &mut sink, Duration::from_millis(1)).await;
            (written, sink.writes.concat())
        });

        tx.send(b"one\n".to_vec()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        tx.send(b"two\n".to_vec()).await.unwrap();
        drop(tx);

        let (written, bytes) = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(written.unwrap(), 8);
        assert_eq!(bytes, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn test_idle_pump_writes_nothing() {
        let (tx, rx) = mpsc::channel::<Vec<u8>>(4);
        drop(tx);

        let mut sink = CaptureSink::default();
        assert_eq!(pump(rx, &mut sink, Duration::from_millis(1)).await, Ok(0));
        assert!(sink.writes.is_empty());
    }

    #[tokio::test]
    async fn test_sink_error_stops_pump() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(b"x\n".to_vec()).await.unwrap();

        let mut sink = CaptureSink {
            fail: true,
            ..Default::default()
        };
        let result = pump(rx, &mut sink, Duration::from_millis(1)).await;
        assert_eq!(result, Err(SinkError("closed".to_string())));
    }
}
