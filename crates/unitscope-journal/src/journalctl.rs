//! Follow-mode journal reader backed by `journalctl --output=json`

use std::process::Stdio;
use std::time::Duration;

use chrono::{Local, TimeDelta};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::{LogSource, RecordStream, SourceError};
use unitscope_types::{JournalRecord, MatchSpec};

/// How long `open` waits for journalctl to either produce output or die
const STARTUP_GRACE: Duration = Duration::from_millis(200);

/// journalctl wrapper
#[derive(Clone, Debug)]
pub struct JournalCtl {
    program: String,
}

impl JournalCtl {
    pub fn new() -> Self {
        Self::with_program("journalctl")
    }

    /// Use a different journalctl binary (e.g. a wrapper script)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Build the journalctl argument list for a follow read.
    ///
    /// A look-back reaching past any representable date drops `--since`,
    /// replaying the whole journal.
    fn follow_args(spec: &MatchSpec, since: Duration) -> Vec<String> {
        let since_at = TimeDelta::from_std(since)
            .ok()
            .and_then(|horizon| Local::now().checked_sub_signed(horizon));

        let mut args = vec![
            "--follow".to_string(),
            "--output=json".to_string(),
            "--no-pager".to_string(),
            "--lines=all".to_string(),
        ];
        if let Some(at) = since_at {
            args.push(format!("--since={}", at.format("%Y-%m-%d %H:%M:%S")));
        }
        args.extend(spec.clauses().iter().map(|c| c.to_string()));
        args
    }
}

impl Default for JournalCtl {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSource for JournalCtl {
    fn open<'a>(
        &'a self,
        spec: &'a MatchSpec,
        since: Duration,
    ) -> BoxFuture<'a, Result<RecordStream, SourceError>> {
        Box::pin(async move {
            let args = Self::follow_args(spec, since);
            tracing::debug!(program = %self.program, ?args, "opening journal reader");

            let mut child = Command::new(&self.program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| SourceError::Spawn {
                    program: self.program.clone(),
                    source,
                })?;

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| SourceError::Command("journalctl stdout not captured".into()))?;
            let mut stderr = collect_stderr(&mut child);
            let mut lines = BufReader::new(stdout).lines();

            // Bad matches or an unreadable journal make journalctl exit
            // right away; surface that as an open failure.
            let first = tokio::select! {
                line = lines.next_line() => Some(line),
                _ = tokio::time::sleep(STARTUP_GRACE) => None,
            };
            let first = match first {
                Some(Ok(None)) => {
                    if let Some(e) = exit_failure(&self.program, &mut child, stderr.take()).await {
                        return Err(e);
                    }
                    None
                }
                Some(Ok(Some(line))) => Some(line),
                Some(Err(e)) => return Err(SourceError::Io(e)),
                None => None,
            };

            let reader = Reader {
                program: self.program.clone(),
                child,
                lines,
                stderr,
                pending: first,
                done: false,
            };

            // The child rides along in the stream state so dropping the
            // stream kills the reader process.
            let stream = futures::stream::unfold(reader, |mut reader| async move {
                let item = reader.next().await?;
                Some((item, reader))
            });

            Ok(Box::pin(stream) as RecordStream)
        })
    }
}

/// State of one running journalctl follow read
struct Reader {
    program: String,
    child: Child,
    lines: tokio::io::Lines<BufReader<tokio::process::ChildStdout>>,
    stderr: Option<JoinHandle<String>>,
    /// Line read while checking startup
    pending: Option<String>,
    done: bool,
}

impl Reader {
    async fn next(&mut self) -> Option<Result<JournalRecord, SourceError>> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.pending.take() {
                Some(line) => Ok(Some(line)),
                None => self.lines.next_line().await,
            };
            match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => return Some(decode_entry(&line)),
                Ok(None) => {
                    // A clean exit is expiry; anything else carries its reason
                    self.done = true;
                    return exit_failure(&self.program, &mut self.child, self.stderr.take())
                        .await
                        .map(Err);
                }
                Err(e) => return Some(Err(SourceError::Io(e))),
            }
        }
    }
}

/// Drain the child's stderr in the background so it can never block
fn collect_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let stderr = child.stderr.take()?;
    Some(tokio::spawn(async move {
        let mut text = String::new();
        if let Err(e) = BufReader::new(stderr).read_to_string(&mut text).await {
            tracing::debug!(error = %e, "failed to read journalctl stderr");
        }
        text
    }))
}

/// Reap a reader whose stdout has closed.
///
/// Returns `None` for a successful exit, otherwise the failure with the
/// trimmed stderr as its reason.
async fn exit_failure(
    program: &str,
    child: &mut Child,
    stderr: Option<JoinHandle<String>>,
) -> Option<SourceError> {
    let status = match child.wait().await {
        Ok(status) => status,
        Err(e) => return Some(SourceError::Io(e)),
    };
    if status.success() {
        return None;
    }

    let reason = match stderr {
        Some(task) => task.await.unwrap_or_default(),
        None => String::new(),
    };
    let reason = reason.trim();
    Some(SourceError::Command(if reason.is_empty() {
        format!("{} exited with {}", program, status)
    } else {
        reason.to_string()
    }))
}

/// Decode one line of `journalctl --output=json`
pub(crate) fn decode_entry(line: &str) -> Result<JournalRecord, SourceError> {
    let object: Map<String, Value> = serde_json::from_str(line)?;

    let realtime_us = object
        .get("__REALTIME_TIMESTAMP")
        .and_then(field_value)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    let mut record = JournalRecord::new(realtime_us);
    for (key, value) in &object {
        if let Some(v) = field_value(value) {
            record.fields.insert(key.clone(), v);
        }
    }

    Ok(record)
}

/// Journal JSON encodes non-UTF-8 values as byte arrays and repeated
/// fields as arrays of values; oversized fields come through as null.
fn field_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.iter().all(Value::is_u64) => {
            let bytes: Vec<u8> = items
                .iter()
                .filter_map(Value::as_u64)
                .map(|b| b as u8)
                .collect();
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        Value::Array(items) => items.first().and_then(field_value),
        _ => None,
    }
}
