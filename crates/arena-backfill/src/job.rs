//! The backfill pass: read records, publish them in batches, report.

use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use arena_core::LivestreamRecord;

use crate::error::BackfillResult;
use crate::publisher::MessagePublisher;
use crate::record::parse_record;

/// Totals for one backfill pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Server ids of published messages, in input order.
    pub message_ids: Vec<String>,
    /// Lines skipped as malformed.
    pub skipped: usize,
    /// Records whose batch failed to publish.
    pub failed: usize,
}

impl BackfillReport {
    pub fn published(&self) -> usize {
        self.message_ids.len()
    }
}

pub struct Backfill<'a> {
    publisher: &'a dyn MessagePublisher,
    batch_size: usize,
}

impl<'a> Backfill<'a> {
    pub fn new(publisher: &'a dyn MessagePublisher, batch_size: usize) -> Self {
        Self {
            publisher,
            batch_size: batch_size.max(1),
        }
    }

    pub async fn run_file(&self, path: &Path) -> BackfillResult<BackfillReport> {
        let file = tokio::fs::File::open(path).await?;
        info!(path = %path.display(), "starting backfill");
        self.run(BufReader::new(file)).await
    }

    /// Publish every record after the header line.
    ///
    /// Lines that are not UTF-8 are skipped like any other malformed
    /// record. A read error aborts the pass after the pending batch is
    /// flushed.
    pub async fn run<R>(&self, mut reader: R) -> BackfillResult<BackfillReport>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut report = BackfillReport::default();
        let mut batch: Vec<Vec<u8>> = Vec::with_capacity(self.batch_size);
        let mut buf = Vec::new();

        if reader.read_until(b'\n', &mut buf).await? == 0 {
            warn!("input is empty");
            return Ok(report);
        }

        let mut line_no = 1;
        loop {
            buf.clear();
            let read = match reader.read_until(b'\n', &mut buf).await {
                Ok(read) => read,
                Err(e) => {
                    self.flush(&mut batch, &mut report).await;
                    warn!(
                        line = line_no + 1,
                        published = report.published(),
                        error = %e,
                        "input read failed, aborting"
                    );
                    return Err(e.into());
                }
            };
            if read == 0 {
                break;
            }
            line_no += 1;

            let Some(data) = decode_line(line_no, &buf).and_then(|line| encode_line(line_no, line))
            else {
                report.skipped += 1;
                continue;
            };
            batch.push(data);
            if batch.len() == self.batch_size {
                self.flush(&mut batch, &mut report).await;
            }
        }
        self.flush(&mut batch, &mut report).await;

        info!(
            published = report.published(),
            skipped = report.skipped,
            failed = report.failed,
            "backfill finished"
        );
        Ok(report)
    }

    async fn flush(&self, batch: &mut Vec<Vec<u8>>, report: &mut BackfillReport) {
        if batch.is_empty() {
            return;
        }
        let first = report.published() + report.failed;
        match self.publisher.publish_batch(batch).await {
            Ok(ids) => {
                for (offset, id) in ids.iter().enumerate() {
                    info!(message = first + offset, id = %id, "published message");
                }
                report.message_ids.extend(ids);
            }
            Err(e) => {
                warn!(
                    first_message = first,
                    count = batch.len(),
                    error = %e,
                    "failed to publish batch"
                );
                report.failed += batch.len();
            }
        }
        batch.clear();
    }
}

fn decode_line(line_no: usize, raw: &[u8]) -> Option<&str> {
    match std::str::from_utf8(raw) {
        Ok(line) => Some(line.trim_end_matches(['\n', '\r'])),
        Err(e) => {
            warn!(line = line_no, error = %e, "skipping line that is not UTF-8");
            None
        }
    }
}

fn encode_line(line_no: usize, line: &str) -> Option<Vec<u8>> {
    let record: LivestreamRecord = match parse_record(line) {
        Ok(record) => record,
        Err(e) => {
            warn!(line = line_no, error = %e, "skipping invalid record");
            return None;
        }
    };
    match serde_json::to_vec(&record) {
        Ok(data) => Some(data),
        Err(e) => {
            warn!(line = line_no, livestream_id = %record.livestream_id, error = %e, "failed to encode record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context as TaskContext, Poll};

    use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

    use async_trait::async_trait;

    use crate::error::{PublishError, PublishResult};

    /// Assigns sequential ids; fails the batches listed in `fail`.
    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Vec<Vec<u8>>>>,
        fail: Vec<usize>,
    }

    #[async_trait]
    impl MessagePublisher for Recorder {
        async fn publish_batch(&self, messages: &[Vec<u8>]) -> PublishResult<Vec<String>> {
            let mut batches = self.batches.lock().unwrap();
            let index = batches.len();
            let already: usize = batches.iter().map(Vec::len).sum();
            batches.push(messages.to_vec());
            if self.fail.contains(&index) {
                return Err(PublishError::Status {
                    status: 503,
                    body: String::new(),
                });
            }
            Ok((0..messages.len()).map(|i| format!("id-{}", already + i)).collect())
        }
    }

    const INPUT: &str = "livestream_id  start_time  end_time
ls-1  100  200
garbage
ls-2  abc  300
ls-3  300  400
";

    #[tokio::test]
    async fn skips_header_and_bad_lines() {
        let recorder = Recorder::default();
        let report = Backfill::new(&recorder, 10).run(INPUT.as_bytes()).await.unwrap();

        assert_eq!(report.published(), 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 0);

        let batches = recorder.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let first: serde_json::Value = serde_json::from_slice(&batches[0][0]).unwrap();
        assert_eq!(
            first,
            serde_json::json!({"livestreamId": "ls-1", "startTime": 100, "endTime": 200})
        );
    }

    #[tokio::test]
    async fn batches_respect_batch_size() {
        let input = "header\na  1  2\nb  3  4\nc  5  6\n";
        let recorder = Recorder::default();
        let report = Backfill::new(&recorder, 2).run(input.as_bytes()).await.unwrap();

        assert_eq!(report.message_ids, ["id-0", "id-1", "id-2"]);
        let sizes: Vec<usize> = recorder.batches.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, [2, 1]);
    }

    #[tokio::test]
    async fn failed_batch_is_counted_and_pass_continues() {
        let input = "header\na  1  2\nb  3  4\nc  5  6\n";
        let recorder = Recorder {
            fail: vec![0],
            ..Recorder::default()
        };
        let report = Backfill::new(&recorder, 2).run(input.as_bytes()).await.unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.message_ids, ["id-2"]);
    }

    #[tokio::test]
    async fn header_only_publishes_nothing() {
        let recorder = Recorder::default();
        let report = Backfill::new(&recorder, 10)
            .run("livestream_id  start  end\n".as_bytes())
            .await
            .unwrap();

        assert_eq!(report, BackfillReport::default());
        assert!(recorder.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_utf8_line_is_skipped_not_fatal() {
        let input: &[u8] = b"header\na  1  2\nb  3  4\nc\xff  5  6\nd  7  8\n";
        let recorder = Recorder::default();
        let report = Backfill::new(&recorder, 10).run(input).await.unwrap();

        assert_eq!(report.published(), 3);
        assert_eq!(report.skipped, 1);
        let ids: Vec<String> = recorder.batches.lock().unwrap()[0]
            .iter()
            .map(|data| serde_json::from_slice::<LivestreamRecord>(data).unwrap().livestream_id)
            .collect();
        assert_eq!(ids, ["a", "b", "d"]);
    }

    #[tokio::test]
    async fn crlf_line_endings_are_stripped() {
        let input: &[u8] = b"header\r\na  1  2\r\nb  3  4";
        let recorder = Recorder::default();
        let report = Backfill::new(&recorder, 10).run(input).await.unwrap();

        assert_eq!(report.published(), 2);
        assert_eq!(report.skipped, 0);
    }

    /// Fails every read.
    struct BrokenDisk;

    impl AsyncRead for BrokenDisk {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn read_error_flushes_pending_records_first() {
        let head: &[u8] = b"header\na  1  2\nb  3  4\n";
        let recorder = Recorder::default();
        let err = Backfill::new(&recorder, 10)
            .run(BufReader::new(head.chain(BrokenDisk)))
            .await
            .unwrap_err();

        assert!(matches!(err, crate::error::BackfillError::Io(_)));
        let batches = recorder.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test]
    async fn empty_input_is_not_an_error() {
        let recorder = Recorder::default();
        let report = Backfill::new(&recorder, 10).run("".as_bytes()).await.unwrap();
        assert_eq!(report.published(), 0);
    }
}
