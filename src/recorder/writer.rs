//! Event log writer
//!
//! Single consumer of the capture queue. Each dequeued event becomes one JSON line,
//! appended and flushed before the next is taken. The drain loop ends when every
//! sending side of the queue is gone, after everything already queued is written.

use crate::capture::input::InputEvent;
use crossbeam_channel::Receiver;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::thread::JoinHandle;

pub const EVENTS_FILENAME: &str = "events.jsonl";

/// Outcome of a drain loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub written: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

pub struct EventLogWriter<W: Write> {
    sink: W,
    report: DrainReport,
}

impl EventLogWriter<BufWriter<File>> {
    /// Open `path` for appending, creating it if needed.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EventLogWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            report: DrainReport::default(),
        }
    }

    /// Serialize one event as a line and flush it.
    pub fn append(&mut self, event: &InputEvent) -> io::Result<()> {
        let mut line = serde_json::to_vec(event).map_err(io::Error::from)?;
        line.push(b'\n');
        self.sink.write_all(&line)?;
        self.sink.flush()
    }

    /// Write every event received until the queue disconnects.
    pub fn drain(mut self, queue: Receiver<InputEvent>) -> DrainReport {
        for event in queue.iter() {
            match self.append(&event) {
                Ok(()) => self.report.written += 1,
                Err(err) => {
                    self.report.failed += 1;
                    tracing::warn!(action = event.kind.action(), "Failed to append event: {}", err);
                    self.report.last_error = Some(err.to_string());
                }
            }
        }
        if let Err(err) = self.sink.flush() {
            self.report.last_error = Some(err.to_string());
        }
        tracing::info!(
            written = self.report.written,
            failed = self.report.failed,
            "Event log writer drained"
        );
        self.report
    }
}

/// Run the drain loop on a dedicated thread.
pub fn spawn_writer<W>(writer: EventLogWriter<W>, queue: Receiver<InputEvent>) -> io::Result<JoinHandle<DrainReport>>
where
    W: Write + Send + 'static,
{
    std::thread::Builder::new()
        .name("event-log-writer".to_string())
        .spawn(move || writer.drain(queue))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::{CaptureGate, EventKind, InputClass};
    use crossbeam_channel::{bounded, unbounded};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn events(&self) -> Vec<InputEvent> {
            let data = self.0.lock().clone();
            String::from_utf8(data)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_drain_writes_one_line_per_event() {
        let buf = SharedBuf::default();
        let (tx, rx) = unbounded();
        tx.send(InputEvent::new(0.1, EventKind::Move { x: 1.0, y: 1.0 })).unwrap();
        tx.send(InputEvent::new(0.2, EventKind::Pause)).unwrap();
        drop(tx);

        let report = EventLogWriter::new(buf.clone()).drain(rx);
        assert_eq!(report.written, 2);
        let events = buf.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].kind, EventKind::Pause);
    }

    #[test]
    fn test_write_failures_are_counted_not_fatal() {
        let (tx, rx) = unbounded();
        tx.send(InputEvent::new(0.1, EventKind::Resume)).unwrap();
        drop(tx);

        let report = EventLogWriter::new(FailingSink).drain(rx);
        assert_eq!(report.written, 0);
        assert_eq!(report.failed, 1);
        assert!(report.last_error.unwrap().contains("disk full"));
    }

    #[test]
    fn test_file_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EVENTS_FILENAME);
        let mut writer = EventLogWriter::create(&path).unwrap();
        writer
            .append(&InputEvent::new(1.0, EventKind::Press { name: "a".into() }))
            .unwrap();
        drop(writer);

        let mut writer = EventLogWriter::create(&path).unwrap();
        writer
            .append(&InputEvent::new(2.0, EventKind::Release { name: "a".into() }))
            .unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_writer_emits_exactly_what_it_dequeued(
            per_producer in prop::collection::vec(0usize..60, 1..5),
            capacity in 1usize..8,
        ) {
            let buf = SharedBuf::default();
            let (tx, rx) = bounded(capacity);
            let gate = CaptureGate::open(tx);
            let writer = spawn_writer(EventLogWriter::new(buf.clone()), rx).unwrap();

            let producers: Vec<_> = per_producer
                .iter()
                .enumerate()
                .map(|(producer, &count)| {
                    let adapter = gate.adapter(InputClass::Pointer);
                    std::thread::spawn(move || {
                        for seq in 0..count {
                            adapter.on_move(producer as f64, seq as f64);
                        }
                    })
                })
                .collect();
            for producer in producers {
                producer.join().unwrap();
            }
            gate.close();

            let report = writer.join().unwrap();
            let events = buf.events();
            let expected: usize = per_producer.iter().sum();
            prop_assert_eq!(report.written as usize, expected);
            prop_assert_eq!(events.len(), expected);

            // Each producer's events keep their relative order, none duplicated.
            for (producer, &count) in per_producer.iter().enumerate() {
                let seqs: Vec<f64> = events
                    .iter()
                    .filter_map(|e| match e.kind {
                        EventKind::Move { x, y } if x == producer as f64 => Some(y),
                        _ => None,
                    })
                    .collect();
                let wanted: Vec<f64> = (0..count).map(|s| s as f64).collect();
                prop_assert_eq!(seqs, wanted);
            }
        }
    }
}
