//! Session logger
//!
//! Suites run concurrently but their console output must stay contiguous.
//! Exactly one session at a time is active and writes straight to the sink.
//! Other sessions queue their lines. When the active session ends, the owner
//! of the first non-empty queue (in session start order) takes over and the
//! ending worker drains that queue before letting go, so queued output is
//! flushed as soon as its owner gets the sink.
//!
//! Lock order is always `state` then `sink`. A drain takes the sink before
//! releasing the state lock, so the new owner's direct writes cannot overtake
//! its own queued lines. A direct write releases the state lock before it
//! takes the sink, so a slow drain never stalls sessions that only queue.

pub mod style;

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Identifies one suite run's session. Lower ids started earlier.
pub type SessionId = u64;

/// Default number of lines a non-active session may queue before it waits
pub const DEFAULT_PENDING_CAPACITY: usize = 4096;

type Sink = Box<dyn Write + Send>;

#[derive(Default)]
struct SessionState {
    active: Option<SessionId>,
    live: BTreeSet<SessionId>,
    pending: BTreeMap<SessionId, VecDeque<String>>,
}

/// Thread-safe output sink with per-session contiguity
pub struct SessionLogger {
    state: Mutex<SessionState>,
    sink: Mutex<Sink>,
    drained: Condvar,
    next_id: AtomicU64,
    colorize: bool,
    pending_capacity: usize,
}

impl SessionLogger {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            sink: Mutex::new(Box::new(sink)),
            drained: Condvar::new(),
            next_id: AtomicU64::new(0),
            colorize: true,
            pending_capacity: DEFAULT_PENDING_CAPACITY,
        }
    }

    /// Logger writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn with_color(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    pub fn with_pending_capacity(mut self, capacity: usize) -> Self {
        self.pending_capacity = capacity.max(1);
        self
    }

    /// Open a session for one suite run. It ends when dropped.
    pub fn begin(&self) -> Session<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.lock().live.insert(id);
        debug!(session = id, "Session started");
        Session { id, logger: self }
    }

    /// Write a line outside any session. Used once suites have finished.
    pub fn println(&self, line: impl AsRef<str>) {
        let rendered = style::render(line.as_ref(), self.colorize);
        let mut sink = self.sink.lock();
        write_line(&mut sink, &rendered);
        flush_sink(&mut sink);
    }

    /// Drain every remaining queue, whether or not its owner is still around
    pub fn flush(&self) {
        let mut state = self.state.lock();
        let mut sink = self.sink.lock();

        let pending = std::mem::take(&mut state.pending);
        for (id, lines) in pending {
            debug!(session = id, lines = lines.len(), "Flushing queued output");
            for line in lines {
                write_line(&mut sink, &line);
            }
        }
        flush_sink(&mut sink);
        self.drained.notify_all();
    }

    /// Session currently allowed to write directly
    pub fn active_session(&self) -> Option<SessionId> {
        self.state.lock().active
    }

    /// Total number of queued lines across sessions
    pub fn pending_lines(&self) -> usize {
        self.state.lock().pending.values().map(VecDeque::len).sum()
    }

    fn write(&self, id: SessionId, line: &str) {
        let rendered = style::render(line, self.colorize);
        let mut state = self.state.lock();

        loop {
            match state.active {
                None => {
                    debug!(session = id, "Session became active");
                    state.active = Some(id);
                    break;
                }
                Some(active) if active == id => break,
                Some(_) => {
                    let queue = state.pending.entry(id).or_default();
                    if queue.len() < self.pending_capacity {
                        queue.push_back(rendered);
                        return;
                    }
                    // The active session never waits, so this always wakes.
                    self.drained.wait(&mut state);
                }
            }
        }

        // Only the active session writes directly, so nothing can slip in
        // between releasing the state and taking the sink.
        drop(state);
        let mut sink = self.sink.lock();
        write_line(&mut sink, &rendered);
    }

    fn end(&self, id: SessionId) {
        let mut state = self.state.lock();
        state.live.remove(&id);
        debug!(session = id, "Session ended");

        if state.active == Some(id) {
            state.active = None;
            self.hand_off(state);
        }
    }

    fn hand_off(&self, mut state: MutexGuard<'_, SessionState>) {
        loop {
            let next = state
                .pending
                .iter()
                .find(|(_, queue)| !queue.is_empty())
                .map(|(&id, _)| id);

            let Some(next) = next else {
                state.active = None;
                return;
            };

            let lines = state.pending.remove(&next).unwrap_or_default();
            let mut sink = self.sink.lock();

            if state.live.contains(&next) {
                debug!(session = next, lines = lines.len(), "Handing off active session");
                state.active = Some(next);
                self.drained.notify_all();
                drop(state);
                for line in lines {
                    write_line(&mut sink, &line);
                }
                flush_sink(&mut sink);
                return;
            }

            // Owner already finished; write its block and keep looking.
            debug!(session = next, lines = lines.len(), "Draining finished session");
            for line in lines {
                write_line(&mut sink, &line);
            }
            flush_sink(&mut sink);
        }
    }
}

impl Default for SessionLogger {
    fn default() -> Self {
        Self::stdout()
    }
}

/// One suite run's right to emit output
pub struct Session<'a> {
    id: SessionId,
    logger: &'a SessionLogger,
}

impl Session<'_> {
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Emit a line, directly if this session is active, otherwise queued
    pub fn line(&self, line: impl AsRef<str>) {
        self.logger.write(self.id, line.as_ref());
    }

    /// End the session and hand the sink to the next queued session
    pub fn end(self) {}
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.logger.end(self.id);
    }
}

fn write_line(sink: &mut Sink, line: &str) {
    if let Err(e) = writeln!(sink, "{line}") {
        warn!("Failed to write output line: {}", e);
    }
}

fn flush_sink(sink: &mut Sink) {
    if let Err(e) = sink.flush() {
        warn!("Failed to flush output: {}", e);
    }
}

/// In-memory sink that can be cloned and inspected while a logger owns it
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn logger() -> (SessionLogger, MemorySink) {
        let sink = MemorySink::new();
        (SessionLogger::new(sink.clone()).with_color(false), sink)
    }

    fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_first_writer_becomes_active() {
        let (logger, sink) = logger();
        let session = logger.begin();
        session.line("[blue]hello[/]");

        assert_eq!(logger.active_session(), Some(session.id()));
        assert_eq!(sink.lines(), vec!["hello"]);

        session.end();
        assert_eq!(logger.active_session(), None);
    }

    #[test]
    fn test_queued_lines_handed_off_after_active_ends() {
        let (logger, sink) = logger();
        let a = logger.begin();
        let b = logger.begin();

        a.line("a1");
        b.line("b1");
        a.line("a2");
        b.line("b2");
        assert_eq!(sink.lines(), vec!["a1", "a2"]);
        assert_eq!(logger.pending_lines(), 2);

        let b_id = b.id();
        a.end();
        assert_eq!(logger.active_session(), Some(b_id));
        assert_eq!(sink.lines(), vec!["a1", "a2", "b1", "b2"]);

        b.line("b3");
        b.end();
        assert_eq!(sink.lines(), vec!["a1", "a2", "b1", "b2", "b3"]);
        assert_eq!(logger.pending_lines(), 0);
    }

    #[test]
    fn test_hand_off_skips_finished_owners() {
        let (logger, sink) = logger();
        let a = logger.begin();
        let b = logger.begin();
        let c = logger.begin();

        a.line("a1");
        b.line("b1");
        b.end();
        c.line("c1");

        let c_id = c.id();
        a.end();
        assert_eq!(logger.active_session(), Some(c_id));
        assert_eq!(sink.lines(), vec!["a1", "b1", "c1"]);

        c.line("c2");
        drop(c);
        assert_eq!(sink.lines(), vec!["a1", "b1", "c1", "c2"]);
        assert_eq!(logger.active_session(), None);
    }

    #[test]
    fn test_flush_drains_orphaned_queues() {
        let (logger, sink) = logger();
        let a = logger.begin();
        let b = logger.begin();

        a.line("a1");
        b.line("b1");
        b.end();

        logger.flush();
        assert_eq!(sink.lines(), vec!["a1", "b1"]);
        assert_eq!(logger.pending_lines(), 0);
        a.end();
    }

    #[test]
    fn test_full_queue_waits_for_hand_off() {
        let sink = MemorySink::new();
        let logger = Arc::new(
            SessionLogger::new(sink.clone())
                .with_color(false)
                .with_pending_capacity(2),
        );

        let a = logger.begin();
        a.line("a1");

        let writer = {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                let b = logger.begin();
                for i in 0..5 {
                    b.line(format!("b{i}"));
                }
            })
        };

        wait_until(|| logger.pending_lines() == 2);
        a.line("a2");
        a.end();
        writer.join().unwrap();
        logger.flush();

        assert_eq!(
            sink.lines(),
            vec!["a1", "a2", "b0", "b1", "b2", "b3", "b4"]
        );
    }

    #[test]
    fn test_concurrent_sessions_stay_contiguous() {
        const WORKERS: usize = 8;
        const LINES: usize = 50;

        let sink = MemorySink::new();
        let logger = Arc::new(SessionLogger::new(sink.clone()).with_color(false));

        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let logger = Arc::clone(&logger);
                thread::spawn(move || {
                    let session = logger.begin();
                    for line in 0..LINES {
                        session.line(format!("{worker}:{line}"));
                        if line % 7 == 0 {
                            thread::yield_now();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        logger.flush();

        let lines = sink.lines();
        assert_eq!(lines.len(), WORKERS * LINES);

        for block in lines.chunks(LINES) {
            let owner = block[0].split(':').next().unwrap().to_string();
            for (i, line) in block.iter().enumerate() {
                assert_eq!(line, &format!("{owner}:{i}"));
            }
        }
    }

    /// Sink that sleeps on every write
    struct SlowSink {
        inner: MemorySink,
        delay: Duration,
    }

    impl Write for SlowSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            thread::sleep(self.delay);
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_queueing_is_not_blocked_by_slow_drain() {
        let sink = MemorySink::new();
        let logger = SessionLogger::new(SlowSink {
            inner: sink.clone(),
            delay: Duration::from_millis(2),
        })
        .with_color(false);

        let a = logger.begin();
        let b = logger.begin();
        let c = logger.begin();
        a.line("a1");
        for i in 0..300 {
            b.line(format!("b{i}"));
        }
        let b_id = b.id();

        thread::scope(|scope| {
            scope.spawn(move || a.end());
            wait_until(|| logger.active_session() == Some(b_id));

            // The new owner blocks on the sink until its queue is drained.
            scope.spawn(|| b.line("b-direct"));
            thread::sleep(Duration::from_millis(20));

            let start = Instant::now();
            c.line("c-queued");
            assert!(
                start.elapsed() < Duration::from_millis(250),
                "queueing waited {:?}",
                start.elapsed()
            );
        });

        b.end();
        c.end();

        let lines = sink.lines();
        assert_eq!(lines.len(), 303);
        assert_eq!(lines[0], "a1");
        assert_eq!(lines[300], "b299");
        assert_eq!(lines[301], "b-direct");
        assert_eq!(lines[302], "c-queued");
    }

    #[test]
    fn test_println_renders_tags() {
        let sink = MemorySink::new();
        let logger = SessionLogger::new(sink.clone());
        logger.println("[red]boom[/]");
        assert_eq!(sink.contents(), "\x1b[31mboom\x1b[0m\n");
    }
}
