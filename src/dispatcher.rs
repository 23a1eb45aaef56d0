//! Deferred, coalesced window close.

use std::time::Duration;

use crate::constants::LOG_TARGET;
use crate::error::CloseError;
use crate::events::TouchKey;
use crate::host::{Host, SourceId, WindowHandle};

/// What happened when a deferred close fired.
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    Dispatched { touch: TouchKey, timestamp: u32 },
    Failed { touch: TouchKey, error: CloseError },
}

#[derive(Debug)]
struct PendingClose<W> {
    source: SourceId,
    window: W,
    touch: TouchKey,
}

/// Holds at most one scheduled close. Scheduling again replaces the pending
/// one; only the latest request ever fires.
#[derive(Debug)]
pub struct DeferredClose<W> {
    pending: Option<PendingClose<W>>,
    debug: bool,
}

impl<W: WindowHandle> DeferredClose<W> {
    pub fn new(debug: bool) -> Self {
        Self {
            pending: None,
            debug,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_source(&self) -> Option<SourceId> {
        self.pending.as_ref().map(|pending| pending.source)
    }

    pub fn schedule<H>(&mut self, host: &mut H, window: W, touch: TouchKey, delay: Duration) -> SourceId
    where
        H: Host<Window = W>,
    {
        self.cancel(host);
        let source = host.timeout_add(delay);
        self.pending = Some(PendingClose {
            source,
            window,
            touch,
        });
        source
    }

    /// Returns whether a close was pending.
    pub fn cancel<H: Host>(&mut self, host: &mut H) -> bool {
        match self.pending.take() {
            Some(pending) => {
                host.source_remove(pending.source);
                true
            }
            None => false,
        }
    }

    /// Run the close if `source` is the pending timer. Stale or unknown timers
    /// are ignored. Close failures are reported, never propagated or retried.
    pub fn fire<H>(&mut self, host: &H, source: SourceId) -> Option<CloseOutcome>
    where
        H: Host<Window = W>,
    {
        if self.pending_source() != Some(source) {
            return None;
        }
        let pending = self.pending.take()?;
        let timestamp = delete_timestamp(host);
        match pending.window.delete(timestamp) {
            Ok(()) => {
                if self.debug {
                    tracing::debug!(
                        target: LOG_TARGET,
                        touch = %pending.touch,
                        timestamp,
                        "window close dispatched"
                    );
                }
                Some(CloseOutcome::Dispatched {
                    touch: pending.touch,
                    timestamp,
                })
            }
            Err(error) => {
                if self.debug {
                    tracing::warn!(
                        target: LOG_TARGET,
                        touch = %pending.touch,
                        window = ?pending.window,
                        %error,
                        "window close failed"
                    );
                }
                Some(CloseOutcome::Failed {
                    touch: pending.touch,
                    error,
                })
            }
        }
    }
}

/// Timestamp for the close request: a round-trip server time, then the
/// cached server time, then the current event's time, else zero.
pub fn delete_timestamp<H: Host + ?Sized>(host: &H) -> u32 {
    host.current_time_roundtrip()
        .or_else(|| host.current_time())
        .or_else(|| host.current_event_time())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::sim::{SimShell, SimWindow, TimeSources};

    #[test]
    fn second_schedule_cancels_the_first() {
        let mut shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        let mut closer = DeferredClose::new(false);

        let first = closer.schedule(&mut shell, window.clone(), TouchKey::Slot(0), Duration::from_millis(80));
        let second = closer.schedule(&mut shell, window.clone(), TouchKey::Slot(1), Duration::from_millis(80));
        assert_ne!(first, second);
        assert!(!shell.is_pending(first), "first timer must be removed");
        assert!(shell.is_pending(second));

        assert_eq!(closer.fire(&shell, first), None);
        assert!(matches!(
            closer.fire(&shell, second),
            Some(CloseOutcome::Dispatched { touch: TouchKey::Slot(1), .. })
        ));
        assert_eq!(window.deletions().len(), 1);
        assert!(!closer.is_pending());
    }

    #[test]
    fn failure_is_reported_not_retried() {
        let mut shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        window.fail_close(Some(CloseError::Rejected("busy".into())));
        let mut closer = DeferredClose::new(false);
        let id = closer.schedule(&mut shell, window.clone(), TouchKey::Slot(0), Duration::ZERO);

        let outcome = closer.fire(&shell, id);
        assert_eq!(
            outcome,
            Some(CloseOutcome::Failed {
                touch: TouchKey::Slot(0),
                error: CloseError::Rejected("busy".into()),
            })
        );
        assert!(closer.fire(&shell, id).is_none());
        assert!(window.deletions().is_empty());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn failed_close_log(debug: bool) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        let mut shell = SimShell::new(1000.0);
        let window = SimWindow::new("term");
        window.fail_close(Some(CloseError::WindowGone));
        let mut closer = DeferredClose::new(debug);
        let id = closer.schedule(&mut shell, window, TouchKey::Slot(0), Duration::ZERO);
        let outcome = tracing::subscriber::with_default(subscriber, || closer.fire(&shell, id));
        assert!(matches!(outcome, Some(CloseOutcome::Failed { .. })));

        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn failure_log_follows_debug_flag() {
        assert!(failed_close_log(false).is_empty());
        assert!(failed_close_log(true).contains("window close failed"));
    }

    #[test]
    fn cancel_removes_the_timer() {
        let mut shell = SimShell::new(1000.0);
        let mut closer = DeferredClose::new(false);
        let id = closer.schedule(&mut shell, SimWindow::new("w"), TouchKey::Slot(0), Duration::ZERO);
        assert!(closer.cancel(&mut shell));
        assert!(!shell.is_pending(id));
        assert!(!closer.cancel(&mut shell));
    }

    #[test]
    fn timestamp_falls_back_through_sources() {
        let mut shell = SimShell::new(1000.0);
        shell.advance(Duration::from_millis(41));
        assert_eq!(delete_timestamp(&shell), shell.server_time());

        shell.mark_event();
        shell.advance(Duration::from_millis(10));
        shell.set_time_sources(TimeSources {
            roundtrip: false,
            current: false,
            event: true,
        });
        assert_eq!(delete_timestamp(&shell), 42);

        shell.set_time_sources(TimeSources::NONE);
        assert_eq!(delete_timestamp(&shell), 0);
    }
}
