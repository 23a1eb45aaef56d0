use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use crate::config::TrackerConfig;
use crate::dispatcher::CloseOutcome;
use crate::events::{DragEvent, TouchEvent};
use crate::gesture::Evaluation;
use crate::host::OverviewState;
use crate::sim::{SimActor, SimDelegate, SimShell, SimWindow, SimWorkspace, TimeSources};
use crate::tracker::DragCloseTracker;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// Something the simulated host delivers or changes, in order.
#[derive(Debug, Clone)]
pub enum HostMessage {
    Touch(TouchEvent<SimActor>),
    DragMotion(DragEvent<SimDelegate>),
    DragDrop(DragEvent<SimDelegate>),
    /// Let virtual time pass, firing timers that fall due on the way.
    Wait(Duration),
    Overview(OverviewState),
    MoveWindow {
        window: SimWindow,
        workspace: Option<SimWorkspace>,
    },
    TimeSources(TimeSources),
    /// Shut the tracker down; later messages are discarded.
    Disable,
}

/// Observable result of running messages through the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopRecord {
    Evaluated(Evaluation),
    Closed(CloseOutcome),
}

impl fmt::Display for LoopRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopRecord::Evaluated(eval) => {
                write!(f, "drop {}: release_y={:.1}", eval.touch, eval.release_y)?;
                match eval.ignore_reason {
                    None => write!(f, " verdict=close"),
                    Some(reason) => write!(f, " verdict=ignore ({})", reason.describe()),
                }
            }
            LoopRecord::Closed(CloseOutcome::Dispatched { touch, timestamp }) => {
                write!(f, "close {touch}: dispatched at {timestamp}")
            }
            LoopRecord::Closed(CloseOutcome::Failed { touch, error }) => {
                write!(f, "close {touch}: failed ({error})")
            }
        }
    }
}

/// A serial message pump around the simulated shell.
///
/// Every input event, drag callback and timer callback reaches the tracker
/// from this one place, one at a time, in the order it was queued. Timers
/// only fire while time advances, so a close scheduled by a drop can never
/// overtake a message queued before its deadline.
pub struct EventLoop {
    shell: SimShell,
    tracker: DragCloseTracker<SimWindow>,
    queue: VecDeque<HostMessage>,
    delivered: usize,
}

impl EventLoop {
    pub fn new(shell: SimShell, config: TrackerConfig) -> Self {
        let mut tracker = DragCloseTracker::new(config);
        tracker.enable(&shell);
        Self {
            shell,
            tracker,
            queue: VecDeque::new(),
            delivered: 0,
        }
    }

    pub fn shell(&self) -> &SimShell {
        &self.shell
    }

    pub fn shell_mut(&mut self) -> &mut SimShell {
        &mut self.shell
    }

    pub fn tracker(&self) -> &DragCloseTracker<SimWindow> {
        &self.tracker
    }

    /// Number of messages handed to the tracker so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn push(&mut self, message: HostMessage) {
        self.queue.push_back(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = HostMessage>) {
        self.queue.extend(messages);
    }

    /// Drain the queue, returning what the tracker decided along the way.
    pub fn run(&mut self) -> Vec<LoopRecord> {
        let mut records = Vec::new();
        while let Some(message) = self.queue.pop_front() {
            self.delivered += 1;
            if let ControlFlow::Quit = self.deliver(message, &mut records) {
                self.queue.clear();
                break;
            }
        }
        records
    }

    fn deliver(&mut self, message: HostMessage, records: &mut Vec<LoopRecord>) -> ControlFlow {
        match message {
            HostMessage::Touch(event) => {
                self.shell.mark_event();
                let _ = self.tracker.handle_event(&self.shell, &event);
            }
            HostMessage::DragMotion(event) => {
                self.shell.mark_event();
                let _ = self.tracker.drag_motion(&self.shell, &event);
            }
            HostMessage::DragDrop(event) => {
                self.shell.mark_event();
                if let Some(evaluation) = self.tracker.resolve_drop(&mut self.shell, &event) {
                    records.push(LoopRecord::Evaluated(evaluation));
                }
            }
            HostMessage::Wait(duration) => self.advance(duration, records),
            HostMessage::Overview(state) => self.shell.set_overview(state),
            HostMessage::MoveWindow { window, workspace } => window.set_workspace(workspace),
            HostMessage::TimeSources(sources) => self.shell.set_time_sources(sources),
            HostMessage::Disable => {
                self.tracker.disable(&mut self.shell);
                return ControlFlow::Quit;
            }
        }
        ControlFlow::Continue
    }

    /// Step the clock forward by `by`, stopping at each timer deadline on the
    /// way so timers observe the time they were due at.
    pub fn advance(&mut self, by: Duration, records: &mut Vec<LoopRecord>) {
        let target = self.shell.clock_after(by);
        while let Some(deadline) = self.shell.next_deadline()
            && deadline <= target
        {
            self.shell.advance_to(deadline);
            for source in self.shell.take_due_timers() {
                if let Some(outcome) = self.tracker.dispatch_timeout(&self.shell, source) {
                    records.push(LoopRecord::Closed(outcome));
                }
            }
        }
        self.shell.advance_to(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TouchSequence;
    use crate::gesture::Verdict;
    use crate::sim::MAX_ELAPSED;

    fn scene() -> (EventLoop, SimWindow, SimActor) {
        let mut shell = SimShell::new(1000.0);
        shell.set_overview(OverviewState::SHOWN);
        let window = SimWindow::new("term");
        let actor = SimActor::builder("preview").window(&window).build();
        (EventLoop::new(shell, TrackerConfig::default()), window, actor)
    }

    fn drag_to(window: &SimWindow, y: f64) -> DragEvent<SimDelegate> {
        DragEvent::new(Some(SimDelegate::for_window(window)), Some(y))
    }

    #[test]
    fn close_fires_only_after_delay() {
        let (mut lp, window, actor) = scene();
        let touch = TouchSequence::new(1);
        lp.extend([
            HostMessage::Touch(TouchEvent::begin(touch, 0.0, 500.0, Some(actor))),
            HostMessage::DragMotion(drag_to(&window, 950.0)),
            HostMessage::DragDrop(drag_to(&window, 960.0)),
            HostMessage::Wait(Duration::from_millis(79)),
        ]);
        let records = lp.run();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], LoopRecord::Evaluated(e) if e.verdict() == Verdict::Close));
        assert!(window.deletions().is_empty());

        lp.push(HostMessage::Wait(Duration::from_millis(1)));
        let records = lp.run();
        assert!(matches!(records.as_slice(), [LoopRecord::Closed(CloseOutcome::Dispatched { .. })]));
        assert_eq!(window.deletions().len(), 1);
        assert_eq!(records[0].to_string(), "close seq:1: dispatched at 81");
    }

    #[test]
    fn huge_wait_saturates_the_clock() {
        let (mut lp, window, actor) = scene();
        lp.shell_mut().set_stage_height(1200.0);
        lp.extend([
            HostMessage::Wait(Duration::from_secs(u64::MAX)),
            HostMessage::Touch(TouchEvent::begin(TouchSequence::new(1), 0.0, 500.0, Some(actor))),
            HostMessage::DragMotion(drag_to(&window, 1150.0)),
            HostMessage::DragDrop(drag_to(&window, 1150.0)),
            HostMessage::Wait(Duration::from_secs(u64::MAX)),
        ]);
        let records = lp.run();
        assert_eq!(lp.shell().elapsed(), MAX_ELAPSED);
        assert!(matches!(&records[0], LoopRecord::Evaluated(e) if e.verdict() == Verdict::Close));
        assert_eq!(lp.tracker().config().close_delay(), Duration::from_millis(80));
    }

    #[test]
    fn disable_discards_pending_close_and_queue() {
        let (mut lp, window, actor) = scene();
        let touch = TouchSequence::new(1);
        lp.extend([
            HostMessage::Touch(TouchEvent::begin(touch, 0.0, 500.0, Some(actor))),
            HostMessage::DragMotion(drag_to(&window, 950.0)),
            HostMessage::DragDrop(drag_to(&window, 960.0)),
            HostMessage::Disable,
            HostMessage::Wait(Duration::from_secs(1)),
        ]);
        let records = lp.run();
        assert_eq!(records.len(), 1);
        assert_eq!(lp.delivered(), 4);
        assert_eq!(lp.shell().pending_timers(), 0);
        assert!(window.deletions().is_empty());
    }
}
