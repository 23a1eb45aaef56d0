use std::time::Duration;

use drag_close::TrackerConfig;
use drag_close::dispatcher::CloseOutcome;
use drag_close::event_loop::{EventLoop, HostMessage, LoopRecord};
use drag_close::events::{DragEvent, TouchEvent, TouchSequence};
use drag_close::gesture::{IgnoreReason, Verdict};
use drag_close::host::OverviewState;
use drag_close::sim::{SimActor, SimDelegate, SimShell, SimWindow, SimWorkspace};

struct Scene {
    event_loop: EventLoop,
    window: SimWindow,
    preview: SimActor,
}

fn scene() -> Scene {
    let mut shell = SimShell::new(1000.0);
    shell.set_overview(OverviewState::SHOWN);
    let window = SimWindow::new("W");
    window.set_workspace(Some(SimWorkspace::new("A")));
    let preview = SimActor::builder("preview")
        .delegate(SimDelegate::for_window(&window))
        .build();
    Scene {
        event_loop: EventLoop::new(shell, TrackerConfig::default()),
        window,
        preview,
    }
}

impl Scene {
    fn begin(&self, id: u64, y: f64) -> HostMessage {
        HostMessage::Touch(TouchEvent::begin(
            TouchSequence::new(id),
            100.0,
            y,
            Some(self.preview.clone()),
        ))
    }

    fn motion(&self, y: f64) -> HostMessage {
        HostMessage::DragMotion(DragEvent::new(Some(SimDelegate::for_window(&self.window)), Some(y)))
    }

    fn drop_at(&self, y: f64) -> HostMessage {
        HostMessage::DragDrop(DragEvent::new(Some(SimDelegate::for_window(&self.window)), Some(y)))
    }

    fn run(&mut self, messages: Vec<HostMessage>) -> Vec<LoopRecord> {
        self.event_loop.extend(messages);
        self.event_loop.run()
    }
}

fn evaluations(records: &[LoopRecord]) -> Vec<&drag_close::gesture::Evaluation> {
    records
        .iter()
        .filter_map(|record| match record {
            LoopRecord::Evaluated(eval) => Some(eval),
            LoopRecord::Closed(_) => None,
        })
        .collect()
}

#[test]
fn drag_into_bottom_band_closes_window() {
    let mut sc = scene();
    let messages = vec![
        sc.begin(1, 500.0),
        sc.motion(950.0),
        sc.drop_at(960.0),
        HostMessage::Wait(Duration::from_millis(200)),
    ];
    let records = sc.run(messages);

    let evals = evaluations(&records);
    assert_eq!(evals.len(), 1);
    assert_eq!(evals[0].verdict(), Verdict::Close);
    assert!(evals[0].drag_started);
    assert!(!evals[0].workspace_changed);

    let closes: Vec<_> = records
        .iter()
        .filter(|record| matches!(record, LoopRecord::Closed(_)))
        .collect();
    assert_eq!(closes.len(), 1, "exactly one close must fire");
    let deletions = sc.window.deletions();
    assert_eq!(deletions.len(), 1);
    assert_ne!(deletions[0], 0, "timestamp should come from the shell clock");
}

#[test]
fn drop_above_band_is_ignored() {
    let mut sc = scene();
    let messages = vec![
        sc.begin(1, 500.0),
        sc.motion(950.0),
        sc.drop_at(700.0),
        HostMessage::Wait(Duration::from_millis(200)),
    ];
    let records = sc.run(messages);

    let evals = evaluations(&records);
    assert_eq!(evals.len(), 1);
    assert!(!evals[0].reached_bottom_edge);
    assert_eq!(evals[0].ignore_reason, Some(IgnoreReason::AboveEdge));
    assert_eq!(records.len(), 1, "no close may be scheduled");
    assert_eq!(sc.event_loop.shell().pending_timers(), 0);
    assert!(sc.window.deletions().is_empty());
}

#[test]
fn drop_exactly_on_band_border_closes() {
    let mut sc = scene();
    let messages = vec![sc.begin(1, 500.0), sc.motion(900.0), sc.drop_at(904.0)];
    let records = sc.run(messages);
    assert_eq!(evaluations(&records)[0].verdict(), Verdict::Close);
}

#[test]
fn stale_gesture_is_dropped_by_late_motion() {
    let mut sc = scene();
    let messages = vec![
        sc.begin(1, 500.0),
        HostMessage::Wait(Duration::from_millis(3100)),
        sc.motion(950.0),
    ];
    let records = sc.run(messages);
    assert!(records.is_empty());
    assert!(sc.event_loop.tracker().active_gesture().is_none());

    let records = sc.run(vec![sc.drop_at(960.0), HostMessage::Wait(Duration::from_millis(200))]);
    assert!(records.is_empty(), "drop must pass through without a verdict");
    assert!(sc.window.deletions().is_empty());
}

#[test]
fn drop_without_drag_motion_never_closes() {
    let mut sc = scene();
    let records = sc.run(vec![sc.begin(1, 990.0), sc.drop_at(999.0)]);
    let evals = evaluations(&records);
    assert_eq!(evals[0].ignore_reason, Some(IgnoreReason::NoDrag));
}

#[test]
fn workspace_switch_during_drag_is_ignored() {
    let mut sc = scene();
    let messages = vec![
        sc.begin(1, 500.0),
        sc.motion(950.0),
        HostMessage::MoveWindow {
            window: sc.window.clone(),
            workspace: Some(SimWorkspace::new("B")),
        },
        sc.drop_at(990.0),
        HostMessage::Wait(Duration::from_millis(200)),
    ];
    let records = sc.run(messages);
    let evals = evaluations(&records);
    assert!(evals[0].reached_bottom_edge);
    assert!(evals[0].workspace_changed);
    assert_eq!(evals[0].verdict(), Verdict::Ignore);
    assert!(sc.window.deletions().is_empty());
}

#[test]
fn back_to_back_closes_coalesce() {
    let mut sc = scene();
    let messages = vec![
        sc.begin(1, 500.0),
        sc.motion(950.0),
        sc.drop_at(960.0),
        HostMessage::Wait(Duration::from_millis(40)),
        sc.begin(2, 500.0),
        sc.motion(980.0),
        sc.drop_at(990.0),
        HostMessage::Wait(Duration::from_millis(500)),
    ];
    let records = sc.run(messages);

    let verdicts: Vec<_> = evaluations(&records).iter().map(|e| e.verdict()).collect();
    assert_eq!(verdicts, vec![Verdict::Close, Verdict::Close]);
    let closes: Vec<_> = records
        .iter()
        .filter_map(|record| match record {
            LoopRecord::Closed(outcome) => Some(outcome.clone()),
            LoopRecord::Evaluated(_) => None,
        })
        .collect();
    assert_eq!(closes.len(), 1, "first pending close must be cancelled");
    assert!(matches!(
        closes[0],
        CloseOutcome::Dispatched {
            touch: drag_close::events::TouchKey::Sequence(2),
            ..
        }
    ));
    assert_eq!(sc.window.deletions().len(), 1);
}

#[test]
fn registry_counts_resolved_begins_minus_ends() {
    let mut sc = scene();
    let stray = SimActor::builder("wallpaper").build();
    let mut messages = Vec::new();
    for id in 0..6u64 {
        let source = if id % 2 == 0 {
            sc.preview.clone()
        } else {
            stray.clone()
        };
        messages.push(HostMessage::Touch(TouchEvent::begin(
            TouchSequence::new(id),
            5000.0,
            100.0,
            Some(source),
        )));
    }
    sc.run(messages);
    // only even ids resolved a window
    assert_eq!(sc.event_loop.tracker().touches().len(), 3);

    sc.run(vec![
        HostMessage::Touch(TouchEvent::end(TouchSequence::new(0))),
        HostMessage::Touch(TouchEvent::cancel(TouchSequence::new(1))),
        HostMessage::Touch(TouchEvent::end(TouchSequence::new(0))),
    ]);
    assert_eq!(sc.event_loop.tracker().touches().len(), 2);

    sc.run(vec![
        HostMessage::Touch(TouchEvent::end(TouchSequence::new(2))),
        HostMessage::Touch(TouchEvent::end(TouchSequence::new(4))),
    ]);
    assert!(sc.event_loop.tracker().touches().is_empty());
}

#[test]
fn close_failure_is_reported_and_swallowed() {
    let mut sc = scene();
    sc.window
        .fail_close(Some(drag_close::CloseError::Rejected("compositor busy".into())));
    let messages = vec![
        sc.begin(1, 500.0),
        sc.motion(950.0),
        sc.drop_at(960.0),
        HostMessage::Wait(Duration::from_millis(100)),
        sc.begin(2, 500.0),
    ];
    let records = sc.run(messages);
    assert!(records.iter().any(|record| matches!(
        record,
        LoopRecord::Closed(CloseOutcome::Failed { .. })
    )));
    // the tracker keeps working after the failure
    assert!(sc.event_loop.tracker().active_gesture().is_some());
}
