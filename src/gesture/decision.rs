//! Close policy applied when a tracked drag is dropped.

use super::ActiveGesture;
use crate::events::TouchKey;
use crate::host::WindowHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Close,
    Ignore,
}

/// First failing check of the close policy, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoDrag,
    AboveEdge,
    WorkspaceChanged,
    NotClosable,
}

impl IgnoreReason {
    pub const fn describe(self) -> &'static str {
        match self {
            IgnoreReason::NoDrag => "no drag motion was seen",
            IgnoreReason::AboveEdge => "released above the bottom edge",
            IgnoreReason::WorkspaceChanged => "window changed workspace",
            IgnoreReason::NotClosable => "window cannot be closed",
        }
    }
}

/// Live readings taken from the host at drop time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropContext {
    /// Finite y carried by the drop event, if any.
    pub event_y: Option<f64>,
    /// Diagnostics only.
    pub pointer_y: Option<f64>,
    pub stage_height: f64,
    pub edge_trigger: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub touch: TouchKey,
    pub event_y: Option<f64>,
    pub pointer_y: Option<f64>,
    pub last_y: f64,
    pub max_y: f64,
    pub release_y: f64,
    pub stage_height: f64,
    pub edge_trigger: f64,
    pub drag_started: bool,
    pub reached_bottom_edge: bool,
    pub workspace_changed: bool,
    pub ignore_reason: Option<IgnoreReason>,
}

impl Evaluation {
    pub fn verdict(&self) -> Verdict {
        match self.ignore_reason {
            None => Verdict::Close,
            Some(_) => Verdict::Ignore,
        }
    }
}

/// Inclusive: a release exactly on the band's upper border counts.
pub fn reached_bottom_edge(release_y: f64, stage_height: f64, edge_trigger: f64) -> bool {
    release_y.is_finite() && release_y >= stage_height - edge_trigger
}

/// Only a move between two known workspaces counts as a change.
pub fn workspace_changed<T: PartialEq>(start: Option<&T>, current: Option<&T>) -> bool {
    matches!((start, current), (Some(start), Some(current)) if start != current)
}

/// Classify a dropped gesture.
///
/// Reads the window's current workspace live, and asks about closability only
/// once every other check has passed.
pub fn evaluate<W: WindowHandle>(gesture: &ActiveGesture<W>, context: &DropContext) -> Evaluation {
    let release_y = context.event_y.unwrap_or(gesture.last_y());
    let reached = reached_bottom_edge(release_y, context.stage_height, context.edge_trigger);
    let current_workspace = gesture.window().workspace();
    let changed = workspace_changed(gesture.start_workspace(), current_workspace.as_ref());

    let ignore_reason = if !gesture.drag_started() {
        Some(IgnoreReason::NoDrag)
    } else if !reached {
        Some(IgnoreReason::AboveEdge)
    } else if changed {
        Some(IgnoreReason::WorkspaceChanged)
    } else if !gesture.window().can_close() {
        Some(IgnoreReason::NotClosable)
    } else {
        None
    };

    Evaluation {
        touch: gesture.touch(),
        event_y: context.event_y,
        pointer_y: context.pointer_y,
        last_y: gesture.last_y(),
        max_y: gesture.max_y(),
        release_y,
        stage_height: context.stage_height,
        edge_trigger: context.edge_trigger,
        drag_started: gesture.drag_started(),
        reached_bottom_edge: reached,
        workspace_changed: changed,
        ignore_reason,
    }
}
