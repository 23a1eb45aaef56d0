//! Shared crate-wide constants.

use std::time::Duration;

/// Height of the band at the bottom of the stage that a drop has to land in
/// before a dragged window is closed.
///
/// Units: stage coordinates (the same space touch and drag events report
/// in). The comparison is inclusive, so a release exactly at
/// `stage_height - BOTTOM_EDGE_TRIGGER` still counts as reaching the edge.
pub const BOTTOM_EDGE_TRIGGER: f64 = 96.0;

/// Maximum age of an armed gesture when drag motion is attributed to it.
///
/// Motion arriving later than this after the touch that armed the gesture
/// drops the gesture instead of marking it as dragging.
pub const GESTURE_EXPIRY: Duration = Duration::from_millis(3000);

/// Delay between a close verdict and the actual close request, giving the
/// drag-and-drop machinery time to finish its own drop animation first.
pub const CLOSE_DELAY: Duration = Duration::from_millis(80);

/// `tracing` target used for every diagnostic the tracker emits.
pub const LOG_TARGET: &str = "drag_close";
