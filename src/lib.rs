//! Drag-to-close gesture recognition for window overviews.
//!
//! While the shell's overview is up, a touch on a window preview that is
//! dragged down into the bottom band of the stage and dropped there closes
//! the window. [`tracker::DragCloseTracker`] follows raw touch events and
//! drag-and-drop callbacks to recognise that gesture; [`host`] describes what
//! it needs from the shell; [`sim`] and [`event_loop`] provide an in-process
//! shell used for replaying recorded [`trace`]s.

pub mod config;
pub mod constants;
pub mod dispatcher;
pub mod error;
pub mod event_loop;
pub mod events;
pub mod gesture;
pub mod host;
pub mod sim;
pub mod touch;
pub mod trace;
pub mod tracing_sub;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::{CloseError, TraceError};
pub use tracker::DragCloseTracker;
