//! Input delivered to the tracker by its host.

use std::fmt;

use crate::host::WindowSource;

/// Type tag of a captured input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Nothing,
    TouchBegin,
    TouchUpdate,
    TouchEnd,
    TouchCancel,
    Other,
}

impl EventKind {
    pub const fn is_touch(self) -> bool {
        matches!(
            self,
            EventKind::TouchBegin
                | EventKind::TouchUpdate
                | EventKind::TouchEnd
                | EventKind::TouchCancel
        )
    }
}

/// Key the tracker files a contact under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TouchKey {
    /// Hardware slot; stable for the life of a contact and reused afterwards.
    Slot(u32),
    Sequence(u64),
}

impl fmt::Display for TouchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchKey::Slot(slot) => write!(f, "slot:{slot}"),
            TouchKey::Sequence(id) => write!(f, "seq:{id}"),
        }
    }
}

/// Per-contact event sequence as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TouchSequence {
    id: u64,
    slot: Option<u32>,
}

impl TouchSequence {
    pub const fn new(id: u64) -> Self {
        Self { id, slot: None }
    }

    pub const fn with_slot(mut self, slot: u32) -> Self {
        self.slot = Some(slot);
        self
    }

    /// The slot when the sequence carries one, otherwise the sequence itself.
    pub const fn key(&self) -> TouchKey {
        match self.slot {
            Some(slot) => TouchKey::Slot(slot),
            None => TouchKey::Sequence(self.id),
        }
    }
}

/// A captured input event. `A` is the host's scene-graph node type.
#[derive(Debug, Clone)]
pub struct TouchEvent<A> {
    pub kind: EventKind,
    pub sequence: Option<TouchSequence>,
    pub x: f64,
    pub y: f64,
    pub source: Option<A>,
}

impl<A> TouchEvent<A> {
    pub fn begin(sequence: TouchSequence, x: f64, y: f64, source: Option<A>) -> Self {
        Self {
            kind: EventKind::TouchBegin,
            sequence: Some(sequence),
            x,
            y,
            source,
        }
    }

    pub fn update(sequence: TouchSequence, x: f64, y: f64) -> Self {
        Self {
            kind: EventKind::TouchUpdate,
            sequence: Some(sequence),
            x,
            y,
            source: None,
        }
    }

    pub fn end(sequence: TouchSequence) -> Self {
        Self::finish(EventKind::TouchEnd, sequence)
    }

    pub fn cancel(sequence: TouchSequence) -> Self {
        Self::finish(EventKind::TouchCancel, sequence)
    }

    /// A non-touch event (pointer, key, ...) the tracker should ignore.
    pub fn other(kind: EventKind) -> Self {
        Self {
            kind,
            sequence: None,
            x: 0.0,
            y: 0.0,
            source: None,
        }
    }

    fn finish(kind: EventKind, sequence: TouchSequence) -> Self {
        Self {
            kind,
            sequence: Some(sequence),
            x: 0.0,
            y: 0.0,
            source: None,
        }
    }

    pub fn touch_key(&self) -> Option<TouchKey> {
        self.sequence.map(|sequence| sequence.key())
    }
}

/// A motion or drop callback from the drag-and-drop machinery.
///
/// `S` is the dragged payload. `y` is whatever the protocol handed over.
/// Motion keeps any value; a drop only trusts a finite one.
#[derive(Debug, Clone)]
pub struct DragEvent<S> {
    pub source: Option<S>,
    pub y: Option<f64>,
}

impl<S> DragEvent<S> {
    pub fn new(source: Option<S>, y: Option<f64>) -> Self {
        Self { source, y }
    }

    pub fn finite_y(&self) -> Option<f64> {
        self.y.filter(|y| y.is_finite())
    }

    pub fn window<W>(&self) -> Option<W>
    where
        S: WindowSource<W>,
    {
        self.source.as_ref().and_then(|source| source.window())
    }
}

/// Returned from every callback: the tracker only observes, it never stops
/// event propagation or cancels a drag.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Passthrough;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_takes_precedence_over_sequence() {
        assert_eq!(TouchSequence::new(7).key(), TouchKey::Sequence(7));
        assert_eq!(TouchSequence::new(7).with_slot(1).key(), TouchKey::Slot(1));
    }

    #[test]
    fn only_touch_kinds_are_touch() {
        assert!(EventKind::TouchCancel.is_touch());
        assert!(!EventKind::Nothing.is_touch());
        assert!(!EventKind::Other.is_touch());
    }

    #[test]
    fn non_finite_drag_y_counts_as_missing() {
        let nan: DragEvent<()> = DragEvent::new(None, Some(f64::NAN));
        assert_eq!(nan.finite_y(), None);
        let inf: DragEvent<()> = DragEvent::new(None, Some(f64::INFINITY));
        assert_eq!(inf.finite_y(), None);
        let real: DragEvent<()> = DragEvent::new(None, Some(12.5));
        assert_eq!(real.finite_y(), Some(12.5));
    }

    #[test]
    fn touch_key_display() {
        assert_eq!(TouchKey::Slot(3).to_string(), "slot:3");
        assert_eq!(TouchKey::Sequence(9).to_string(), "seq:9");
    }
}
