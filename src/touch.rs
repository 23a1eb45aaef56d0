//! Per-contact bookkeeping for touches that landed on a window.

use std::collections::HashMap;

use crate::events::TouchKey;

#[derive(Debug, Clone)]
pub struct TouchRecord<W> {
    window: W,
    max_y: f64,
}

impl<W> TouchRecord<W> {
    /// Window resolved when the contact started. Never re-resolved.
    pub fn window(&self) -> &W {
        &self.window
    }

    /// Largest vertical coordinate seen for the contact.
    pub fn max_y(&self) -> f64 {
        self.max_y
    }
}

#[derive(Debug)]
pub struct TouchRegistry<W> {
    touches: HashMap<TouchKey, TouchRecord<W>>,
}

impl<W> TouchRegistry<W> {
    pub fn new() -> Self {
        Self {
            touches: HashMap::new(),
        }
    }

    /// Start tracking a contact. A reused key replaces the stale record.
    pub fn begin(&mut self, touch: TouchKey, window: W, y: f64) {
        self.touches.insert(touch, TouchRecord { window, max_y: y });
    }

    /// Returns `false` when the contact is not tracked.
    pub fn update(&mut self, touch: TouchKey, y: f64) -> bool {
        let Some(record) = self.touches.get_mut(&touch) else {
            return false;
        };
        if y > record.max_y {
            record.max_y = y;
        }
        true
    }

    pub fn end(&mut self, touch: TouchKey) -> Option<TouchRecord<W>> {
        self.touches.remove(&touch)
    }

    pub fn get(&self, touch: TouchKey) -> Option<&TouchRecord<W>> {
        self.touches.get(&touch)
    }

    pub fn len(&self) -> usize {
        self.touches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touches.is_empty()
    }

    pub fn clear(&mut self) {
        self.touches.clear();
    }
}

impl<W> Default for TouchRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}
