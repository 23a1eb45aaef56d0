//! In-process host shell.
//!
//! `SimShell` implements [`Host`] over plain Rust values: windows with
//! mutable workspace and close behaviour, a tree of actors, a pick map, a
//! virtual monotonic clock and a timer table. The replay tool, the bench and
//! the tests drive the tracker through it.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::error::CloseError;
use crate::host::{Actor, Host, OverviewState, SourceId, WindowHandle, WindowSource};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimWorkspace(Rc<str>);

impl SimWorkspace {
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

struct WindowState {
    name: String,
    title: RefCell<Option<String>>,
    workspace: RefCell<Option<SimWorkspace>>,
    closable: Cell<bool>,
    close_error: RefCell<Option<CloseError>>,
    deletions: RefCell<Vec<u32>>,
}

/// Shared handle to a simulated window. Clones compare equal.
#[derive(Clone)]
pub struct SimWindow {
    state: Rc<WindowState>,
}

impl SimWindow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            state: Rc::new(WindowState {
                name: name.into(),
                title: RefCell::new(None),
                workspace: RefCell::new(None),
                closable: Cell::new(true),
                close_error: RefCell::new(None),
                deletions: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn set_title(&self, title: Option<String>) {
        *self.state.title.borrow_mut() = title;
    }

    pub fn set_workspace(&self, workspace: Option<SimWorkspace>) {
        *self.state.workspace.borrow_mut() = workspace;
    }

    pub fn set_closable(&self, closable: bool) {
        self.state.closable.set(closable);
    }

    /// Make every following close request fail with `error`.
    pub fn fail_close(&self, error: Option<CloseError>) {
        *self.state.close_error.borrow_mut() = error;
    }

    /// Timestamps of every successful close request, oldest first.
    pub fn deletions(&self) -> Vec<u32> {
        self.state.deletions.borrow().clone()
    }
}

impl PartialEq for SimWindow {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for SimWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SimWindow").field(&self.state.name).finish()
    }
}

impl WindowHandle for SimWindow {
    type Workspace = SimWorkspace;

    fn workspace(&self) -> Option<SimWorkspace> {
        self.state.workspace.borrow().clone()
    }

    fn title(&self) -> Option<String> {
        self.state.title.borrow().clone()
    }

    fn can_close(&self) -> bool {
        self.state.closable.get()
    }

    fn delete(&self, timestamp: u32) -> Result<(), CloseError> {
        if let Some(error) = self.state.close_error.borrow().clone() {
            return Err(error);
        }
        self.state.deletions.borrow_mut().push(timestamp);
        Ok(())
    }
}

/// Controller object behind an actor, and the payload of simulated drags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimDelegate {
    window: Option<SimWindow>,
}

impl SimDelegate {
    pub fn for_window(window: &SimWindow) -> Self {
        Self {
            window: Some(window.clone()),
        }
    }

    /// A payload that belongs to no window (a dragged app icon, say).
    pub fn detached() -> Self {
        Self::default()
    }
}

impl WindowSource<SimWindow> for SimDelegate {
    fn window(&self) -> Option<SimWindow> {
        self.window.clone()
    }
}

struct ActorNode {
    name: String,
    window: Option<SimWindow>,
    delegate: Option<SimDelegate>,
    parent: Option<SimActor>,
}

#[derive(Clone)]
pub struct SimActor {
    node: Rc<ActorNode>,
}

impl SimActor {
    pub fn builder(name: impl Into<String>) -> SimActorBuilder {
        SimActorBuilder {
            name: name.into(),
            window: None,
            delegate: None,
            parent: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }
}

impl PartialEq for SimActor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for SimActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SimActor").field(&self.node.name).finish()
    }
}

impl WindowSource<SimWindow> for SimActor {
    fn window(&self) -> Option<SimWindow> {
        self.node.window.clone()
    }
}

impl Actor<SimWindow> for SimActor {
    fn parent(&self) -> Option<Self> {
        self.node.parent.clone()
    }

    fn delegate(&self) -> Option<&dyn WindowSource<SimWindow>> {
        self.node
            .delegate
            .as_ref()
            .map(|delegate| delegate as &dyn WindowSource<SimWindow>)
    }

    fn type_name(&self) -> &str {
        &self.node.name
    }
}

pub struct SimActorBuilder {
    name: String,
    window: Option<SimWindow>,
    delegate: Option<SimDelegate>,
    parent: Option<SimActor>,
}

impl SimActorBuilder {
    pub fn parent(mut self, parent: &SimActor) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn window(mut self, window: &SimWindow) -> Self {
        self.window = Some(window.clone());
        self
    }

    pub fn delegate(mut self, delegate: SimDelegate) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn build(self) -> SimActor {
        SimActor {
            node: Rc::new(ActorNode {
                name: self.name,
                window: self.window,
                delegate: self.delegate,
                parent: self.parent,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PickRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Which timestamp queries the shell answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSources {
    pub roundtrip: bool,
    pub current: bool,
    pub event: bool,
}

impl TimeSources {
    pub const ALL: Self = Self {
        roundtrip: true,
        current: true,
        event: true,
    };
    pub const NONE: Self = Self {
        roundtrip: false,
        current: false,
        event: false,
    };
}

/// Furthest the virtual clock runs. Keeps `epoch + elapsed` representable.
pub const MAX_ELAPSED: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

pub struct SimShell {
    overview: OverviewState,
    stage_height: f64,
    // later regions sit on top
    pick_regions: Vec<(PickRect, SimActor)>,
    pointer: Option<(f64, f64)>,
    time_sources: TimeSources,
    epoch: Instant,
    elapsed: Duration,
    last_event_time: Option<u32>,
    // deadlines as offsets from `epoch`
    timers: BTreeMap<SourceId, Duration>,
    next_source: u64,
}

impl SimShell {
    pub fn new(stage_height: f64) -> Self {
        Self {
            overview: OverviewState::HIDDEN,
            stage_height,
            pick_regions: Vec::new(),
            pointer: None,
            time_sources: TimeSources::ALL,
            epoch: Instant::now(),
            elapsed: Duration::ZERO,
            last_event_time: None,
            timers: BTreeMap::new(),
            next_source: 1,
        }
    }

    pub fn set_overview(&mut self, overview: OverviewState) {
        self.overview = overview;
    }

    pub fn set_stage_height(&mut self, height: f64) {
        self.stage_height = height;
    }

    pub fn add_pick_region(&mut self, rect: PickRect, actor: &SimActor) {
        self.pick_regions.push((rect, actor.clone()));
    }

    pub fn set_pointer(&mut self, pointer: Option<(f64, f64)>) {
        self.pointer = pointer;
    }

    pub fn set_time_sources(&mut self, sources: TimeSources) {
        self.time_sources = sources;
    }

    /// Virtual time since the shell started.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn advance(&mut self, by: Duration) {
        self.advance_to(self.clock_after(by));
    }

    /// Where the clock lands after advancing by `by`, capped at
    /// [`MAX_ELAPSED`].
    pub fn clock_after(&self, by: Duration) -> Duration {
        self.elapsed.saturating_add(by).min(MAX_ELAPSED)
    }

    /// Milliseconds since start, offset by one so it is never zero.
    pub fn server_time(&self) -> u32 {
        u32::try_from(self.elapsed.as_millis())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Stamp the event currently being delivered.
    pub fn mark_event(&mut self) {
        self.last_event_time = Some(self.server_time());
    }

    pub fn is_pending(&self, id: SourceId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest timer deadline, as an offset from start.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.values().min().copied()
    }

    /// Set the clock forward to `elapsed`. Never moves it back or past
    /// [`MAX_ELAPSED`].
    pub fn advance_to(&mut self, elapsed: Duration) {
        let elapsed = elapsed.min(MAX_ELAPSED);
        if elapsed > self.elapsed {
            self.elapsed = elapsed;
        }
    }

    /// Remove and return the timers that are due, earliest deadline first.
    pub fn take_due_timers(&mut self) -> Vec<SourceId> {
        let mut due: Vec<(Duration, SourceId)> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= self.elapsed)
            .map(|(id, deadline)| (*deadline, *id))
            .collect();
        due.sort();
        for (_, id) in &due {
            self.timers.remove(id);
        }
        due.into_iter().map(|(_, id)| id).collect()
    }
}

impl Host for SimShell {
    type Window = SimWindow;
    type Actor = SimActor;

    fn overview(&self) -> OverviewState {
        self.overview
    }

    fn stage_height(&self) -> f64 {
        self.stage_height
    }

    fn actor_at(&self, x: f64, y: f64) -> Option<SimActor> {
        self.pick_regions
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(x, y))
            .map(|(_, actor)| actor.clone())
    }

    fn pointer(&self) -> Option<(f64, f64)> {
        self.pointer
    }

    fn now(&self) -> Instant {
        self.epoch
            .checked_add(self.elapsed)
            .unwrap_or(self.epoch)
    }

    fn current_time_roundtrip(&self) -> Option<u32> {
        self.time_sources.roundtrip.then(|| self.server_time())
    }

    fn current_time(&self) -> Option<u32> {
        self.time_sources.current.then(|| self.server_time())
    }

    fn current_event_time(&self) -> Option<u32> {
        if self.time_sources.event {
            self.last_event_time
        } else {
            None
        }
    }

    fn timeout_add(&mut self, delay: Duration) -> SourceId {
        let id = SourceId(self.next_source);
        self.next_source += 1;
        self.timers.insert(id, self.elapsed.saturating_add(delay));
        id
    }

    fn source_remove(&mut self, id: SourceId) {
        self.timers.remove(&id);
    }
}
