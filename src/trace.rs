//! Gesture traces: a line-oriented script of shell setup and host events.
//!
//! ```text
//! # declarations
//! stage height=1000
//! workspace main
//! window term workspace=main title="Terminal"
//! actor preview delegate=term at=0,0,400,1000
//!
//! # events, delivered in order
//! overview shown
//! touch begin 1 120 500 source=preview
//! motion y=950 source=term
//! drop y=960 source=term
//! wait 100ms
//! ```
//!
//! Declarations (`stage`, `workspace`, `window`, `actor`) configure the shell
//! while the trace is parsed. Every other directive becomes a
//! [`HostMessage`] in file order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{CloseError, TraceError};
use crate::event_loop::HostMessage;
use crate::events::{DragEvent, TouchEvent, TouchSequence};
use crate::host::OverviewState;
use crate::sim::{PickRect, SimActor, SimDelegate, SimShell, SimWindow, SimWorkspace, TimeSources};

const DEFAULT_STAGE_HEIGHT: f64 = 1080.0;

pub struct Trace {
    pub shell: SimShell,
    pub windows: BTreeMap<String, SimWindow>,
    pub messages: Vec<HostMessage>,
}

impl Trace {
    pub fn window(&self, name: &str) -> Option<&SimWindow> {
        self.windows.get(name)
    }
}

pub fn load(path: &Path) -> Result<Trace, TraceError> {
    let source = fs::read_to_string(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&source)
}

pub fn parse(source: &str) -> Result<Trace, TraceError> {
    let mut parser = Parser::new();
    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let words =
            shell_words::split(line).map_err(|err| TraceError::parse(index + 1, err.to_string()))?;
        parser.directive(index + 1, &words)?;
    }
    Ok(Trace {
        shell: parser.shell,
        windows: parser.windows,
        messages: parser.messages,
    })
}

/// Positional words and `key=value` options of one line.
struct Line<'a> {
    number: usize,
    args: Vec<&'a str>,
    options: BTreeMap<&'a str, &'a str>,
}

impl<'a> Line<'a> {
    fn split(number: usize, words: &'a [String]) -> Self {
        let mut args = Vec::new();
        let mut options = BTreeMap::new();
        for word in words {
            match word.split_once('=') {
                Some((key, value)) => {
                    options.insert(key, value);
                }
                None => args.push(word.as_str()),
            }
        }
        Self {
            number,
            args,
            options,
        }
    }

    fn arg(&self, index: usize, what: &str) -> Result<&'a str, TraceError> {
        self.args
            .get(index)
            .copied()
            .ok_or_else(|| TraceError::parse(self.number, format!("missing {what}")))
    }

    fn option(&self, key: &str) -> Option<&'a str> {
        self.options.get(key).copied()
    }

    fn number_arg(&self, index: usize, what: &str) -> Result<f64, TraceError> {
        let raw = self.arg(index, what)?;
        parse_number(self.number, raw)
    }

    fn number_option(&self, key: &str) -> Result<Option<f64>, TraceError> {
        self.option(key)
            .map(|raw| parse_number(self.number, raw))
            .transpose()
    }

    fn reject_extra_options(&self, allowed: &[&str]) -> Result<(), TraceError> {
        match self.options.keys().find(|key| !allowed.contains(*key)) {
            Some(key) => Err(TraceError::unknown(self.number, "option", *key)),
            None => Ok(()),
        }
    }
}

fn parse_number(line: usize, raw: &str) -> Result<f64, TraceError> {
    raw.parse::<f64>()
        .map_err(|_| TraceError::parse(line, format!("`{raw}` is not a number")))
}

fn parse_bool(line: usize, raw: &str) -> Result<bool, TraceError> {
    match raw {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        other => Err(TraceError::parse(line, format!("`{other}` is not a boolean"))),
    }
}

/// `250ms`, `3.1s` or a bare number of milliseconds.
fn parse_duration(line: usize, raw: &str) -> Result<Duration, TraceError> {
    let (value, scale) = if let Some(ms) = raw.strip_suffix("ms") {
        (ms, 0.001)
    } else if let Some(secs) = raw.strip_suffix('s') {
        (secs, 1.0)
    } else {
        (raw, 0.001)
    };
    let amount = parse_number(line, value)?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(TraceError::parse(line, format!("`{raw}` is not a duration")));
    }
    Duration::try_from_secs_f64(amount * scale)
        .map_err(|err| TraceError::parse(line, format!("`{raw}` is not a duration: {err}")))
}

fn parse_rect(line: usize, raw: &str) -> Result<PickRect, TraceError> {
    let parts = raw
        .split(',')
        .map(|part| parse_number(line, part.trim()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(PickRect::new(*x, *y, *width, *height)),
        _ => Err(TraceError::parse(line, "expected at=X,Y,W,H")),
    }
}

struct Parser {
    shell: SimShell,
    workspaces: BTreeMap<String, SimWorkspace>,
    windows: BTreeMap<String, SimWindow>,
    actors: BTreeMap<String, SimActor>,
    messages: Vec<HostMessage>,
}

impl Parser {
    fn new() -> Self {
        Self {
            shell: SimShell::new(DEFAULT_STAGE_HEIGHT),
            workspaces: BTreeMap::new(),
            windows: BTreeMap::new(),
            actors: BTreeMap::new(),
            messages: Vec::new(),
        }
    }

    fn directive(&mut self, number: usize, words: &[String]) -> Result<(), TraceError> {
        let Some((head, rest)) = words.split_first() else {
            return Ok(());
        };
        let line = Line::split(number, rest);
        match head.as_str() {
            "stage" => self.stage(&line),
            "workspace" => self.workspace(&line),
            "window" => self.window(&line),
            "actor" => self.actor(&line),
            "overview" => self.overview(&line),
            "time" => self.time(&line),
            "touch" => self.touch(&line),
            "motion" => {
                let event = self.drag_event(&line)?;
                self.messages.push(HostMessage::DragMotion(event));
                Ok(())
            }
            "drop" => {
                let event = self.drag_event(&line)?;
                self.messages.push(HostMessage::DragDrop(event));
                Ok(())
            }
            "move" => self.move_window(&line),
            "wait" => {
                let duration = parse_duration(number, line.arg(0, "duration")?)?;
                self.messages.push(HostMessage::Wait(duration));
                Ok(())
            }
            "disable" => {
                self.messages.push(HostMessage::Disable);
                Ok(())
            }
            other => Err(TraceError::unknown(number, "directive", other)),
        }
    }

    fn lookup_workspace(&self, line: &Line<'_>, name: &str) -> Result<Option<SimWorkspace>, TraceError> {
        if name == "none" {
            return Ok(None);
        }
        self.workspaces
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| TraceError::unknown(line.number, "workspace", name))
    }

    fn lookup_window(&self, line: &Line<'_>, name: &str) -> Result<SimWindow, TraceError> {
        self.windows
            .get(name)
            .cloned()
            .ok_or_else(|| TraceError::unknown(line.number, "window", name))
    }

    fn stage(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        line.reject_extra_options(&["height"])?;
        let height = line
            .number_option("height")?
            .ok_or_else(|| TraceError::parse(line.number, "missing height"))?;
        self.shell.set_stage_height(height);
        Ok(())
    }

    fn workspace(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        let name = line.arg(0, "workspace name")?;
        self.workspaces
            .insert(name.to_string(), SimWorkspace::new(name));
        Ok(())
    }

    fn window(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        line.reject_extra_options(&["workspace", "title", "closable", "close-error"])?;
        let name = line.arg(0, "window name")?;
        let window = SimWindow::new(name);
        if let Some(workspace) = line.option("workspace") {
            window.set_workspace(self.lookup_workspace(line, workspace)?);
        }
        window.set_title(line.option("title").map(str::to_string));
        if let Some(closable) = line.option("closable") {
            window.set_closable(parse_bool(line.number, closable)?);
        }
        if let Some(message) = line.option("close-error") {
            let error = match message {
                "gone" => CloseError::WindowGone,
                other => CloseError::Rejected(other.to_string()),
            };
            window.fail_close(Some(error));
        }
        self.windows.insert(name.to_string(), window);
        Ok(())
    }

    fn actor(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        line.reject_extra_options(&["parent", "window", "delegate", "at"])?;
        let name = line.arg(0, "actor name")?;
        let mut builder = SimActor::builder(name);
        if let Some(parent) = line.option("parent") {
            let parent = self
                .actors
                .get(parent)
                .ok_or_else(|| TraceError::unknown(line.number, "actor", parent))?;
            builder = builder.parent(parent);
        }
        if let Some(window) = line.option("window") {
            builder = builder.window(&self.lookup_window(line, window)?);
        }
        if let Some(window) = line.option("delegate") {
            builder = builder.delegate(SimDelegate::for_window(&self.lookup_window(line, window)?));
        }
        let actor = builder.build();
        if let Some(rect) = line.option("at") {
            self.shell
                .add_pick_region(parse_rect(line.number, rect)?, &actor);
        }
        self.actors.insert(name.to_string(), actor);
        Ok(())
    }

    fn overview(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        let state = match line.arg(0, "overview state")? {
            "shown" => OverviewState::SHOWN,
            "showing" => OverviewState::SHOWING,
            "hidden" => OverviewState::HIDDEN,
            other => return Err(TraceError::unknown(line.number, "overview state", other)),
        };
        self.messages.push(HostMessage::Overview(state));
        Ok(())
    }

    fn time(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        let mut sources = TimeSources::NONE;
        for arg in &line.args {
            match *arg {
                "roundtrip" => sources.roundtrip = true,
                "current" => sources.current = true,
                "event" => sources.event = true,
                "none" => {}
                other => return Err(TraceError::unknown(line.number, "time source", other)),
            }
        }
        self.messages.push(HostMessage::TimeSources(sources));
        Ok(())
    }

    fn touch(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        line.reject_extra_options(&["source", "slot"])?;
        let phase = line.arg(0, "touch phase")?;
        let id = line
            .arg(1, "touch id")?
            .parse::<u64>()
            .map_err(|_| TraceError::parse(line.number, "touch id must be an integer"))?;
        let mut sequence = TouchSequence::new(id);
        if let Some(slot) = line.option("slot") {
            let slot = slot
                .parse::<u32>()
                .map_err(|_| TraceError::parse(line.number, "slot must be an integer"))?;
            sequence = sequence.with_slot(slot);
        }

        let event = match phase {
            "begin" => {
                let source = match line.option("source") {
                    Some(name) => Some(
                        self.actors
                            .get(name)
                            .cloned()
                            .ok_or_else(|| TraceError::unknown(line.number, "actor", name))?,
                    ),
                    None => None,
                };
                let x = line.number_arg(2, "x")?;
                let y = line.number_arg(3, "y")?;
                TouchEvent::begin(sequence, x, y, source)
            }
            "update" => {
                let x = line.number_arg(2, "x")?;
                let y = line.number_arg(3, "y")?;
                TouchEvent::update(sequence, x, y)
            }
            "end" => TouchEvent::end(sequence),
            "cancel" => TouchEvent::cancel(sequence),
            other => return Err(TraceError::unknown(line.number, "touch phase", other)),
        };
        self.messages.push(HostMessage::Touch(event));
        Ok(())
    }

    fn drag_event(&self, line: &Line<'_>) -> Result<DragEvent<SimDelegate>, TraceError> {
        line.reject_extra_options(&["y", "source"])?;
        let y = line.number_option("y")?;
        let source = match line.option("source") {
            None => None,
            Some("detached") => Some(SimDelegate::detached()),
            Some(name) => Some(SimDelegate::for_window(&self.lookup_window(line, name)?)),
        };
        Ok(DragEvent::new(source, y))
    }

    fn move_window(&mut self, line: &Line<'_>) -> Result<(), TraceError> {
        line.reject_extra_options(&["workspace"])?;
        let window = self.lookup_window(line, line.arg(0, "window name")?)?;
        let workspace = match line.option("workspace") {
            Some(name) => self.lookup_workspace(line, name)?,
            None => None,
        };
        self.messages
            .push(HostMessage::MoveWindow { window, workspace });
        Ok(())
    }
}
