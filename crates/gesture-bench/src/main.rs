use std::io;
use std::time::{Duration, Instant};

use clap::Parser;
use drag_close::TrackerConfig;
use drag_close::event_loop::{EventLoop, HostMessage, LoopRecord};
use drag_close::events::{DragEvent, TouchEvent, TouchSequence};
use drag_close::host::OverviewState;
use drag_close::sim::{PickRect, SimActor, SimDelegate, SimShell, SimWindow};

const STAGE_HEIGHT: f64 = 1080.0;
const COLUMN_WIDTH: f64 = 240.0;

#[derive(Parser, Debug)]
#[command(
    name = "gesture-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Throughput benchmark for the drag-to-close gesture tracker"
)]
struct BenchCli {
    /// How long to run the benchmark.
    #[arg(
        short = 'd',
        long = "duration",
        value_name = "SECONDS",
        default_value_t = 5.0
    )]
    duration_seconds: f64,

    /// Number of window previews laid out side by side.
    #[arg(short = 'w', long = "windows", value_name = "COUNT", default_value_t = 8)]
    windows: usize,

    /// Touch updates delivered per gesture before the drag starts.
    #[arg(short = 'u', long = "updates", value_name = "COUNT", default_value_t = 16)]
    updates: usize,
}

struct BenchConfig {
    duration: Duration,
    windows: usize,
    updates: usize,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(0.5..=600.0).contains(&cli.duration_seconds) {
            return Err("duration must be between 0.5 and 600 seconds".to_string());
        }
        if !(1..=64).contains(&cli.windows) {
            return Err("windows must be between 1 and 64".to_string());
        }
        if cli.updates > 1024 {
            return Err("updates must be at most 1024".to_string());
        }
        Ok(Self {
            duration: Duration::from_secs_f64(cli.duration_seconds),
            windows: cli.windows,
            updates: cli.updates,
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let stats = run_benchmark(&config);
    println!("{}", stats.final_report(&config));
    Ok(())
}

struct Scene {
    windows: Vec<SimWindow>,
    previews: Vec<SimActor>,
}

fn build_scene(shell: &mut SimShell, count: usize) -> Scene {
    let mut windows = Vec::with_capacity(count);
    let mut previews = Vec::with_capacity(count);
    for index in 0..count {
        let window = SimWindow::new(format!("window-{index}"));
        let preview = SimActor::builder(format!("preview-{index}"))
            .delegate(SimDelegate::for_window(&window))
            .build();
        let rect = PickRect::new(index as f64 * COLUMN_WIDTH, 0.0, COLUMN_WIDTH, STAGE_HEIGHT);
        shell.add_pick_region(rect, &preview);
        windows.push(window);
        previews.push(preview);
    }
    Scene { windows, previews }
}

/// One full gesture: touch, slide, drag, drop in or above the band.
fn gesture_messages(scene: &Scene, round: u64, updates: usize) -> Vec<HostMessage> {
    let index = (round as usize) % scene.windows.len();
    let window = &scene.windows[index];
    let x = index as f64 * COLUMN_WIDTH + COLUMN_WIDTH / 2.0;
    let sequence = TouchSequence::new(round).with_slot((round % 10) as u32);
    // every third gesture is released short of the band
    let release_y = if round % 3 == 0 { 700.0 } else { STAGE_HEIGHT - 20.0 };

    let mut messages = Vec::with_capacity(updates + 6);
    messages.push(HostMessage::Touch(TouchEvent::begin(
        sequence,
        x,
        400.0,
        Some(scene.previews[index].clone()),
    )));
    for step in 0..updates {
        let y = 400.0 + (step as f64 + 1.0) * (release_y - 400.0) / (updates as f64 + 1.0);
        messages.push(HostMessage::Touch(TouchEvent::update(sequence, x, y)));
    }
    let payload = || Some(SimDelegate::for_window(window));
    messages.push(HostMessage::DragMotion(DragEvent::new(payload(), Some(release_y))));
    messages.push(HostMessage::Touch(TouchEvent::end(sequence)));
    messages.push(HostMessage::DragDrop(DragEvent::new(payload(), Some(release_y))));
    messages.push(HostMessage::Wait(Duration::from_millis(100)));
    messages
}

fn run_benchmark(config: &BenchConfig) -> BenchStats {
    let mut shell = SimShell::new(STAGE_HEIGHT);
    shell.set_overview(OverviewState::SHOWN);
    let scene = build_scene(&mut shell, config.windows);
    let mut event_loop = EventLoop::new(shell, TrackerConfig::default());
    let mut stats = BenchStats::new();
    let mut round: u64 = 0;

    while stats.elapsed() < config.duration {
        let messages = gesture_messages(&scene, round, config.updates);
        let message_count = messages.len() as u64;
        let started = Instant::now();
        event_loop.extend(messages);
        let records = event_loop.run();
        stats.record_gesture(message_count, &records, started.elapsed());
        round = round.wrapping_add(1);
    }

    stats.mark_completed();
    stats
}

struct BenchStats {
    start: Instant,
    completed_at: Option<Instant>,
    gestures: u64,
    messages: u64,
    closes: u64,
    ignored: u64,
    total_time: Duration,
    slowest_gesture: Duration,
}

impl BenchStats {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            completed_at: None,
            gestures: 0,
            messages: 0,
            closes: 0,
            ignored: 0,
            total_time: Duration::ZERO,
            slowest_gesture: Duration::ZERO,
        }
    }

    fn elapsed(&self) -> Duration {
        match self.completed_at {
            Some(done) => done.duration_since(self.start),
            None => self.start.elapsed(),
        }
    }

    fn mark_completed(&mut self) {
        self.completed_at = Some(Instant::now());
    }

    fn record_gesture(&mut self, messages: u64, records: &[LoopRecord], took: Duration) {
        self.gestures = self.gestures.saturating_add(1);
        self.messages = self.messages.saturating_add(messages);
        self.total_time += took;
        if took > self.slowest_gesture {
            self.slowest_gesture = took;
        }
        for record in records {
            match record {
                LoopRecord::Closed(_) => self.closes += 1,
                LoopRecord::Evaluated(eval) if eval.ignore_reason.is_some() => self.ignored += 1,
                LoopRecord::Evaluated(_) => {}
            }
        }
    }

    fn average_gesture_us(&self) -> f64 {
        if self.gestures == 0 {
            return 0.0;
        }
        (self.total_time.as_secs_f64() / self.gestures as f64) * 1_000_000.0
    }

    fn final_report(&self, config: &BenchConfig) -> String {
        let elapsed = self.elapsed().as_secs_f64();
        let messages_per_second = if elapsed > 0.0 {
            self.messages as f64 / elapsed
        } else {
            0.0
        };

        indoc::formatdoc!(
            r#"
            Gesture bench completed.
            Duration: {elapsed:.2}s (target {target:.2}s) | windows: {windows}
            Gestures: {gestures} | closes: {closes} | ignored: {ignored}
            Messages: {messages} total (~{per_sec:.0}/s)
            Avg gesture: {avg:.2} us | Worst: {worst:.2} us
            "#,
            elapsed = elapsed,
            target = config.duration.as_secs_f64(),
            windows = config.windows,
            gestures = self.gestures,
            closes = self.closes,
            ignored = self.ignored,
            messages = self.messages,
            per_sec = messages_per_second,
            avg = self.average_gesture_us(),
            worst = self.slowest_gesture.as_secs_f64() * 1_000_000.0,
        )
    }
}
