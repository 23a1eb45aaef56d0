use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use drag_close::TrackerConfig;
use drag_close::constants::BOTTOM_EDGE_TRIGGER;
use drag_close::dispatcher::CloseOutcome;
use drag_close::event_loop::{EventLoop, LoopRecord};
use drag_close::gesture::Verdict;
use drag_close::{trace, tracing_sub};

#[derive(Parser, Debug)]
#[command(
    name = "drag-close",
    version = env!("CARGO_PKG_VERSION"),
    about = "Drag-to-close gesture tracker tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a gesture trace against the simulated shell.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Trace file to replay.
    #[arg(value_name = "TRACE")]
    trace: PathBuf,

    /// Print tracker diagnostics to stderr.
    #[arg(long)]
    debug: bool,

    /// Height of the bottom band a drop must reach.
    #[arg(long, value_name = "PX", default_value_t = BOTTOM_EDGE_TRIGGER)]
    edge_trigger: f64,

    /// Maximum gesture age accepted by drag motion.
    #[arg(long, value_name = "MS", default_value_t = 3000)]
    expiry_ms: u64,

    /// Delay between a close verdict and the close request.
    #[arg(long, value_name = "MS", default_value_t = 80)]
    close_delay_ms: u64,
}

struct ReplayConfig {
    trace: PathBuf,
    tracker: TrackerConfig,
}

impl TryFrom<&ReplayArgs> for ReplayConfig {
    type Error = String;

    fn try_from(args: &ReplayArgs) -> Result<Self, Self::Error> {
        if !args.edge_trigger.is_finite() || args.edge_trigger < 0.0 {
            return Err("edge trigger must be a non-negative number".to_string());
        }
        if args.expiry_ms == 0 {
            return Err("expiry must be at least 1ms".to_string());
        }
        let tracker = TrackerConfig::new()
            .with_edge_trigger(args.edge_trigger)
            .with_gesture_expiry(Duration::from_millis(args.expiry_ms))
            .with_close_delay(Duration::from_millis(args.close_delay_ms))
            .with_debug(args.debug);
        Ok(Self {
            trace: args.trace.clone(),
            tracker,
        })
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => {
            tracing_sub::init_default(args.debug);
            let config = ReplayConfig::try_from(&args)
                .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;
            replay(&config)
        }
    }
}

fn replay(config: &ReplayConfig) -> io::Result<()> {
    let trace = trace::load(&config.trace).map_err(io::Error::other)?;
    let mut event_loop = EventLoop::new(trace.shell, config.tracker);
    event_loop.extend(trace.messages);
    let records = event_loop.run();

    for record in &records {
        println!("{record}");
    }

    let mut evaluated = 0;
    let mut close_verdicts = 0;
    let mut dispatched = 0;
    let mut failed = 0;
    for record in &records {
        match record {
            LoopRecord::Evaluated(eval) => {
                evaluated += 1;
                if eval.verdict() == Verdict::Close {
                    close_verdicts += 1;
                }
            }
            LoopRecord::Closed(CloseOutcome::Dispatched { .. }) => dispatched += 1,
            LoopRecord::Closed(CloseOutcome::Failed { .. }) => failed += 1,
        }
    }

    print!(
        "{}",
        indoc::formatdoc!(
            r#"
            Replayed {messages} messages from {path}.
            Drops evaluated: {evaluated} (close verdicts: {close_verdicts})
            Closes dispatched: {dispatched} | failed: {failed}
            "#,
            messages = event_loop.delivered(),
            path = config.trace.display(),
            evaluated = evaluated,
            close_verdicts = close_verdicts,
            dispatched = dispatched,
            failed = failed,
        )
    );
    Ok(())
}
