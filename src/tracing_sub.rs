use std::io;

use tracing::Level;

/// Initialize a compact stderr subscriber. `debug` raises the level so
/// tracker diagnostics show up; otherwise only warnings are printed. Safe to call multiple times; subsequent calls
/// are no-ops for the global subscriber.
pub fn init_default(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}
