use anyhow::{Context, Result};
use std::sync::Arc;

use crate::state::SharedState;

/// Route the external termination request (SIGTERM, and Ctrl+C for
/// convenience) into the shared shutdown path: flip the running flag and
/// broadcast so every blocked waiter observes it and exits. The handler does
/// nothing else; the main routine joins every loop before releasing the log
/// sink.
pub fn install_signal_handler(state: Arc<SharedState>) -> Result<()> {
    ctrlc::set_handler(move || state.shutdown())
        .context("failed to install termination signal handler")
}
