// © 2019 3D Robotics. License: Apache-2.0
//! Options threaded into [`crate::encoder::build_stream`], plus the
//! logging setup helper the binaries call (library code never initializes
//! a logger itself).

use crate::events::{ErrorHandler, OnEvent};

#[derive(Default)]
pub struct EncoderOptions {
    /// Called when an entry's source or compressor fails, to decide whether
    /// to halt the whole stream or skip the entry and continue (§4.7).
    /// `None` defaults to halting.
    pub on_error: Option<ErrorHandler>,
    /// Receives progress events in the order they occur (§4.7).
    pub on_event: Option<OnEvent>,
}

/// Initializes `env_logger` plus panic-to-log forwarding, the way the
/// teacher's `main.rs` does. Binaries call this once at startup; library
/// code must not.
pub fn init_logging() {
    env_logger::Builder::from_default_env().init();
    log_panics::init();
}
