//! Utilities shared by tests across the workspace.

use std::sync::OnceLock;

use crate::logger::init_logger;

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes the logger at debug level, once per process.
pub fn init() {
    INIT.get_or_init(|| {
        init_logger(log::LevelFilter::Debug);
    });
}
