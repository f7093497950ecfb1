// Console sink backed by tracing
use keystone_core::port::ConsoleSink;
use tracing::info;

/// Tracing target the console lines are emitted on
pub const CONSOLE_TARGET: &str = "keystone::console";

/// Forwards console lines to the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsoleSink;

impl ConsoleSink for TracingConsoleSink {
    fn print_line(&self, line: &str) {
        info!(target: CONSOLE_TARGET, "{}", line);
    }
}
