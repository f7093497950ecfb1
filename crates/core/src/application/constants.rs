// Detection constants (ADR: No magic values)

/// Calibration busy-wait window (750ms)
pub const DEFAULT_CALIBRATION_WINDOW_MS: u64 = 750;

/// First line of the console summary
pub const SUMMARY_HEADER: &str = "Processor Init:";

/// Indentation of the console summary body
pub const SUMMARY_INDENT: &str = "   ";
