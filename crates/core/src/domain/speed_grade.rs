// Clock speed-grade rounding
//
// Timestamp-based estimates are off by a few percent while marketed clock
// speeds cluster on multiples of 50, 25 and 33 MHz. The bands below are
// empirical; keep them and their 50 -> 25 -> 33 priority exactly as is.

/// Distance from a 50 MHz multiple that still snaps (remainder < 8 or > 42)
const BAND_50: (u32, u32) = (8, 42);

/// Distance from a 25 MHz multiple that still snaps (remainder < 5 or > 20)
const BAND_25: (u32, u32) = (5, 20);

/// Distance from a 33 MHz multiple that still snaps (remainder < 5 or > 28)
const BAND_33: (u32, u32) = (5, 28);

/// Snap a raw MHz estimate to the nearest plausible speed grade
///
/// Values outside every band are returned unchanged so overclocked parts
/// keep their measured speed.
pub fn snap_to_speed_grade(raw_mhz: u32) -> u32 {
    let in_band = |grade: u32, (low, high): (u32, u32)| {
        let rem = raw_mhz % grade;
        rem < low || rem > high
    };

    // floor((raw + grade / 2) / grade) * grade, in integers
    let nearest = |grade: u64| -> u32 {
        let raw = raw_mhz as u64;
        let snapped = (2 * raw + grade) / (2 * grade) * grade;
        u32::try_from(snapped).unwrap_or(u32::MAX)
    };

    if in_band(50, BAND_50) {
        nearest(50)
    } else if in_band(25, BAND_25) {
        nearest(25)
    } else if in_band(33, BAND_33) {
        nearest(33)
    } else {
        raw_mhz
    }
}

/// Convert a timestamp-counter delta over a wall-clock window into MHz
///
/// Returns 0 (undetermined) when no time elapsed.
pub fn estimate_mhz(delta_ticks: u64, elapsed_ms: u64) -> u32 {
    if elapsed_ms == 0 {
        return 0;
    }

    let mhz = delta_ticks as f64 / elapsed_ms as f64 / 1000.0;
    // `as` saturates out-of-range floats
    mhz as u32
}
