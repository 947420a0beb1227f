//! Conversion of raw frame values to precipitation rates.

/// Calibration scale of the nowcast product: `GEO = 0.01 * PV + 0`.
pub const NOWCAST_SCALE: f64 = 0.01;

/// Five-minute accumulations per hour.
pub const STEPS_PER_HOUR: f64 = 12.0;

/// Convert a raw cell value to a rain rate in mm/h.
///
/// Other products in the archive use different calibrations
/// (`0.5 * PV - 32` dBZ, or Z-R relations such as `10^((PV - 109) / 32)`);
/// only the nowcast formula is implemented here.
pub fn raw_to_mm_per_hour(raw: f64) -> f64 {
    (raw * NOWCAST_SCALE) * STEPS_PER_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(raw_to_mm_per_hour(100.0), 12.0);
        assert_eq!(raw_to_mm_per_hour(0.0), 0.0);
        assert_eq!(raw_to_mm_per_hour(250.0), 30.0);
    }

    #[test]
    fn test_linear_in_raw() {
        for raw in [1.0, 7.0, 42.0, 65535.0] {
            let rate = raw_to_mm_per_hour(raw);
            assert!((rate - raw * 0.12).abs() < 1e-9, "raw {} gave {}", raw, rate);
        }
    }
}
