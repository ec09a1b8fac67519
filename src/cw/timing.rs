use std::time::Duration;

use super::morse::{Mark, Symbol};

/// Calculate dit duration in milliseconds from WPM
///
/// Standard Morse timing: 1 word = 50 dit-lengths
/// "PARIS" is the standard word used for WPM measurement
/// dit duration in ms = 1200 / WPM
pub fn calculate_dit_duration(wpm: f32) -> f32 {
    1200.0 / wpm
}

/// Dit unit as a `Duration`, clamped to at least 1 ms
pub fn dit_unit(wpm: f32) -> Duration {
    let ms = calculate_dit_duration(wpm.max(1.0));
    Duration::from_micros((ms * 1000.0).max(1000.0) as u64)
}

/// How long a mark is keyed for
pub fn mark_duration(mark: Mark, dit: Duration) -> Duration {
    dit * mark.units()
}

/// Silence between marks of the same character (1 dit)
pub fn element_gap(dit: Duration) -> Duration {
    dit
}

/// Total keying time of a symbol, without a trailing gap
pub fn symbol_duration(symbol: Symbol, dit: Duration) -> Duration {
    dit * symbol.length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dit_duration_at_common_speeds() {
        // At 12 WPM, dit should be 100ms
        assert!((calculate_dit_duration(12.0) - 100.0).abs() < 0.1);

        // At 15 WPM, dit should be 80ms
        assert!((calculate_dit_duration(15.0) - 80.0).abs() < 0.1);

        // At 20 WPM, dit should be 60ms
        assert!((calculate_dit_duration(20.0) - 60.0).abs() < 0.1);
    }

    #[test]
    fn test_dit_unit_duration() {
        assert_eq!(dit_unit(15.0), Duration::from_millis(80));
        assert_eq!(dit_unit(0.0), Duration::from_millis(1200));
    }

    #[test]
    fn test_dah_is_3x_dit() {
        let dit = Duration::from_millis(60);
        assert_eq!(mark_duration(Mark::Dah, dit), dit * 3);
        assert_eq!(mark_duration(Mark::Dit, dit), dit);
        assert_eq!(element_gap(dit), dit);
    }

    #[test]
    fn test_symbol_duration() {
        let dit = Duration::from_millis(10);
        let a = Symbol::new('A').unwrap();
        assert_eq!(symbol_duration(a, dit), Duration::from_millis(50));
    }
}
