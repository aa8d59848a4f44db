//! Repeated-execution timing harness.
//!
//! Mirrors what interactive shells report for a timed statement:
//! `1.23 ms ± 45.6 µs per loop (mean ± std. dev. of 7 runs, 100 loops each)`.

use std::fmt;
use std::time::{Duration, Instant};

use crate::error::Result;

/// Timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeitOptions {
    /// Number of measured batches.
    pub repeat: usize,

    /// Minimum duration of one batch when picking the loop count.
    pub min_batch: Duration,
}

impl Default for TimeitOptions {
    fn default() -> Self {
        Self {
            repeat: 7,
            min_batch: Duration::from_millis(200),
        }
    }
}

/// Measured timings of a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeitResult {
    /// Executions per batch.
    pub loops: u64,

    /// Number of batches.
    pub repeat: usize,

    /// Total seconds of each batch.
    pub all_runs: Vec<f64>,
}

impl TimeitResult {
    /// Seconds per loop for each batch.
    pub fn timings(&self) -> Vec<f64> {
        self.all_runs
            .iter()
            .map(|run| run / self.loops as f64)
            .collect()
    }

    /// Mean seconds per loop.
    pub fn average(&self) -> f64 {
        let timings = self.timings();
        if timings.is_empty() {
            return 0.0;
        }
        timings.iter().sum::<f64>() / timings.len() as f64
    }

    /// Population standard deviation of the per-loop seconds.
    pub fn stdev(&self) -> f64 {
        let timings = self.timings();
        if timings.is_empty() {
            return 0.0;
        }
        let mean = self.average();
        let variance =
            timings.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / timings.len() as f64;
        variance.sqrt()
    }
}

impl fmt::Display for TimeitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ± {} per loop (mean ± std. dev. of {} run{}, {} loop{} each)",
            format_time(self.average(), 3),
            format_time(self.stdev(), 3),
            self.repeat,
            if self.repeat == 1 { "" } else { "s" },
            group_thousands(self.loops),
            if self.loops == 1 { "" } else { "s" },
        )
    }
}

/// Time `statement`, choosing the loop count automatically.
///
/// The loop count grows through 1, 2, 5, 10, 20, 50, ... until one batch
/// takes at least `options.min_batch`; then `options.repeat` batches of that
/// size are measured. The first error returned by `statement` aborts timing.
pub fn timeit<F>(options: TimeitOptions, mut statement: F) -> Result<TimeitResult>
where
    F: FnMut() -> Result<()>,
{
    let loops = autorange(options.min_batch, &mut statement)?;
    tracing::debug!("timeit: {} loops x {} runs", loops, options.repeat);

    let mut all_runs = Vec::with_capacity(options.repeat);
    for _ in 0..options.repeat {
        all_runs.push(time_batch(loops, &mut statement)?.as_secs_f64());
    }

    Ok(TimeitResult {
        loops,
        repeat: options.repeat,
        all_runs,
    })
}

fn autorange<F>(min_batch: Duration, statement: &mut F) -> Result<u64>
where
    F: FnMut() -> Result<()>,
{
    let mut loops = 1;
    for exponent in 0..10 {
        for base in [1, 2, 5] {
            loops = base * 10u64.pow(exponent);
            if time_batch(loops, statement)? >= min_batch {
                return Ok(loops);
            }
        }
    }
    Ok(loops)
}

fn time_batch<F>(loops: u64, statement: &mut F) -> Result<Duration>
where
    F: FnMut() -> Result<()>,
{
    let start = Instant::now();
    for _ in 0..loops {
        statement()?;
    }
    Ok(start.elapsed())
}

/// Human readable duration with `precision` significant digits.
pub fn format_time(seconds: f64, precision: usize) -> String {
    if seconds >= 60.0 {
        let mut parts = Vec::new();
        let mut leftover = seconds;
        for (suffix, length) in [("d", 86_400.0), ("h", 3_600.0), ("min", 60.0), ("s", 1.0)] {
            let value = (leftover / length).floor();
            if value > 0.0 {
                leftover %= length;
                parts.push(format!("{}{}", value as u64, suffix));
            }
            if leftover < 1.0 {
                break;
            }
        }
        return parts.join(" ");
    }

    const UNITS: [&str; 4] = ["s", "ms", "µs", "ns"];
    const SCALING: [f64; 4] = [1.0, 1e3, 1e6, 1e9];

    let mut order = if seconds > 0.0 {
        let exponent = seconds.log10().floor() as i64;
        (-exponent.div_euclid(3)).clamp(0, 3) as usize
    } else {
        3
    };

    let mut value = format_significant(seconds * SCALING[order], precision);
    // Rounding up to 1000 moves to the next larger unit.
    if order > 0 && value.parse::<f64>().is_ok_and(|v| v >= 1000.0) {
        order -= 1;
        value = format_significant(seconds * SCALING[order], precision);
    }

    format!("{} {}", value, UNITS[order])
}

/// Like C's `%.*g`, but never switching to exponent notation.
///
/// [`format_time`] keeps values below 1000 by picking the unit first, so
/// the exponent form is not needed there.
fn format_significant(value: f64, precision: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i64;
    let decimals = (precision as i64 - 1 - magnitude).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_format_time_units() {
        assert_eq!(format_time(1.5, 3), "1.5 s");
        assert_eq!(format_time(0.0015, 3), "1.5 ms");
        assert_eq!(format_time(0.000_123_4, 3), "123 µs");
        assert_eq!(format_time(0.000_000_045_67, 3), "45.7 ns");
        assert_eq!(format_time(0.0, 3), "0 ns");
        assert_eq!(format_time(12.345, 3), "12.3 s");
    }

    #[test]
    fn test_format_time_rounding_moves_to_larger_unit() {
        assert_eq!(format_time(0.000_999_6, 3), "1 ms");
        assert_eq!(format_time(0.999_6, 3), "1 s");
        assert_eq!(format_time(0.000_000_999_9, 3), "1 µs");
        assert_eq!(format_time(0.000_999_4, 3), "999 µs");
        assert_eq!(format_time(0.000_999_6, 4), "999.6 µs");
    }

    #[test]
    fn test_format_time_minutes() {
        assert_eq!(format_time(61.0, 3), "1min 1s");
        assert_eq!(format_time(3_600.5, 3), "1h");
        assert_eq!(format_time(90_061.0, 3), "1d 1h 1min 1s");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(1), "1");
        assert_eq!(group_thousands(100), "100");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(10_000_000), "10,000,000");
    }

    #[test]
    fn test_statistics_and_display() {
        let result = TimeitResult {
            loops: 10,
            repeat: 2,
            all_runs: vec![0.020, 0.060],
        };
        assert!((result.average() - 0.004).abs() < 1e-12);
        assert!((result.stdev() - 0.002).abs() < 1e-12);
        assert_eq!(
            result.to_string(),
            "4 ms ± 2 ms per loop (mean ± std. dev. of 2 runs, 10 loops each)"
        );
    }

    #[test]
    fn test_singular_display() {
        let result = TimeitResult {
            loops: 1,
            repeat: 1,
            all_runs: vec![0.25],
        };
        assert_eq!(
            result.to_string(),
            "250 ms ± 0 ns per loop (mean ± std. dev. of 1 run, 1 loop each)"
        );
    }

    #[test]
    fn test_timeit_autoranges() {
        let options = TimeitOptions {
            repeat: 3,
            min_batch: Duration::from_millis(1),
        };
        let mut calls = 0u64;
        let result = timeit(options, || {
            calls += 1;
            std::thread::sleep(Duration::from_micros(200));
            Ok(())
        })
        .unwrap();

        assert!([1, 2, 5].contains(&result.loops));
        assert_eq!(result.repeat, 3);
        assert_eq!(result.all_runs.len(), 3);
        assert!(result.average() >= 0.000_2);
        assert!(calls >= result.loops * 3);

        let text = result.to_string();
        assert!(text.contains(" ± "));
        assert!(text.contains("per loop (mean ± std. dev. of 3 runs,"));
    }

    #[test]
    fn test_timeit_propagates_errors() {
        let err = timeit(TimeitOptions::default(), || {
            Err(Error::ProcessFailed {
                program: "a.out".to_string(),
                code: Some(1),
                output: "boom\n".to_string(),
            })
        })
        .unwrap_err();
        assert_eq!(err.process_output(), Some("boom\n"));
    }
}
