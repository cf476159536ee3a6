use serde::Serialize;

use crate::error::AnalysisError;

/// Closed range `[start, end]` in the source's native time unit.
///
/// Both bounds are inclusive, matching the upstream `timestamp_gte` /
/// `timestamp_lte` query contract. Bounds are never swapped or clamped: any
/// input that does not already satisfy `0 <= start <= end` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeWindow {
    start: u64,
    end: u64,
}

impl TimeWindow {
    /// Validate integer bounds.
    pub fn new(start: i64, end: i64) -> Result<Self, AnalysisError> {
        if start < 0 || end < 0 {
            return Err(AnalysisError::invalid_window(start, end, "bounds must not be negative"));
        }
        Self::from_bounds(start as u64, end as u64)
    }

    /// Validate bounds taken from a numeric input (e.g. a form field).
    ///
    /// Rejects NaN, infinities, negative and fractional values.
    pub fn from_f64(start: f64, end: f64) -> Result<Self, AnalysisError> {
        let reject = |reason| AnalysisError::invalid_window(start, end, reason);

        if !start.is_finite() || !end.is_finite() {
            return Err(reject("bounds must be finite numbers"));
        }
        if start < 0.0 || end < 0.0 {
            return Err(reject("bounds must not be negative"));
        }
        if start.fract() != 0.0 || end.fract() != 0.0 {
            return Err(reject("bounds must be whole time units"));
        }
        // 2^64 is exactly representable; anything at or above it overflows u64
        if start >= 18_446_744_073_709_551_616.0 || end >= 18_446_744_073_709_551_616.0 {
            return Err(reject("bounds exceed the supported range"));
        }

        Self::from_bounds(start as u64, end as u64)
    }

    /// Validate bounds given as text.
    pub fn parse(start: &str, end: &str) -> Result<Self, AnalysisError> {
        let parse_bound = |value: &str| -> Result<f64, AnalysisError> {
            let trimmed = value.trim();
            if let Ok(v) = trimmed.parse::<u64>() {
                return Ok(v as f64);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| AnalysisError::invalid_window(start, end, "bounds must be numeric"))
        };

        // Integer inputs skip the f64 round trip so large values stay exact
        if let (Ok(s), Ok(e)) = (start.trim().parse::<u64>(), end.trim().parse::<u64>()) {
            return Self::from_bounds(s, e);
        }

        Self::from_f64(parse_bound(start)?, parse_bound(end)?)
    }

    /// Validate unsigned bounds. Values are kept exact across the full `u64` range.
    pub fn from_bounds(start: u64, end: u64) -> Result<Self, AnalysisError> {
        if start > end {
            return Err(AnalysisError::invalid_window(
                start,
                end,
                "start must not be after end",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn contains(&self, timestamp: u64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}
