//! Numeric helpers shared by the per-category statistics.

use thiserror::Error;

use crate::table::Scalar;

/// Decimal places kept in every published aggregate.
pub const DECIMALS: i32 = 4;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("expected a number, found '{0}'")]
pub struct NotANumber(pub String);

/// Round half away from zero to [`DECIMALS`] places.
pub fn round4(x: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    (x * scale).round() / scale
}

/// Read a numeric cell. Numeric strings are accepted; missing cells are `None`.
///
/// Non-finite values (`NaN`, `inf`, including their string spellings) count as
/// missing so they never reach an aggregate.
pub fn to_number(value: &Scalar) -> Result<Option<f64>, NotANumber> {
    let x = match value {
        _ if value.is_null() => return Ok(None),
        Scalar::Int(i) => *i as f64,
        Scalar::Float(f) => *f,
        Scalar::Str(s) if s.trim().is_empty() => return Ok(None),
        Scalar::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| NotANumber(s.clone()))?,
        other => return Err(NotANumber(other.key_string())),
    };
    Ok(x.is_finite().then_some(x))
}

/// Running mean/variance/extrema (Welford), skipping missing values.
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
    sum: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        if self.count == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
        self.count += 1;
        self.sum += x;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Sample (n-1) standard deviation. Zero for fewer than two values.
    pub fn sample_std(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}
