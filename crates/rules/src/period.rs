//! Periodic schedule expressions.
//!
//! The only supported grammar is `random(min,max)`: before each iteration the
//! loop sleeps for a duration drawn uniformly from `[min, max]` seconds.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, RuleError};

/// Parsed `random(min,max)` schedule, bounds in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    min: f64,
    max: f64,
}

impl Period {
    /// Build a period from bounds in seconds. Requires `0 <= min <= max`.
    pub fn random(min: f64, max: f64) -> Result<Self> {
        let expr = format!("random({},{})", min, max);
        if !min.is_finite() || !max.is_finite() {
            return Err(RuleError::malformed(&expr, "bounds must be finite"));
        }
        if min < 0.0 || max < 0.0 {
            return Err(RuleError::malformed(&expr, "bounds must be non-negative"));
        }
        if min > max {
            return Err(RuleError::malformed(&expr, "min is greater than max"));
        }
        Duration::try_from_secs_f64(max).map_err(|e| RuleError::malformed(&expr, e.to_string()))?;
        Ok(Self { min, max })
    }

    /// Parse a `random(<num>,<num>)` expression.
    pub fn parse(expr: &str) -> Result<Self> {
        let body = expr
            .trim()
            .strip_prefix("random")
            .map(str::trim_start)
            .and_then(|s| s.strip_prefix('('))
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| RuleError::malformed(expr, "expected random(<min>,<max>)"))?;

        let mut parts = body.split(',');
        let (min, max) = match (parts.next(), parts.next(), parts.next()) {
            (Some(min), Some(max), None) => (min.trim(), max.trim()),
            _ => return Err(RuleError::malformed(expr, "expected exactly two bounds")),
        };
        let min: f64 = min
            .parse()
            .map_err(|_| RuleError::malformed(expr, format!("invalid number '{}'", min)))?;
        let max: f64 = max
            .parse()
            .map_err(|_| RuleError::malformed(expr, format!("invalid number '{}'", max)))?;

        Self::random(min, max).map_err(|e| match e {
            RuleError::MalformedExpression { reason, .. } => RuleError::malformed(expr, reason),
            other => other,
        })
    }

    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min)
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max)
    }

    /// Draw a fresh wait duration from `[min, max]`.
    pub fn sample(&self) -> Duration {
        let secs = rand::thread_rng()
            .gen_range(self.min..=self.max)
            .clamp(self.min, self.max);
        Duration::from_secs_f64(secs)
    }

    /// Sleep for a sampled duration, or return [`RuleError::Canceled`] as soon
    /// as `scope` is cancelled.
    pub async fn wait(&self, scope: &CancellationToken) -> Result<()> {
        if scope.is_cancelled() {
            return Err(RuleError::Canceled);
        }
        let pause = self.sample();
        tokio::select! {
            _ = scope.cancelled() => Err(RuleError::Canceled),
            _ = tokio::time::sleep(pause) => Ok(()),
        }
    }
}

impl FromStr for Period {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "random({},{})", self.min, self.max)
    }
}
