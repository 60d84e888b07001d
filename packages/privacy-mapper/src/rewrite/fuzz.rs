// packages/privacy-mapper/src/rewrite/fuzz.rs
//! Bounded randomization of quantitative fields
//!
//! This is best-effort obfuscation, not a formal privacy guarantee. The
//! variation constants below shape what the external client observes; changing
//! them changes its behavior.

use crate::random::RandomSource;
use crate::utils::errors::{MapperError, Result};
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Relative variation applied to amounts
pub const AMOUNT_VARIATION: f64 = 0.05;

/// Absolute variation applied to timestamps
pub const TIME_VARIATION: Duration = Duration::from_secs(10 * 60);

/// Lower bound for the timestamp variation
pub const MIN_TIME_VARIATION: Duration = Duration::from_secs(60);

/// Upper bound for the timestamp variation
pub const MAX_TIME_VARIATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Fuzzing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzParameters {
    /// Width of the amount window relative to the amount, in [0, 1]
    pub relative_amount_variation: f64,

    /// Width of the timestamp window, in [1 minute, 24 hours]
    pub absolute_time_variation: Duration,
}

impl FuzzParameters {
    pub const DEFAULT: Self = Self {
        relative_amount_variation: AMOUNT_VARIATION,
        absolute_time_variation: TIME_VARIATION,
    };
}

impl Default for FuzzParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Draw a value in `[min, max)`
///
/// An empty range returns `min` without consulting the random source.
pub fn rand_between(random: &dyn RandomSource, min: u64, max: u64) -> Result<u64> {
    if max < min {
        return Err(MapperError::ParameterOutOfRange(format!(
            "min is not allowed to be greater than max, (min: {}, max: {})",
            min, max
        )));
    }

    if max == min {
        return Ok(min);
    }

    Ok(min + random.draw_bounded(max - min)?)
}

/// Symmetrically randomize an amount within `amount * relative_variation`
pub fn hide_amount(random: &dyn RandomSource, relative_variation: f64, amount: u64) -> Result<u64> {
    if !(0.0..=1.0).contains(&relative_variation) {
        return Err(MapperError::ParameterOutOfRange(format!(
            "hide amount: relative variation is not between allowed bounds of [0, 1], is {}",
            relative_variation
        )));
    }

    if amount == 0 {
        return Ok(0);
    }

    // Never larger than the amount itself while the variation is in [0, 1].
    let fuzz_interval = (amount as f64 * relative_variation) as u64;

    let amount_min = amount - fuzz_interval / 2;
    let amount_max = amount.saturating_add(fuzz_interval / 2);

    rand_between(random, amount_min, amount_max)
}

/// [`hide_amount`] for signed satoshi fields, which must not be negative
pub fn hide_signed_amount(random: &dyn RandomSource, relative_variation: f64, amount: i64) -> Result<i64> {
    let unsigned = u64::try_from(amount)
        .map_err(|_| MapperError::MalformedMessage(format!("negative amount {}", amount)))?;

    let hidden = hide_amount(random, relative_variation, unsigned)?;
    Ok(i64::try_from(hidden).unwrap_or(i64::MAX))
}

/// Symmetrically randomize a timestamp within `absolute_variation`
///
/// Timestamps at the epoch, or close enough that the window would reach
/// before it, are returned unchanged.
pub fn hide_timestamp(
    random: &dyn RandomSource,
    absolute_variation: Duration,
    timestamp: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    if absolute_variation < MIN_TIME_VARIATION || absolute_variation > MAX_TIME_VARIATION {
        return Err(MapperError::ParameterOutOfRange(format!(
            "hide timestamp: absolute time variation is out of bounds, have {:?}",
            absolute_variation
        )));
    }

    let Some(timestamp_ns) = timestamp.timestamp_nanos_opt() else {
        return Ok(timestamp);
    };

    // Bounded by MAX_TIME_VARIATION, fits comfortably.
    let variation_ns = absolute_variation.as_nanos() as i64;

    // Also covers pre-epoch timestamps, without subtracting near i64::MIN.
    if timestamp_ns == 0 || timestamp_ns < variation_ns {
        return Ok(timestamp);
    }

    let half = variation_ns / 2;
    let Some(time_max) = timestamp_ns.checked_add(half) else {
        return Ok(timestamp);
    };
    let time_min = timestamp_ns - half;

    let time_ns = rand_between(random, time_min as u64, time_max as u64)?;

    Ok(Utc.timestamp_nanos(time_ns as i64))
}

/// Draw a random flag
pub fn hide_bool(random: &dyn RandomSource) -> Result<bool> {
    // Test sources may return larger values, which map to true.
    Ok(random.draw_bounded(2)? >= 1)
}
