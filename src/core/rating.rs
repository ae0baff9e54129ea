//! Rating aggregation - turns a product's review ratings into the displayed summary.
//!
//! This is a pure computation: it never validates its input (range checks happen
//! when a review is accepted) and never touches storage.

use serde::Serialize;

/// Displayed rating of a product together with the number of ratings it is based on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Arithmetic mean rounded to one decimal, `0.0` when there are no ratings
    pub average: f64,
    /// Number of ratings aggregated
    pub count: usize,
}

impl RatingSummary {
    /// Summary of a product nobody has reviewed yet.
    pub const EMPTY: Self = Self {
        average: 0.0,
        count: 0,
    };
}

/// Aggregates a sequence of ratings into their one-decimal mean and count.
///
/// Rounding is half away from zero, so `4.45` displays as `4.5` and `-0.25` as `-0.3`.
/// An empty sequence yields [`RatingSummary::EMPTY`].
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate<I>(ratings: I) -> RatingSummary
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0_f64, 0_usize), |(sum, count), rating| (sum + rating, count + 1));

    if count == 0 {
        return RatingSummary::EMPTY;
    }

    RatingSummary {
        average: round_to_tenth(sum / count as f64),
        count,
    }
}

/// `f64::round` already rounds half away from zero.
fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
