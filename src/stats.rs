//! Summary statistics for box plots and value-axis scaling.

/// Whisker reach as a multiple of the inter-quartile range.
pub const WHISKER_IQR_FACTOR: f64 = 1.5;

/// Fraction of the data span added above and below an auto-scaled axis.
pub const AXIS_MARGIN: f64 = 0.05;

/// Upper bound on the number of ticks along one axis.
pub const MAX_TICKS: usize = 32;

/// Five-number summary of one box together with the samples beyond the whiskers.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxStats {
    /// First quartile.
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Lowest sample within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Highest sample within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    /// Samples outside the whiskers, ascending.
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// Computes the summary of `values`; `None` when there are no finite samples.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let reach = (q3 - q1) * WHISKER_IQR_FACTOR;
        let (low_limit, high_limit) = (q1 - reach, q3 + reach);

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_limit)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_limit)
            .unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_limit || *v > high_limit)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Lowest and highest drawn value, optionally including outliers.
    pub fn extent(&self, with_outliers: bool) -> (f64, f64) {
        let mut low = self.whisker_low.min(self.q1);
        let mut high = self.whisker_high.max(self.q3);
        if with_outliers {
            for value in &self.outliers {
                low = low.min(*value);
                high = high.max(*value);
            }
        }
        (low, high)
    }
}

/// Quantile `q` in `[0, 1]` of ascending `sorted`, interpolating linearly between ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        len => {
            let position = q.clamp(0.0, 1.0) * (len - 1) as f64;
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let fraction = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
        }
    }
}

/// A closed value range drawn along the vertical axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    /// Value at the bottom of the plot area.
    pub min: f64,
    /// Value at the top of the plot area.
    pub max: f64,
}

impl AxisRange {
    /// Range shown when a chart has no data.
    pub const EMPTY: AxisRange = AxisRange { min: 0.0, max: 1.0 };

    /// Creates a range, swapping the bounds if needed.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Fits a range around `low..=high` with [`AXIS_MARGIN`] padding on both sides.
    ///
    /// Bounds that would overflow are clamped to the largest finite values.
    pub fn padded(low: f64, high: f64) -> Self {
        if !low.is_finite() || !high.is_finite() {
            return Self::EMPTY;
        }
        let half_span = high / 2.0 - low / 2.0;
        let pad = if half_span.abs() < f64::EPSILON {
            if low.abs() > f64::EPSILON {
                low.abs() * AXIS_MARGIN
            } else {
                AXIS_MARGIN
            }
        } else {
            half_span * 2.0 * AXIS_MARGIN
        };
        let pad = if pad.is_finite() { pad } else { f64::MAX };
        Self::new(
            (low - pad).clamp(f64::MIN, f64::MAX),
            (high + pad).clamp(f64::MIN, f64::MAX),
        )
    }

    /// Fraction of the range covered at `value`, 0 at `min` and 1 at `max`.
    pub fn normalize(&self, value: f64) -> f64 {
        let half_span = self.max / 2.0 - self.min / 2.0;
        if half_span <= 0.0 {
            return 0.0;
        }
        ((value / 2.0 - self.min / 2.0) / half_span).clamp(0.0, 1.0)
    }

    /// Distance between neighbouring ticks when aiming for `target` of them.
    ///
    /// `None` when the range is empty or too wide for a finite step.
    pub fn tick_step(&self, target: usize) -> Option<f64> {
        let half_span = self.max / 2.0 - self.min / 2.0;
        if !half_span.is_finite() || half_span <= 0.0 || target == 0 {
            return None;
        }
        let step = nice_step(half_span / target as f64 * 2.0);
        step.is_finite().then_some(step)
    }

    /// Evenly spaced "nice" tick values inside the range, at most [`MAX_TICKS`].
    pub fn ticks(&self, target: usize) -> Vec<f64> {
        let Some(step) = self.tick_step(target) else {
            return vec![self.min];
        };
        let first = (self.min / step).ceil() * step;
        let mut ticks = Vec::new();
        for index in 0..MAX_TICKS {
            let value = first + step * index as f64;
            if !value.is_finite() || value > self.max + step * 1e-9 {
                break;
            }
            // Snap values such as 0.30000000000000004 back onto the step grid.
            ticks.push((value / step).round() * step);
        }
        ticks
    }
}

/// Rounds `raw` up to 1, 2, 2.5 or 5 times a power of ten.
pub fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Formats a tick value with just enough decimals for `step`.
pub fn format_tick(value: f64, step: f64) -> String {
    let decimals = (0..=6)
        .find(|decimals| {
            let scaled = step * 10f64.powi(*decimals);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(6) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.starts_with('-') && text.trim_start_matches(&['-', '0', '.'][..]).is_empty() {
        text[1..].to_string()
    } else {
        text
    }
}
