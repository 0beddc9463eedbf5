//! Lagged autocorrelation of a displacement component, used to check that
//! successive steps are independent.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AutocorrelationPoint {
    pub lag: i64,
    pub coefficient: f64,
}

/// Symmetric sequence of coefficients for lags `-max_lag..=max_lag`,
/// normalised so lag 0 is exactly 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Autocorrelation {
    points: Vec<AutocorrelationPoint>,
    max_lag: usize,
    series_len: usize,
}

/// Summary of how many nonzero-lag coefficients sit inside the noise band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndependenceCheck {
    /// Half-width of the band, 2/sqrt(n) for a series of length n.
    pub band: f64,
    /// Number of positive lags inspected.
    pub lags_checked: usize,
    pub fraction_within_band: f64,
    pub consistent: bool,
}

/// Share of coefficients that must fall inside the band for the steps to be
/// judged independent. About 95.4% of white-noise coefficients land inside
/// ±2/sqrt(n), so the threshold leaves room for short windows.
pub const REQUIRED_FRACTION: f64 = 0.90;

impl Autocorrelation {
    /// Mean-centred autocorrelation of `series`.
    ///
    /// `max_lag` bounds the window; `None` uses every lag the series supports
    /// (`len − 1`). A constant series has no variance and is reported as 1 at
    /// lag 0 and 0 elsewhere.
    pub fn compute(series: &[f64], max_lag: Option<usize>) -> Self {
        let n = series.len();
        let max_lag = max_lag
            .unwrap_or(usize::MAX)
            .min(n.saturating_sub(1));

        let mean = if n > 0 { series.iter().sum::<f64>() / n as f64 } else { 0.0 };
        let centered: Vec<f64> = series.iter().map(|v| v - mean).collect();
        let zero_lag: f64 = centered.iter().map(|v| v * v).sum();

        let positive: Vec<f64> = (0..=max_lag)
            .map(|lag| {
                if lag == 0 {
                    return 1.0;
                }
                if zero_lag == 0.0 {
                    return 0.0;
                }
                let sum: f64 = centered
                    .iter()
                    .zip(&centered[lag..])
                    .map(|(a, b)| a * b)
                    .sum();
                sum / zero_lag
            })
            .collect();

        let points = positive
            .iter()
            .enumerate()
            .rev()
            .map(|(lag, &coefficient)| AutocorrelationPoint { lag: -(lag as i64), coefficient })
            .chain(
                positive.iter().enumerate().skip(1).map(|(lag, &coefficient)| {
                    AutocorrelationPoint { lag: lag as i64, coefficient }
                }),
            )
            .collect();

        Self { points, max_lag, series_len: n }
    }

    /// All points, ordered from `-max_lag` to `+max_lag`.
    pub fn points(&self) -> &[AutocorrelationPoint] {
        &self.points
    }

    pub fn max_lag(&self) -> usize {
        self.max_lag
    }

    /// Coefficient at `lag`, if inside the window.
    pub fn at(&self, lag: i64) -> Option<f64> {
        let offset = i64::try_from(self.max_lag).ok()?;
        let index = usize::try_from(lag.checked_add(offset)?).ok()?;
        self.points.get(index).map(|p| p.coefficient)
    }

    /// Fraction of coefficients with `1 <= |lag| <= up_to` whose magnitude is
    /// at most `band`. The sequence is symmetric, so positive lags suffice.
    pub fn fraction_within(&self, band: f64, up_to: usize) -> f64 {
        let up_to = up_to.min(self.max_lag);
        if up_to == 0 {
            return 1.0;
        }
        let inside = (1..=up_to as i64)
            .filter_map(|lag| self.at(lag))
            .filter(|c| c.abs() <= band)
            .count();
        inside as f64 / up_to as f64
    }

    /// Checks every nonzero lag in the window against the ±2/sqrt(n) band.
    pub fn independence_check(&self) -> IndependenceCheck {
        let band = if self.series_len > 0 {
            2.0 / (self.series_len as f64).sqrt()
        } else {
            0.0
        };
        let fraction_within_band = self.fraction_within(band, self.max_lag);
        IndependenceCheck {
            band,
            lags_checked: self.max_lag,
            fraction_within_band,
            consistent: fraction_within_band >= REQUIRED_FRACTION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_lag_is_exactly_one() {
        let acf = Autocorrelation::compute(&[0.3, -1.2, 0.8, 2.0, -0.1], None);
        assert_eq!(acf.at(0), Some(1.0));
        assert_eq!(acf.max_lag(), 4);
        assert_eq!(acf.points().len(), 9);
        assert_eq!(acf.points()[0].lag, -4);
        assert_eq!(acf.points()[8].lag, 4);
    }

    #[test]
    fn sequence_is_symmetric() {
        let acf = Autocorrelation::compute(&[1.0, 2.0, -3.0, 0.5, 0.25, -1.0], Some(3));
        for lag in 1..=3 {
            assert_eq!(acf.at(lag), acf.at(-lag));
        }
        assert_eq!(acf.at(4), None);
        assert_eq!(acf.at(-4), None);
    }

    #[test]
    fn extreme_lags_are_outside_the_window() {
        let acf = Autocorrelation::compute(&[1.0, 2.0, -3.0, 0.5, 0.25, -1.0], Some(3));
        assert_eq!(acf.at(i64::MAX), None);
        assert_eq!(acf.at(i64::MIN), None);
        assert_eq!(acf.at(i64::MAX - 2), None);
    }

    #[test]
    fn alternating_series_is_anticorrelated() {
        let series: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let acf = Autocorrelation::compute(&series, Some(2));
        assert!((acf.at(1).unwrap() + 0.99).abs() < 1e-12);
        assert!((acf.at(2).unwrap() - 0.98).abs() < 1e-12);
        assert!(!acf.independence_check().consistent);
    }

    #[test]
    fn constant_series_has_no_correlation() {
        let acf = Autocorrelation::compute(&[0.0; 10], None);
        assert_eq!(acf.at(0), Some(1.0));
        assert!(acf.points().iter().filter(|p| p.lag != 0).all(|p| p.coefficient == 0.0));
    }

    #[test]
    fn single_sample_has_only_lag_zero() {
        let acf = Autocorrelation::compute(&[4.2], None);
        assert_eq!(acf.points().len(), 1);
        assert_eq!(acf.at(0), Some(1.0));
        assert!(acf.independence_check().consistent);
    }

    #[test]
    fn reused_samples_show_a_broad_peak() {
        // Each sample repeated over four steps: strong short-lag memory.
        let base = [0.9, -0.4, 1.3, -1.1, 0.2, -0.7, 0.5, 1.8, -0.3, -1.5];
        let series: Vec<f64> = base.iter().flat_map(|v| std::iter::repeat(*v).take(4)).collect();
        let acf = Autocorrelation::compute(&series, Some(3));
        assert!(acf.at(1).unwrap() > 0.5);
        assert!(!acf.independence_check().consistent);
    }
}
