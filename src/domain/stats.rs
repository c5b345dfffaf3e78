//! Descriptive statistics over a return series.
//!
//! Undefined elements are dropped before anything is computed; an empty
//! remainder is reported as `None` rather than a NaN-filled struct.
//! Moments are population (biased) moments:
//! - skewness = m3 / m2^1.5
//! - excess kurtosis = m4 / m2^2 - 3
//! - Jarque-Bera = n/6 * (S^2 + K^2/4), p = exp(-JB/2) (chi-squared, 2 dof)

use crate::domain::returns::ReturnSeries;

/// Significance level for the normality verdict.
pub const NORMALITY_ALPHA: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Label/value pairs in display order.
    pub fn labelled(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("Mean", self.mean),
            ("Median", self.median),
            ("Std Dev", self.std_dev),
            ("Skewness", self.skewness),
            ("Kurtosis", self.kurtosis),
            ("Min", self.min),
            ("Max", self.max),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normality {
    Normal,
    NotNormal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalityTest {
    pub statistic: f64,
    pub p_value: f64,
    pub verdict: Normality,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

struct Moments {
    n: usize,
    mean: f64,
    m2: f64,
    m3: f64,
    m4: f64,
}

impl Moments {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let nf = n as f64;
        let mean = values.iter().sum::<f64>() / nf;
        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        for v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        Some(Moments {
            n,
            mean,
            m2: m2 / nf,
            m3: m3 / nf,
            m4: m4 / nf,
        })
    }

    fn skewness(&self) -> f64 {
        if self.m2 > 0.0 {
            self.m3 / self.m2.powf(1.5)
        } else {
            0.0
        }
    }

    fn excess_kurtosis(&self) -> f64 {
        if self.m2 > 0.0 {
            self.m4 / (self.m2 * self.m2) - 3.0
        } else {
            0.0
        }
    }
}

pub fn compute_stats(returns: &ReturnSeries) -> Option<Stats> {
    let mut values = returns.defined();
    let moments = Moments::of(&values)?;

    values.sort_by(f64::total_cmp);
    let n = values.len();
    let median = if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    };

    Some(Stats {
        count: n,
        mean: moments.mean,
        median,
        std_dev: moments.m2.sqrt(),
        skewness: moments.skewness(),
        kurtosis: moments.excess_kurtosis(),
        min: values[0],
        max: values[n - 1],
    })
}

pub fn normality_test(returns: &ReturnSeries) -> Option<NormalityTest> {
    let moments = Moments::of(&returns.defined())?;
    let s = moments.skewness();
    let k = moments.excess_kurtosis();
    let statistic = moments.n as f64 / 6.0 * (s * s + k * k / 4.0);
    let p_value = (-statistic / 2.0).exp();
    let verdict = if p_value < NORMALITY_ALPHA {
        Normality::NotNormal
    } else {
        Normality::Normal
    };
    Some(NormalityTest {
        statistic,
        p_value,
        verdict,
    })
}

/// Equal-width histogram over the defined returns.
pub fn histogram(returns: &ReturnSeries, bins: usize) -> Vec<HistogramBin> {
    let values = returns.defined();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range <= 0.0 {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + i as f64 * width,
            upper: if i == bins - 1 {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::returns::{ReturnMethod, ReturnPoint};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn returns(values: &[Option<f64>]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        ReturnSeries {
            method: ReturnMethod::Arithmetic,
            points: values
                .iter()
                .enumerate()
                .map(|(i, &value)| ReturnPoint {
                    timestamp: start + chrono::Duration::days(i as i64),
                    value,
                })
                .collect(),
            invalid: Vec::new(),
        }
    }

    #[test]
    fn all_undefined_is_insufficient_data() {
        let r = returns(&[None, None, None]);
        assert!(compute_stats(&r).is_none());
        assert!(normality_test(&r).is_none());
        assert!(histogram(&r, 10).is_empty());
    }

    #[test]
    fn empty_series_is_insufficient_data() {
        assert!(compute_stats(&returns(&[])).is_none());
    }

    #[test]
    fn drops_undefined_before_computing() {
        let r = returns(&[None, Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
        let s = compute_stats(&r).unwrap();
        assert_eq!(s.count, 4);
        assert_relative_eq!(s.mean, 2.5);
        assert_relative_eq!(s.median, 2.5);
        assert_relative_eq!(s.min, 1.0);
        assert_relative_eq!(s.max, 4.0);
        // population variance of 1..4 = 1.25
        assert_relative_eq!(s.std_dev, 1.25f64.sqrt(), epsilon = 1e-12);
        // symmetric sample
        assert_relative_eq!(s.skewness, 0.0, epsilon = 1e-12);
        // m4 = 2.5625, m2^2 = 1.5625
        assert_relative_eq!(s.kurtosis, 2.5625 / 1.5625 - 3.0, epsilon = 1e-12);
    }

    #[test]
    fn odd_count_median() {
        let s = compute_stats(&returns(&[Some(5.0), Some(-1.0), Some(2.0)])).unwrap();
        assert_relative_eq!(s.median, 2.0);
    }

    #[test]
    fn known_values_population_std_dev() {
        let vals: Vec<Option<f64>> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|&v| Some(v))
            .collect();
        let s = compute_stats(&returns(&vals)).unwrap();
        assert_relative_eq!(s.mean, 5.0);
        assert_relative_eq!(s.std_dev, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn right_skewed_sample_has_positive_skew() {
        let s = compute_stats(&returns(&[Some(0.0), Some(0.0), Some(0.0), Some(10.0)])).unwrap();
        assert!(s.skewness > 0.0);
    }

    #[test]
    fn constant_sample_has_zero_higher_moments() {
        let s = compute_stats(&returns(&[Some(0.25); 5])).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.kurtosis, 0.0);
        let t = normality_test(&returns(&[Some(0.25); 5])).unwrap();
        assert_eq!(t.statistic, 0.0);
        assert_relative_eq!(t.p_value, 1.0);
        assert_eq!(t.verdict, Normality::Normal);
    }

    #[test]
    fn jarque_bera_statistic_and_p_value() {
        let vals = [Some(0.0), Some(0.0), Some(0.0), Some(10.0)];
        let s = compute_stats(&returns(&vals)).unwrap();
        let t = normality_test(&returns(&vals)).unwrap();
        let expected = 4.0 / 6.0 * (s.skewness.powi(2) + s.kurtosis.powi(2) / 4.0);
        assert_relative_eq!(t.statistic, expected, epsilon = 1e-12);
        assert_relative_eq!(t.p_value, (-expected / 2.0).exp(), epsilon = 1e-12);
    }

    #[test]
    fn heavy_outliers_are_not_normal() {
        let mut vals = vec![Some(0.001); 200];
        vals.extend([Some(0.5), Some(-0.4), Some(0.6)]);
        let t = normality_test(&returns(&vals)).unwrap();
        assert!(t.p_value < NORMALITY_ALPHA);
        assert_eq!(t.verdict, Normality::NotNormal);
    }

    #[test]
    fn labelled_order() {
        let s = compute_stats(&returns(&[Some(1.0), Some(2.0)])).unwrap();
        let labels: Vec<&str> = s.labelled().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["Mean", "Median", "Std Dev", "Skewness", "Kurtosis", "Min", "Max"]
        );
    }

    #[test]
    fn histogram_counts_every_value() {
        let r = returns(&[None, Some(0.0), Some(0.25), Some(0.5), Some(0.75), Some(1.0)]);
        let h = histogram(&r, 4);
        assert_eq!(h.len(), 4);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 5);
        // max lands in the last bin
        assert_eq!(h[3].count, 2);
        assert_relative_eq!(h[0].lower, 0.0);
        assert_relative_eq!(h[3].upper, 1.0);
    }

    #[test]
    fn histogram_constant_values_single_bin() {
        let h = histogram(&returns(&[Some(0.2), Some(0.2)]), 50);
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].count, 2);
    }

    #[test]
    fn histogram_zero_bins() {
        assert!(histogram(&returns(&[Some(1.0)]), 0).is_empty());
    }
}
