//! Small numeric helpers shared by the engines.
//!
//! Every function here works on plain slices and returns `None` instead of a
//! non-finite number.

/// Above this magnitude an f64 has no cents left to round.
const ROUNDING_LIMIT: f64 = 1e15;

/// Round half away from zero to 2 decimal places.
///
/// Values too large to carry cents come back unchanged instead of overflowing.
pub fn round2(v: f64) -> f64 {
    if !v.is_finite() || v.abs() >= ROUNDING_LIMIT {
        return v;
    }
    (v * 100.0).round() / 100.0
}

/// Running mean and sum of squared deviations (Welford).
///
/// Never forms the plain sum, so finite inputs near `f64::MAX` keep a finite
/// mean, and a constant series has exactly zero spread.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    n_vals: usize,
    mean: f64,
    diff_2_sum: f64,
}

impl Accumulator {
    fn from_slice(values: &[f64]) -> Self {
        let mut acc = Accumulator::default();
        for &v in values {
            acc.add(v);
        }
        acc
    }

    fn add(&mut self, val: f64) {
        self.n_vals += 1;

        let diff_a = val - self.mean;
        self.mean += diff_a / self.n_vals as f64;

        let diff_b = val - self.mean;
        self.diff_2_sum += diff_a * diff_b;
    }
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = Accumulator::from_slice(values).mean;
    m.is_finite().then_some(m)
}

/// Sample standard deviation (n - 1 denominator); `None` for fewer than 2 values.
///
/// A series whose values are all identical yields exactly `0.0`.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if values.iter().all(|&v| v == values[0]) {
        return values[0].is_finite().then_some(0.0);
    }
    let acc = Accumulator::from_slice(values);
    let sd = (acc.diff_2_sum.max(0.0) / (acc.n_vals - 1) as f64).sqrt();
    sd.is_finite().then_some(sd)
}

/// `numerator / denominator`, or `None` when the denominator is zero or the
/// result is not finite.
pub fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let r = numerator / denominator;
    r.is_finite().then_some(r)
}

/// Trailing moving average with a window of up to `window` points.
///
/// Early points average over whatever history exists, so the output has the
/// same length as the input.
pub fn trailing_mean(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i]).unwrap_or(f64::NAN)
        })
        .collect()
}

/// Least-squares straight line through `(x, y)` points, kept in centred form
/// `y = y_mean + slope * (x - x_mean)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub x_mean: f64,
    pub y_mean: f64,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.y_mean + self.slope * (x - self.x_mean)
    }
}

/// Ordinary least squares fit of a degree-1 polynomial.
///
/// `x` is centred so large year values cost neither precision nor range.
/// Returns `None` with fewer than 2 points or when all `x` are equal.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<LineFit> {
    if points.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let x_mean = mean(&xs)?;
    let y_mean = mean(&ys)?;

    let (sxy, sxx) = points.iter().fold((0.0, 0.0), |(sxy, sxx), &(x, y)| {
        let dx = x - x_mean;
        (sxy + dx * (y - y_mean), sxx + dx * dx)
    });

    let slope = guarded_ratio(sxy, sxx)?;
    Some(LineFit {
        slope,
        x_mean,
        y_mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(-2.345_000_1), -2.35);
    }

    #[test]
    fn sample_std_needs_two_values() {
        assert_eq!(sample_std(&[5.0]), None);
        assert_eq!(sample_std(&[]), None);
        let sd = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn constant_series_has_exactly_zero_std() {
        for v in [3.3, 0.1, 91.7] {
            assert_eq!(sample_std(&[v, v, v]), Some(0.0));
            assert_eq!(mean(&[v, v, v]), Some(v));
        }
    }

    #[test]
    fn huge_finite_values_do_not_overflow() {
        let m = mean(&[1e307, 1.5e307]).unwrap();
        assert!((m - 1.25e307).abs() <= 1.25e307 * 1e-12);
        assert_eq!(mean(&[f64::MAX, f64::MAX]), Some(f64::MAX));
        assert_eq!(round2(1.25e307), 1.25e307);
        assert_eq!(round2(1e15 + 0.3), 1e15 + 0.3);

        let fit = linear_fit(&[(2018.0, 1e307), (2019.0, 1.5e307)]).unwrap();
        assert!((fit.slope - 5e306).abs() <= 5e306 * 1e-12);
        assert!((fit.predict(2018.0) - 1e307).abs() <= 1e307 * 1e-12);
    }

    #[test]
    fn guarded_ratio_refuses_zero_denominator() {
        assert_eq!(guarded_ratio(3.0, 0.0), None);
        assert_eq!(guarded_ratio(3.0, 2.0), Some(1.5));
    }

    #[test]
    fn trailing_mean_uses_available_history() {
        let ma = trailing_mean(&[3.0, 5.0, 10.0, 1.0], 3);
        assert_eq!(ma.len(), 4);
        assert!((ma[0] - 3.0).abs() < EPS);
        assert!((ma[1] - 4.0).abs() < EPS);
        assert!((ma[2] - 6.0).abs() < EPS);
        assert!((ma[3] - 16.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let fit = linear_fit(&[(2018.0, 3000.0), (2019.0, 3200.0), (2020.0, 3400.0)]).unwrap();
        assert!((fit.slope - 200.0).abs() < EPS);
        assert!((fit.predict(2019.0) - 3200.0).abs() < 1e-6);
    }

    #[test]
    fn linear_fit_degenerate_inputs() {
        assert!(linear_fit(&[(2019.0, 1.0)]).is_none());
        assert!(linear_fit(&[(2019.0, 1.0), (2019.0, 2.0)]).is_none());
    }
}
