//! RomTrend - Linear fit over a patient's range-of-motion series

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

/// Minimum measurements needed before fitting a trend
pub const MIN_DATA_POINTS: usize = 3;

/// Fitted daily ROM progression
#[derive(Debug, Clone)]
pub struct RomTrend {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
}

impl RomTrend {
    /// Fit a linear trend over daily ROM measurements.
    /// Returns None when there is not enough data or the fit fails.
    pub fn fit(rom_data: &[f64]) -> Option<Self> {
        if rom_data.len() < MIN_DATA_POINTS {
            return None;
        }

        let n = rom_data.len();
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let records = Array2::from_shape_vec((n, 1), x).ok()?;
        let targets = Array1::from_vec(rom_data.to_vec());
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);

        Some(Self {
            slope: model.params()[0],
            intercept: model.intercept(),
            r2_score,
            data_points: n,
        })
    }

    /// Fitted gain in degrees per day
    pub fn daily_gain(&self) -> f64 {
        self.slope
    }

    /// Goodness of fit, 0.0 to 1.0
    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.data_points
    }

    /// Fitted ROM at a given day index
    pub fn predict_at(&self, day: usize) -> f64 {
        self.intercept + self.slope * day as f64
    }

    /// Days from the last measurement until the fitted line reaches the
    /// target. None when the trend is flat or declining.
    pub fn days_to_reach(&self, target: f64) -> Option<u32> {
        if self.slope <= 0.0 {
            return None;
        }
        let last_day = (self.data_points - 1) as f64;
        let reach_day = (target - self.intercept) / self.slope;
        let remaining = (reach_day - last_day).ceil().max(0.0);
        Some(remaining as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data() {
        assert!(RomTrend::fit(&[70.0, 72.0]).is_none());
        assert!(RomTrend::fit(&[]).is_none());
    }

    #[test]
    fn test_linear_series_slope() {
        let trend = RomTrend::fit(&[70.0, 72.0, 74.0, 76.0, 78.0]).unwrap();
        assert!(
            (trend.daily_gain() - 2.0).abs() < 0.01,
            "Expected ~2.0 deg/day, got {}",
            trend.daily_gain()
        );
        assert!(
            trend.r2_score() > 0.9,
            "Linear data should fit well, r2 = {}",
            trend.r2_score()
        );
        assert_eq!(trend.data_points(), 5);
    }

    #[test]
    fn test_predict_extends_the_line() {
        let trend = RomTrend::fit(&[70.0, 72.0, 74.0, 76.0, 78.0]).unwrap();
        let predicted = trend.predict_at(7);
        assert!(
            (predicted - 84.0).abs() < 0.5,
            "Expected ~84 at day 7, got {predicted}"
        );
    }

    #[test]
    fn test_days_to_reach_target() {
        let trend = RomTrend::fit(&[70.0, 72.0, 74.0, 76.0, 78.0]).unwrap();
        let days = trend.days_to_reach(90.0).unwrap();
        assert_eq!(days, 6, "From 78 at 2 deg/day, 90 is 6 days out");
    }

    #[test]
    fn test_target_already_reached() {
        let trend = RomTrend::fit(&[100.0, 110.0, 120.0, 130.0]).unwrap();
        assert_eq!(trend.days_to_reach(120.0), Some(0));
    }

    #[test]
    fn test_declining_trend_never_reaches() {
        let trend = RomTrend::fit(&[80.0, 78.0, 76.0, 74.0]).unwrap();
        assert!(trend.daily_gain() < 0.0);
        assert!(trend.days_to_reach(120.0).is_none());
    }
}
