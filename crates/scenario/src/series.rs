use crate::error::{Result, ScenarioError};
use serde::{Deserialize, Serialize};

/// Yearly values, linearly interpolated between observations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// (year, value), sorted by year, one value per year
    points: Vec<(i32, f64)>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let mut series = Self::new();
        for (year, value) in points {
            series.insert(year, value);
        }
        series
    }

    /// Set the value of `year`, replacing an earlier one
    pub fn insert(&mut self, year: i32, value: f64) {
        match self.points.binary_search_by_key(&year, |&(y, _)| y) {
            Ok(pos) => self.points[pos].1 = value,
            Err(pos) => self.points.insert(pos, (year, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|&(year, _)| year)
    }

    /// Value at `year`.
    ///
    /// Linear between the bracketing observations, held constant beyond
    /// the first and last ones.
    pub fn interpolate(&self, year: i32) -> Result<f64> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(ScenarioError::EmptySeries),
        };

        if year <= first.0 {
            return Ok(first.1);
        }
        if year >= last.0 {
            return Ok(last.1);
        }

        match self.points.binary_search_by_key(&year, |&(y, _)| y) {
            Ok(pos) => Ok(self.points[pos].1),
            Err(pos) => {
                let (y0, v0) = self.points[pos - 1];
                let (y1, v1) = self.points[pos];
                let t = f64::from(year - y0) / f64::from(y1 - y0);
                Ok(v0 + t * (v1 - v0))
            }
        }
    }
}
