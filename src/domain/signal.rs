//! Moving-average crossover signal.
//!
//! Long when fast MA > slow MA, Flat otherwise. A position where either
//! average is still in warmup is Flat, never undefined.

use crate::domain::error::DashboardError;
use crate::domain::indicator::IndicatorSeries;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
}

impl Position {
    /// 0.0 for Flat, 1.0 for Long.
    pub fn weight(&self) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long => 1.0,
        }
    }
}

impl From<bool> for Position {
    fn from(long: bool) -> Self {
        if long { Position::Long } else { Position::Flat }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub timestamp: NaiveDateTime,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn position(&self, index: usize) -> Position {
        self.points
            .get(index)
            .map(|p| p.position)
            .unwrap_or_default()
    }
}

pub fn generate_signals(
    fast: &IndicatorSeries,
    slow: &IndicatorSeries,
) -> Result<SignalSeries, DashboardError> {
    if fast.len() != slow.len() {
        return Err(DashboardError::LengthMismatch {
            left: fast.len(),
            right: slow.len(),
        });
    }

    let points = fast
        .values
        .iter()
        .zip(&slow.values)
        .map(|(f, s)| {
            let long = match (f.value, s.value) {
                (Some(fv), Some(sv)) => fv > sv,
                _ => false,
            };
            SignalPoint {
                timestamp: f.timestamp,
                position: Position::from(long),
            }
        })
        .collect();

    Ok(SignalSeries { points })
}
