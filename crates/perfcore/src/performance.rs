use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Average, best case and worst case of one measure
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTriple {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

impl PerformanceTriple {
    pub const ZERO: Self = Self {
        average: 0.0,
        min: 0.0,
        max: 0.0,
    };

    pub fn new(average: f64, min: f64, max: f64) -> Self {
        Self { average, min, max }
    }

    /// A value without spread
    pub fn fixed(value: f64) -> Self {
        Self::new(value, value, value)
    }

    /// Concurrent paths: the slowest path bounds completion in every case.
    pub fn concurrent(paths: &[Self]) -> Self {
        paths.iter().fold(Self::ZERO, |acc, p| Self {
            average: acc.average.max(p.average),
            min: acc.min.max(p.min),
            max: acc.max.max(p.max),
        })
    }

    /// Exactly one path is taken; `weight` is the branch probability as a fraction.
    pub fn exclusive(paths: &[(f64, Self)]) -> Self {
        if paths.is_empty() {
            return Self::ZERO;
        }
        let average = paths.iter().map(|(w, p)| w * p.average).sum();
        let min = paths
            .iter()
            .map(|(_, p)| p.min)
            .fold(f64::INFINITY, f64::min);
        let max = paths
            .iter()
            .map(|(_, p)| p.max)
            .fold(f64::NEG_INFINITY, f64::max);
        Self { average, min, max }
    }

    /// Geometric repetition of a looped path. `loop_probability` is the 0..100
    /// chance of taking the looping flow again; the minimum stays at one pass.
    /// Returns `None` when the loop never exits.
    pub fn repeated(self, loop_probability: f64) -> Option<Self> {
        let divisor = 1.0 - loop_probability / 100.0;
        if divisor <= 0.0 {
            return None;
        }
        Some(Self {
            average: self.average / divisor,
            min: self.min,
            max: self.max / divisor,
        })
    }
}

impl Add for PerformanceTriple {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            average: self.average + rhs.average,
            min: self.min + rhs.min,
            max: self.max + rhs.max,
        }
    }
}

impl AddAssign for PerformanceTriple {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for PerformanceTriple {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Duration (ms) and cost triples of one member of an ordered process
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub duration: PerformanceTriple,
    pub cost: PerformanceTriple,
}

impl Performance {
    pub fn fixed(duration: f64, cost: f64) -> Self {
        Self {
            duration: PerformanceTriple::fixed(duration),
            cost: PerformanceTriple::fixed(cost),
        }
    }
}

impl Add for Performance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            duration: self.duration + rhs.duration,
            cost: self.cost + rhs.cost,
        }
    }
}

impl AddAssign for Performance {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Performance {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Running totals threaded through a calculation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cumulative {
    pub duration: f64,
    pub cost: f64,
    pub last_end_date: Option<DateTime<Utc>>,
}

impl Cumulative {
    pub fn advance(&mut self, duration: f64, cost: f64, end_date: Option<DateTime<Utc>>) {
        self.duration += duration;
        self.cost += cost;
        self.last_end_date = latest(self.last_end_date, end_date);
    }
}

pub fn latest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPerformance {
    pub duration: f64,
    pub cost: f64,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CumulativePerformance {
    pub duration: f64,
    pub cost: f64,
}

/// Performance of one element and the running totals once it has completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPerformanceEntry {
    pub id: String,
    pub kind_tag: String,
    pub parent_process_id: String,
    pub element_performance: ElementPerformance,
    pub cumulative_performance: CumulativePerformance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalPerformance {
    pub duration: PerformanceTriple,
    pub cost: PerformanceTriple,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPerformance {
    pub element_performance_array: Vec<ElementPerformanceEntry>,
    pub total_performance: TotalPerformance,
}
