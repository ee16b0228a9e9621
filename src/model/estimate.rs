use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Increase => "Increase",
            Direction::Decrease => "Decrease",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted direction outlook for one trimmed monthly series.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedEstimate {
    pub prob_increase: f64,
    pub prob_decrease: f64,
    pub direction: Direction,
    pub direction_probability: f64,
    pub expected_pct_change: f64,
    pub max_upside: Option<f64>,
    pub max_downside: Option<f64>,
}
