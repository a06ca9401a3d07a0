use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Calculation {
    Time,
    Cost,
    Dates,
}

/// Per-run analysis settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub calculations: Vec<Calculation>,
    pub consider_performance_in_sequence_flows: bool,
    pub overwrite_with_parent_performance: bool,
    pub ignore_missing_basic_performance: bool,
    pub ignore_missing_optional_performance: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calculations: vec![Calculation::Time, Calculation::Cost],
            consider_performance_in_sequence_flows: false,
            overwrite_with_parent_performance: false,
            ignore_missing_basic_performance: false,
            ignore_missing_optional_performance: false,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file; missing keys fall back to defaults
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn with_calculations(mut self, calculations: &[Calculation]) -> Self {
        self.calculations = calculations.to_vec();
        self
    }

    pub fn calculates(&self, calculation: Calculation) -> bool {
        self.calculations.contains(&calculation)
    }

    pub fn time(&self) -> bool {
        self.calculates(Calculation::Time)
    }

    pub fn cost(&self) -> bool {
        self.calculates(Calculation::Cost)
    }

    pub fn dates(&self) -> bool {
        self.calculates(Calculation::Dates)
    }
}
