use crate::{FlowElement, Gateway, Problem, ProcessPerformance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of validating one process level and everything nested in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub process_id: String,
    pub validation_passed: bool,
    pub problems: Vec<Problem>,
    /// Populated only when validation passed
    pub validated_elements: Vec<FlowElement>,
    pub gateways: Vec<Gateway>,
    /// Results for sub-processes and called processes, keyed by activity id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, ValidationResult>,
}

impl ValidationResult {
    pub fn passed(
        process_id: impl Into<String>,
        validated_elements: Vec<FlowElement>,
        gateways: Vec<Gateway>,
        nested: BTreeMap<String, ValidationResult>,
    ) -> Self {
        Self {
            process_id: process_id.into(),
            validation_passed: true,
            problems: Vec::new(),
            validated_elements,
            gateways,
            nested,
        }
    }

    pub fn failed(process_id: impl Into<String>, problems: Vec<Problem>) -> Self {
        Self {
            process_id: process_id.into(),
            validation_passed: false,
            problems,
            validated_elements: Vec::new(),
            gateways: Vec::new(),
            nested: BTreeMap::new(),
        }
    }
}

/// Combined validation and calculation outcome for one process definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessAnalysis {
    pub process_id: String,
    pub failed: bool,
    pub process_performance: Option<ProcessPerformance>,
    pub problems: Vec<Problem>,
}
