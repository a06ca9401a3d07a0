use crate::calculator::PerformanceCalculator;
use crate::decompose::decompose;
use crate::element::ElementValidator;
use crate::validator::ProcessValidator;
use perfcore::{
    CalculationError, Cumulative, Problem, ProblemKind, ProcessAnalysis, ProcessBundle, Settings,
    ValidationResult,
};
use std::sync::Arc;

const EXTRACTION_FAILED: &str = "Process elements could not be extracted for calculation.";

/// Validate and calculate every process definition of a bundle
pub fn analyse(bundle: &ProcessBundle, settings: &Settings) -> Vec<ProcessAnalysis> {
    ProcessAnalyzer::new(settings.clone()).analyse(bundle)
}

/// Runs validation, block extraction and calculation per process definition.
/// A failing definition is reported and the others still get analysed.
#[derive(Clone)]
pub struct ProcessAnalyzer {
    validator: ProcessValidator,
}

impl ProcessAnalyzer {
    pub fn new(settings: Settings) -> Self {
        Self {
            validator: ProcessValidator::new(settings),
        }
    }

    pub fn with_element_validator(
        settings: Settings,
        element_validator: Arc<dyn ElementValidator>,
    ) -> Self {
        Self {
            validator: ProcessValidator::with_element_validator(settings, element_validator),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.validator.settings()
    }

    pub fn validate(&self, bundle: &ProcessBundle) -> Vec<ValidationResult> {
        self.validator.validate(bundle)
    }

    pub fn analyse(&self, bundle: &ProcessBundle) -> Vec<ProcessAnalysis> {
        self.validate(bundle)
            .into_iter()
            .map(|result| self.analyse_result(result))
            .collect()
    }

    fn analyse_result(&self, result: ValidationResult) -> ProcessAnalysis {
        let process_id = result.process_id.clone();
        if !result.validation_passed {
            return failed(process_id, result.problems);
        }

        let settings = self.settings();
        let ordered = match decompose(&result, settings) {
            Ok(ordered) => ordered,
            Err(e) => {
                tracing::warn!(process = %process_id, error = %e, "Block extraction failed");
                let problem =
                    Problem::new(&process_id, ProblemKind::ExtractionFailure, EXTRACTION_FAILED);
                return failed(process_id, vec![problem]);
            }
        };

        match PerformanceCalculator::new(settings).calculate(
            &process_id,
            &ordered,
            Cumulative::default(),
        ) {
            Ok(performance) => {
                tracing::info!(process = %process_id, "Process analysed");
                ProcessAnalysis {
                    process_id,
                    failed: false,
                    process_performance: Some(performance),
                    problems: Vec::new(),
                }
            }
            Err(e) => {
                tracing::warn!(process = %process_id, error = %e, "Calculation failed");
                let problem = match &e {
                    CalculationError::UnboundedLoop { flow, .. } => Problem::new(
                        flow.clone(),
                        ProblemKind::FieldValidationFailure,
                        "The probability of a looping sequence flow needs to be below 100.",
                    ),
                };
                failed(process_id, vec![problem])
            }
        }
    }
}

fn failed(process_id: String, problems: Vec<Problem>) -> ProcessAnalysis {
    ProcessAnalysis {
        process_id,
        failed: true,
        process_performance: None,
        problems,
    }
}
