use serde::{Deserialize, Serialize};

/// Id used for problems that concern the process as a whole
pub const PROCESS_LEVEL: &str = "none";

/// Failure categories a caller can group problems by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProblemKind {
    MissingOrExcessBoundaryEvent,
    FieldValidationFailure,
    StructuralImbalance,
    ForbiddenLoop,
    UnresolvedReference,
    NestedProcess,
    ExtractionFailure,
}

/// A human-readable diagnostic keyed to the offending element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub problem: String,
    pub kind: ProblemKind,
}

impl Problem {
    pub fn new(id: impl Into<String>, kind: ProblemKind, problem: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            problem: problem.into(),
            kind,
        }
    }

    pub fn process_level(kind: ProblemKind, problem: impl Into<String>) -> Self {
        Self::new(PROCESS_LEVEL, kind, problem)
    }
}
