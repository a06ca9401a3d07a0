use thiserror::Error;

#[derive(Error, Debug)]
pub enum PerfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Sequence flow not found: {0}")]
    FlowNotFound(String),

    #[error("Element '{0}' is not a sequence flow")]
    NotASequenceFlow(String),

    #[error("Duplicate element id: {0}")]
    DuplicateId(String),
}

/// Raised when a validated process cannot be turned into nested blocks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecomposeError {
    #[error("Process has no start event")]
    MissingStart,

    #[error("Element visited twice while extracting blocks: {0}")]
    Revisited(String),

    #[error("No gateway annotation for {0}")]
    UnknownGateway(String),

    #[error("Element {0} has no outgoing sequence flow")]
    DeadEnd(String),

    #[error("Join {0} is not preceded by a matching split")]
    StrayJoin(String),

    #[error("Paths of split {split} do not close at a single join")]
    UnmatchedSplit { split: String },

    #[error("Loop join {join} does not lead to its split {split}")]
    BrokenLoop { join: String, split: String },

    #[error("Missing nested process for activity {0}")]
    MissingNested(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculationError {
    #[error("Looping flow {flow} has probability {probability}, the loop never exits")]
    UnboundedLoop { flow: String, probability: f64 },
}
