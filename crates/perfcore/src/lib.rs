//! Core data model for the process performance engine
//!
//! Flow elements, gateways, ordered block structures, settings and the
//! result types shared by validation and calculation. No algorithms live here.

mod error;
mod gateway;
mod model;
mod ordered;
mod performance;
mod problem;
mod report;
mod settings;

pub use error::{CalculationError, DecomposeError, ModelError, PerfError};
pub use gateway::{Gateway, GatewayClass, GatewayPattern};
pub use model::{
    connect_elements, Definitions, ElementKind, FixedPerformance, FlowElement, ProcessBundle,
    ProcessDefinition, RootElement,
};
pub use ordered::{Activity, Block, BranchPath, Member, NestedProcess, OrderedProcess};
pub use performance::{
    latest, Cumulative, CumulativePerformance, ElementPerformance, ElementPerformanceEntry,
    Performance, PerformanceTriple, ProcessPerformance, TotalPerformance,
};
pub use problem::{Problem, ProblemKind, PROCESS_LEVEL};
pub use report::{ProcessAnalysis, ValidationResult};
pub use settings::{Calculation, Settings};

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PerfError>;
