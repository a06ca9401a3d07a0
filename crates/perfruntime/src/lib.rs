//! Process performance engine
//!
//! Validates that process graphs decompose into nested split/join/loop
//! blocks, extracts those blocks and aggregates duration and cost over them.

mod analysis;
mod calculator;
mod decompose;
mod element;
mod graph;
mod structure;
mod validator;

pub use analysis::{analyse, ProcessAnalyzer};
pub use calculator::PerformanceCalculator;
pub use decompose::decompose;
pub use element::{BasicElementValidator, ElementCheck, ElementValidator};
pub use graph::ProcessGraph;
pub use structure::{classify_gateway, StructureReport, StructureValidator};
pub use validator::ProcessValidator;
