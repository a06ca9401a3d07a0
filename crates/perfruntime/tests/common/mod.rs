#![allow(dead_code)]

use perfcore::{
    Definitions, ElementKind, FlowElement, PerformanceTriple, ProcessBundle, ProcessDefinition,
};

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Relative comparison; millisecond totals get large
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

pub fn assert_triple(actual: PerformanceTriple, average: f64, min: f64, max: f64) {
    assert!(
        approx_eq(actual.average, average)
            && approx_eq(actual.min, min)
            && approx_eq(actual.max, max),
        "expected {{average: {}, min: {}, max: {}}}, got {:?}",
        average,
        min,
        max,
        actual
    );
}

pub fn task(id: &str, duration: f64, cost: f64) -> FlowElement {
    FlowElement::task(id).with_duration(duration).with_cost(cost)
}

/// Start -> A(1000ms, 10) -> B(2000ms, 20) -> End
pub fn sequential(id: &str) -> ProcessDefinition {
    let mut process = ProcessDefinition::new(id);
    process.add(FlowElement::start_event("Start"));
    process.add(task("A", 1000.0, 10.0));
    process.add(task("B", 2000.0, 20.0));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "A").unwrap();
    process.connect("A", "B").unwrap();
    process.connect("B", "End").unwrap();
    process
}

/// Start -> Split -> { A(1000ms, 5) | B(2000ms, 8) } -> Join -> End
///
/// Probabilities are attached to the split's flows when given.
pub fn branching(
    id: &str,
    gateway: ElementKind,
    probabilities: Option<(f64, f64)>,
) -> ProcessDefinition {
    let mut process = ProcessDefinition::new(id);
    process.add(FlowElement::start_event("Start"));
    process.add(FlowElement::new("Split", gateway.clone()));
    process.add(task("A", 1000.0, 5.0));
    process.add(task("B", 2000.0, 8.0));
    process.add(FlowElement::new("Join", gateway));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "Split").unwrap();
    match probabilities {
        Some((a, b)) => {
            process.connect_with_probability("Split", "A", a).unwrap();
            process.connect_with_probability("Split", "B", b).unwrap();
        }
        None => {
            process.connect("Split", "A").unwrap();
            process.connect("Split", "B").unwrap();
        }
    }
    process.connect("A", "Join").unwrap();
    process.connect("B", "Join").unwrap();
    process.connect("Join", "End").unwrap();
    process
}

/// Start -> LoopJoin -> A(1000ms, 10) -> LoopSplit -> { LoopJoin (back) | End }
pub fn looping(id: &str, back_probability: f64) -> ProcessDefinition {
    let mut process = ProcessDefinition::new(id);
    process.add(FlowElement::start_event("Start"));
    process.add(FlowElement::exclusive_gateway("LoopJoin"));
    process.add(task("A", 1000.0, 10.0));
    process.add(FlowElement::exclusive_gateway("LoopSplit"));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "LoopJoin").unwrap();
    process.connect("LoopJoin", "A").unwrap();
    process.connect("A", "LoopSplit").unwrap();
    process
        .connect_with_probability("LoopSplit", "LoopJoin", back_probability)
        .unwrap();
    process
        .connect_with_probability("LoopSplit", "End", 100.0 - back_probability)
        .unwrap();
    process
}

pub fn bundle(processes: Vec<ProcessDefinition>) -> ProcessBundle {
    let definitions = processes
        .into_iter()
        .fold(Definitions::new(), |defs, p| defs.with_process(p));
    ProcessBundle::new(definitions)
}
