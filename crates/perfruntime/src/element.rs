use crate::graph::ProcessGraph;
use perfcore::{ElementKind, FlowElement, GatewayClass, Problem, ProblemKind, Settings};

/// Result of checking one element in isolation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementCheck {
    pub passed: bool,
    pub problems: Vec<Problem>,
}

impl ElementCheck {
    pub fn from_problems(problems: Vec<Problem>) -> Self {
        Self {
            passed: problems.is_empty(),
            problems,
        }
    }
}

/// Per-element validation used by the process validator.
///
/// Implementations must only pass gateways that either split or join, since
/// the structure check relies on an unambiguous classification.
pub trait ElementValidator: Send + Sync {
    fn validate_element(
        &self,
        element: &FlowElement,
        level: &ProcessGraph<'_>,
        settings: &Settings,
    ) -> ElementCheck;
}

/// Flow cardinality, references, probabilities and performance fields
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicElementValidator;

impl ElementValidator for BasicElementValidator {
    fn validate_element(
        &self,
        element: &FlowElement,
        level: &ProcessGraph<'_>,
        settings: &Settings,
    ) -> ElementCheck {
        let mut problems = Vec::new();
        let mut report = |message: &str| {
            problems.push(Problem::new(
                element.id.clone(),
                ProblemKind::FieldValidationFailure,
                message,
            ))
        };

        let dangling = element
            .incoming
            .iter()
            .chain(element.outgoing.iter())
            .any(|id| level.flow(id).is_err());
        if dangling {
            report("The element references a sequence flow that does not exist.");
        }

        let incoming = element.incoming.len();
        let outgoing = element.outgoing.len();
        match &element.kind {
            ElementKind::StartEvent => {
                if incoming > 0 {
                    report("A start event cannot have incoming sequence flows.");
                }
                if outgoing != 1 {
                    report("A start event needs exactly one outgoing sequence flow.");
                }
            }
            ElementKind::EndEvent => {
                if incoming == 0 {
                    report("An end event needs at least one incoming sequence flow.");
                }
                if outgoing > 0 {
                    report("An end event cannot have outgoing sequence flows.");
                }
            }
            ElementKind::SequenceFlow {
                source_ref,
                target_ref,
                probability,
            } => {
                let source = level.element(source_ref);
                if source.is_none() || level.element(target_ref).is_none() {
                    report("The sequence flow references an element that does not exist.");
                }
                if let Some(p) = probability {
                    if !(0.0..=100.0).contains(p) {
                        report("The probability needs to be between 0 and 100.");
                    }
                }
                let leaves_exclusive_split = source.is_some_and(|s| {
                    s.kind.gateway_class() == Some(GatewayClass::Exclusive) && s.outgoing.len() > 1
                });
                if leaves_exclusive_split && probability.is_none() {
                    report("A sequence flow leaving an exclusive split needs a probability.");
                }
            }
            kind if kind.is_gateway() => {
                let splits = outgoing > 1 && incoming == 1;
                let joins = incoming > 1 && outgoing == 1;
                if splits == joins {
                    report("The gateway needs to either split or join paths.");
                }
                if splits && kind.gateway_class() == Some(GatewayClass::Exclusive) {
                    let flows = level.outgoing_flows(element);
                    let all_weighted = flows.iter().all(|f| f.probability().is_some());
                    let total: f64 = flows.iter().filter_map(|f| f.probability()).sum();
                    if all_weighted && (total - 100.0).abs() > 1e-6 {
                        report("The probabilities of the outgoing sequence flows need to add up to 100.");
                    }
                }
            }
            _ => {
                if incoming != 1 {
                    report("The element needs exactly one incoming sequence flow.");
                }
                if outgoing != 1 {
                    report("The element needs exactly one outgoing sequence flow.");
                }
            }
        }

        if element.duration.is_some_and(|d| d < 0.0) || element.cost.is_some_and(|c| c < 0.0) {
            report("Duration and cost cannot be negative.");
        }

        let carries_performance = element.kind.is_task_like()
            || (element.is_sequence_flow() && settings.consider_performance_in_sequence_flows);
        if carries_performance && !settings.ignore_missing_basic_performance {
            if settings.time() && element.duration.is_none() {
                report("The element needs a duration.");
            }
            if settings.cost() && element.cost.is_none() {
                report("The element needs a cost.");
            }
        }

        if element.kind.is_activity()
            && settings.overwrite_with_parent_performance
            && !settings.ignore_missing_basic_performance
            && element.parent.is_none()
        {
            report("The element needs performance values from its parent.");
        }

        if element.kind.is_task_like() && settings.dates() {
            match (element.start, element.end) {
                (Some(start), Some(end)) if end < start => {
                    report("The end date cannot be before the start date.");
                }
                (Some(_), Some(_)) => {}
                _ if !settings.ignore_missing_optional_performance => {
                    report("The element needs a start and end date.");
                }
                _ => {}
            }
        }

        ElementCheck::from_problems(problems)
    }
}
