use crate::element::{BasicElementValidator, ElementValidator};
use crate::graph::ProcessGraph;
use crate::structure::StructureValidator;
use perfcore::{
    ElementKind, FlowElement, ModelError, Problem, ProblemKind, ProcessBundle, ProcessDefinition,
    Settings, ValidationResult,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Validates every process definition of a bundle, descending into
/// sub-processes and called processes.
#[derive(Clone)]
pub struct ProcessValidator {
    settings: Settings,
    element_validator: Arc<dyn ElementValidator>,
}

impl ProcessValidator {
    pub fn new(settings: Settings) -> Self {
        Self::with_element_validator(settings, Arc::new(BasicElementValidator))
    }

    pub fn with_element_validator(
        settings: Settings,
        element_validator: Arc<dyn ElementValidator>,
    ) -> Self {
        Self {
            settings,
            element_validator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// One result per process definition in the bundle's main document
    pub fn validate(&self, bundle: &ProcessBundle) -> Vec<ValidationResult> {
        bundle
            .processes()
            .map(|process| self.validate_process(process, &bundle.called_processes))
            .collect()
    }

    pub fn validate_process(
        &self,
        process: &ProcessDefinition,
        called: &[ProcessBundle],
    ) -> ValidationResult {
        let result = self.validate_level(&process.id, &process.flow_elements, called);
        if result.validation_passed {
            tracing::info!(process = %process.id, "Process passed validation");
        } else {
            tracing::warn!(
                process = %process.id,
                problems = result.problems.len(),
                "Process failed validation"
            );
        }
        result
    }

    fn validate_level(
        &self,
        level_id: &str,
        elements: &[FlowElement],
        called: &[ProcessBundle],
    ) -> ValidationResult {
        let graph = match ProcessGraph::new(elements) {
            Ok(graph) => graph,
            Err(ModelError::DuplicateId(id)) => {
                return ValidationResult::failed(
                    level_id,
                    vec![Problem::new(
                        id,
                        ProblemKind::FieldValidationFailure,
                        "The element id is used more than once.",
                    )],
                );
            }
            Err(e) => {
                return ValidationResult::failed(
                    level_id,
                    vec![Problem::process_level(
                        ProblemKind::FieldValidationFailure,
                        e.to_string(),
                    )],
                );
            }
        };

        let mut problems = boundary_event_problems(elements);
        let mut nested = BTreeMap::new();

        for element in elements {
            let check = self
                .element_validator
                .validate_element(element, &graph, &self.settings);
            problems.extend(check.problems);

            match &element.kind {
                ElementKind::SubProcess { flow_elements } => {
                    let inner = self.validate_level(&element.id, flow_elements, called);
                    if inner.validation_passed {
                        nested.insert(element.id.clone(), inner);
                    } else {
                        let message = if only_structural(&inner.problems) {
                            "The subprocess is structured incorrectly, specifics are provided separately."
                        } else {
                            "The subprocess has incorrect content, specifics are provided separately."
                        };
                        problems.push(Problem::new(
                            element.id.clone(),
                            ProblemKind::NestedProcess,
                            message,
                        ));
                        problems.extend(inner.problems);
                    }
                }
                ElementKind::CallActivity { called_element }
                    if check.passed && !self.settings.overwrite_with_parent_performance =>
                {
                    match resolve_called(called_element, called) {
                        None => problems.push(Problem::new(
                            element.id.clone(),
                            ProblemKind::UnresolvedReference,
                            "Could not find a matching called process.",
                        )),
                        Some((bundle, process)) => {
                            let inner =
                                self.validate_process(process, &bundle.called_processes);
                            if inner.validation_passed {
                                nested.insert(element.id.clone(), inner);
                            } else {
                                problems.push(Problem::new(
                                    element.id.clone(),
                                    ProblemKind::NestedProcess,
                                    "The called process has incorrect content or structure, specifics are provided separately.",
                                ));
                                problems.extend(inner.problems);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let starts: Vec<&FlowElement> = elements
            .iter()
            .filter(|e| e.kind == ElementKind::StartEvent)
            .collect();
        if let [start] = starts.as_slice() {
            for id in graph.unreachable_from(&start.id) {
                problems.push(Problem::new(
                    id,
                    ProblemKind::FieldValidationFailure,
                    "The element cannot be reached from the start event.",
                ));
            }
        }

        let structure = StructureValidator::new(&graph).validate();
        problems.extend(structure.problems);
        if !problems.is_empty() {
            return ValidationResult::failed(level_id, problems);
        }

        ValidationResult::passed(level_id, elements.to_vec(), structure.gateways, nested)
    }
}

/// Exactly one start and one end event per process level
fn boundary_event_problems(elements: &[FlowElement]) -> Vec<Problem> {
    let mut problems = Vec::new();
    for (kind, name) in [(ElementKind::StartEvent, "Start"), (ElementKind::EndEvent, "End")] {
        let found: Vec<&FlowElement> = elements.iter().filter(|e| e.kind == kind).collect();
        match found.len() {
            0 => problems.push(Problem::process_level(
                ProblemKind::MissingOrExcessBoundaryEvent,
                format!("{} event is required.", name),
            )),
            1 => {}
            _ => problems.extend(found.iter().map(|e| {
                Problem::new(
                    e.id.clone(),
                    ProblemKind::MissingOrExcessBoundaryEvent,
                    format!("Only one {} event is allowed.", name.to_lowercase()),
                )
            })),
        }
    }
    problems
}

fn only_structural(problems: &[Problem]) -> bool {
    problems
        .iter()
        .all(|p| matches!(p.kind, ProblemKind::StructuralImbalance | ProblemKind::ForbiddenLoop))
}

/// Find the called process whose id matches the reference, in either direction
fn resolve_called<'b>(
    called_element: &str,
    called: &'b [ProcessBundle],
) -> Option<(&'b ProcessBundle, &'b ProcessDefinition)> {
    if called_element.is_empty() {
        return None;
    }
    called.iter().find_map(|bundle| {
        bundle
            .processes()
            .find(|p| {
                !p.id.is_empty()
                    && (p.id.contains(called_element) || called_element.contains(p.id.as_str()))
            })
            .map(|process| (bundle, process))
    })
}
