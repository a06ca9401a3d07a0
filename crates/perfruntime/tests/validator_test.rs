mod common;

use common::{branching, bundle, init_tracing, sequential, task};
use perfcore::{
    connect_elements, Calculation, Definitions, ElementKind, FixedPerformance, FlowElement,
    Problem, ProblemKind, ProcessBundle, ProcessDefinition, Settings, PROCESS_LEVEL,
};
use perfruntime::{
    BasicElementValidator, ElementCheck, ElementValidator, ProcessGraph, ProcessValidator,
};
use std::sync::Arc;

fn validate_one(process: ProcessDefinition, settings: Settings) -> perfcore::ValidationResult {
    let results = ProcessValidator::new(settings).validate(&bundle(vec![process]));
    assert_eq!(results.len(), 1);
    results.into_iter().next().unwrap()
}

fn has(problems: &[Problem], id: &str, message: &str) -> bool {
    problems.iter().any(|p| p.id == id && p.problem == message)
}

/// Start -> Call -> End, where Call references `called`
fn calling(id: &str, called: &str) -> ProcessDefinition {
    let mut process = ProcessDefinition::new(id);
    process.add(FlowElement::start_event("Start"));
    process.add(FlowElement::call_activity("Call", called));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "Call").unwrap();
    process.connect("Call", "End").unwrap();
    process
}

/// Wrap the given inner elements into Start -> Sub -> End
fn with_sub_process(id: &str, inner: Vec<FlowElement>) -> ProcessDefinition {
    let mut process = ProcessDefinition::new(id);
    process.add(FlowElement::start_event("Start"));
    process.add(FlowElement::sub_process("Sub", inner));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "Sub").unwrap();
    process.connect("Sub", "End").unwrap();
    process
}

#[test]
fn test_sequential_process_passes() {
    init_tracing();
    let result = validate_one(sequential("Process_Seq"), Settings::default());

    assert!(result.validation_passed, "{:?}", result.problems);
    assert_eq!(result.process_id, "Process_Seq");
    assert!(result.problems.is_empty());
    assert_eq!(result.validated_elements.len(), 7);
    assert!(result.gateways.is_empty());
    assert!(result.nested.is_empty());
}

#[test]
fn test_one_result_per_process_definition() {
    let results = ProcessValidator::new(Settings::default()).validate(&bundle(vec![
        sequential("Process_A"),
        branching("Process_B", ElementKind::ParallelGateway, None),
    ]));

    let ids: Vec<&str> = results.iter().map(|r| r.process_id.as_str()).collect();
    assert_eq!(ids, vec!["Process_A", "Process_B"]);
    assert!(results.iter().all(|r| r.validation_passed));
    assert_eq!(results[1].gateways.len(), 2);
}

#[test]
fn test_two_start_events_are_reported_individually() {
    let mut process = ProcessDefinition::new("Process_Starts");
    process.add(FlowElement::start_event("Start_1"));
    process.add(FlowElement::start_event("Start_2"));
    process.add(FlowElement::parallel_gateway("Join"));
    process.add(task("A", 1.0, 1.0));
    process.add(FlowElement::end_event("End"));
    process.connect("Start_1", "Join").unwrap();
    process.connect("Start_2", "Join").unwrap();
    process.connect("Join", "A").unwrap();
    process.connect("A", "End").unwrap();

    let result = validate_one(process, Settings::default());

    assert!(!result.validation_passed);
    assert!(result.validated_elements.is_empty());
    let boundary: Vec<&Problem> = result
        .problems
        .iter()
        .filter(|p| p.kind == ProblemKind::MissingOrExcessBoundaryEvent)
        .collect();
    assert_eq!(boundary.len(), 2);
    assert!(has(&result.problems, "Start_1", "Only one start event is allowed."));
    assert!(has(&result.problems, "Start_2", "Only one start event is allowed."));
}

#[test]
fn test_missing_end_event_is_a_process_level_problem() {
    let mut process = ProcessDefinition::new("Process_NoEnd");
    process.add(FlowElement::start_event("Start"));
    process.add(task("A", 1.0, 1.0));
    process.connect("Start", "A").unwrap();

    let result = validate_one(process, Settings::default());

    assert!(!result.validation_passed);
    let boundary: Vec<&Problem> = result
        .problems
        .iter()
        .filter(|p| p.kind == ProblemKind::MissingOrExcessBoundaryEvent)
        .collect();
    assert_eq!(boundary.len(), 1);
    assert_eq!(boundary[0].id, PROCESS_LEVEL);
    assert_eq!(boundary[0].problem, "End event is required.");
}

#[test]
fn test_empty_process_needs_both_boundary_events() {
    let result = validate_one(ProcessDefinition::new("Process_Empty"), Settings::default());

    assert!(!result.validation_passed);
    assert!(has(&result.problems, "none", "Start event is required."));
    assert!(has(&result.problems, "none", "End event is required."));
}

#[test]
fn test_duplicate_ids_fail_the_level() {
    let mut process = sequential("Process_Dup");
    process.add(task("A", 1.0, 1.0));

    let result = validate_one(process, Settings::default());

    assert!(!result.validation_passed);
    assert_eq!(result.problems.len(), 1);
    assert_eq!(result.problems[0].id, "A");
    assert_eq!(result.problems[0].problem, "The element id is used more than once.");
}

#[test]
fn test_missing_duration_and_cost() {
    let mut process = ProcessDefinition::new("Process_Bare");
    process.add(FlowElement::start_event("Start"));
    process.add(FlowElement::task("A"));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "A").unwrap();
    process.connect("A", "End").unwrap();

    let result = validate_one(process.clone(), Settings::default());
    assert!(!result.validation_passed);
    assert!(has(&result.problems, "A", "The element needs a duration."));
    assert!(has(&result.problems, "A", "The element needs a cost."));

    let cost_only = Settings::default().with_calculations(&[Calculation::Cost]);
    let result = validate_one(process.clone(), cost_only);
    assert_eq!(result.problems.len(), 1);
    assert_eq!(result.problems[0].problem, "The element needs a cost.");

    let lenient = Settings {
        ignore_missing_basic_performance: true,
        ..Settings::default()
    };
    assert!(validate_one(process, lenient).validation_passed);
}

#[test]
fn test_content_and_structure_problems_are_reported_together() {
    // An exclusive split that never joins, and a task without a cost
    let mut process = ProcessDefinition::new("Process_Both");
    process.add(FlowElement::start_event("Start"));
    process.add(FlowElement::exclusive_gateway("Split"));
    process.add(FlowElement::task("A").with_duration(10.0));
    process.add(task("B", 10.0, 1.0));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "Split").unwrap();
    process.connect_with_probability("Split", "A", 50.0).unwrap();
    process.connect_with_probability("Split", "B", 50.0).unwrap();
    process.connect("A", "End").unwrap();
    process.connect("B", "End").unwrap();

    let result = validate_one(process, Settings::default());

    assert!(!result.validation_passed);
    assert!(result.gateways.is_empty());
    assert!(has(&result.problems, "A", "The element needs a cost."));
    assert!(has(
        &result.problems,
        PROCESS_LEVEL,
        "The number of exclusive splitting and exclusive joining gateways needs to be equal."
    ));
}

#[test]
fn test_dates_are_required_only_when_calculated() {
    let with_dates = Settings::default().with_calculations(&[
        Calculation::Time,
        Calculation::Cost,
        Calculation::Dates,
    ]);
    let result = validate_one(sequential("Process_Dates"), with_dates.clone());
    assert!(!result.validation_passed);
    assert!(has(&result.problems, "A", "The element needs a start and end date."));
    assert!(has(&result.problems, "B", "The element needs a start and end date."));

    let lenient = Settings {
        ignore_missing_optional_performance: true,
        ..with_dates
    };
    assert!(validate_one(sequential("Process_Dates"), lenient).validation_passed);
}

#[test]
fn test_end_date_before_start_date() {
    let start = "2024-03-01T10:00:00Z".parse().unwrap();
    let end = "2024-03-01T09:00:00Z".parse().unwrap();
    let mut process = ProcessDefinition::new("Process_Backwards");
    process.add(FlowElement::start_event("Start"));
    process.add(task("A", 1.0, 1.0).with_dates(start, end));
    process.add(FlowElement::end_event("End"));
    process.connect("Start", "A").unwrap();
    process.connect("A", "End").unwrap();

    let settings = Settings::default().with_calculations(&[Calculation::Dates]);
    let result = validate_one(process, settings);

    assert!(!result.validation_passed);
    assert!(has(&result.problems, "A", "The end date cannot be before the start date."));
}

#[test]
fn test_exclusive_split_probabilities() {
    let result = validate_one(
        branching("Process_Odd", ElementKind::ExclusiveGateway, Some((30.0, 60.0))),
        Settings::default(),
    );
    assert!(!result.validation_passed);
    assert!(has(
        &result.problems,
        "Split",
        "The probabilities of the outgoing sequence flows need to add up to 100."
    ));

    let result = validate_one(
        branching("Process_Unweighted", ElementKind::ExclusiveGateway, None),
        Settings::default(),
    );
    assert!(!result.validation_passed);
    for flow in ["Flow_Split_A", "Flow_Split_B"] {
        assert!(has(
            &result.problems,
            flow,
            "A sequence flow leaving an exclusive split needs a probability."
        ));
    }

    let result = validate_one(
        branching("Process_Range", ElementKind::ExclusiveGateway, Some((-10.0, 110.0))),
        Settings::default(),
    );
    assert!(has(
        &result.problems,
        "Flow_Split_B",
        "The probability needs to be between 0 and 100."
    ));
}

#[test]
fn test_unreachable_element() {
    let mut process = sequential("Process_Island");
    process.add(FlowElement::new("Wait", ElementKind::IntermediateCatchEvent));
    process.add(task("C", 1.0, 1.0));
    process.connect("Wait", "C").unwrap();

    let result = validate_one(process, Settings::default());

    assert!(!result.validation_passed);
    assert!(has(
        &result.problems,
        "Wait",
        "The element cannot be reached from the start event."
    ));
    assert!(has(
        &result.problems,
        "C",
        "The element cannot be reached from the start event."
    ));
}

#[test]
fn test_dangling_flow_reference() {
    let mut process = sequential("Process_Dangling");
    process.flow_elements[1].outgoing.push("Flow_Nowhere".into());

    let result = validate_one(process, Settings::default());

    assert!(has(
        &result.problems,
        "A",
        "The element references a sequence flow that does not exist."
    ));
}

#[test]
fn test_unresolved_call_activity() {
    let result = validate_one(calling("Process_Main", "Process_Missing"), Settings::default());

    assert!(!result.validation_passed);
    let unresolved: Vec<&Problem> = result
        .problems
        .iter()
        .filter(|p| p.kind == ProblemKind::UnresolvedReference)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id, "Call");
    assert_eq!(unresolved[0].problem, "Could not find a matching called process.");
}

#[test]
fn test_call_activity_resolves_by_partial_id() {
    let main = bundle(vec![calling("Process_Main", "Review")])
        .with_called(bundle(vec![sequential("Process_Review")]));

    let results = ProcessValidator::new(Settings::default()).validate(&main);

    assert!(results[0].validation_passed, "{:?}", results[0].problems);
    let nested = &results[0].nested["Call"];
    assert_eq!(nested.process_id, "Process_Review");
    assert!(nested.validation_passed);
    assert_eq!(nested.validated_elements.len(), 7);
}

#[test]
fn test_invalid_called_process_reports_summary_and_specifics() {
    let mut review = ProcessDefinition::new("Process_Review");
    review.add(FlowElement::start_event("Review_Start"));
    review.add(FlowElement::task("Review_Task").with_cost(1.0));
    review.add(FlowElement::end_event("Review_End"));
    review.connect("Review_Start", "Review_Task").unwrap();
    review.connect("Review_Task", "Review_End").unwrap();

    let main = bundle(vec![calling("Process_Main", "Process_Review")])
        .with_called(bundle(vec![review]));
    let results = ProcessValidator::new(Settings::default()).validate(&main);

    assert!(!results[0].validation_passed);
    assert!(has(
        &results[0].problems,
        "Call",
        "The called process has incorrect content or structure, specifics are provided separately."
    ));
    assert!(has(&results[0].problems, "Review_Task", "The element needs a duration."));
}

#[test]
fn test_called_process_found_in_deeper_bundle() {
    // Main calls Middle, Middle calls Leaf from its own called bundle
    let middle = bundle(vec![calling("Process_Middle", "Process_Leaf")])
        .with_called(bundle(vec![sequential("Process_Leaf")]));
    let main = bundle(vec![calling("Process_Main", "Process_Middle")]).with_called(middle);

    let results = ProcessValidator::new(Settings::default()).validate(&main);

    assert!(results[0].validation_passed, "{:?}", results[0].problems);
    let middle = &results[0].nested["Call"];
    assert_eq!(middle.process_id, "Process_Middle");
    assert_eq!(middle.nested["Call"].process_id, "Process_Leaf");
}

#[test]
fn test_overwrite_uses_parent_values_instead_of_called_process() {
    let mut process = calling("Process_Main", "Process_Missing");
    let call = process
        .flow_elements
        .iter_mut()
        .find(|e| e.id == "Call")
        .unwrap();
    call.parent = Some(FixedPerformance {
        duration: 5000.0,
        cost: 50.0,
        ..Default::default()
    });

    let settings = Settings {
        overwrite_with_parent_performance: true,
        ..Settings::default()
    };
    let result = validate_one(process.clone(), settings.clone());
    assert!(result.validation_passed, "{:?}", result.problems);
    assert!(result.nested.is_empty());

    process.flow_elements[1].parent = None;
    let result = validate_one(process, settings);
    assert!(has(
        &result.problems,
        "Call",
        "The element needs performance values from its parent."
    ));
}

#[test]
fn test_sub_process_is_validated_recursively() {
    let mut inner = vec![
        FlowElement::start_event("Inner_Start"),
        task("Inner_Task", 100.0, 1.0),
        FlowElement::end_event("Inner_End"),
    ];
    connect_elements(&mut inner, "Inner_Start", "Inner_Task", None).unwrap();
    connect_elements(&mut inner, "Inner_Task", "Inner_End", None).unwrap();

    let result = validate_one(with_sub_process("Process_Outer", inner), Settings::default());

    assert!(result.validation_passed, "{:?}", result.problems);
    let nested = &result.nested["Sub"];
    assert_eq!(nested.process_id, "Sub");
    assert_eq!(nested.validated_elements.len(), 5);
}

#[test]
fn test_badly_structured_sub_process() {
    let mut inner = vec![
        FlowElement::start_event("Inner_Start"),
        FlowElement::exclusive_gateway("Inner_Split"),
        task("Inner_A", 1.0, 1.0),
        task("Inner_B", 1.0, 1.0),
        FlowElement::end_event("Inner_End"),
    ];
    connect_elements(&mut inner, "Inner_Start", "Inner_Split", None).unwrap();
    connect_elements(&mut inner, "Inner_Split", "Inner_A", Some(50.0)).unwrap();
    connect_elements(&mut inner, "Inner_Split", "Inner_B", Some(50.0)).unwrap();
    connect_elements(&mut inner, "Inner_A", "Inner_End", None).unwrap();
    connect_elements(&mut inner, "Inner_B", "Inner_End", None).unwrap();

    let result = validate_one(with_sub_process("Process_Outer", inner), Settings::default());

    assert!(!result.validation_passed);
    assert!(has(
        &result.problems,
        "Sub",
        "The subprocess is structured incorrectly, specifics are provided separately."
    ));
    assert!(result
        .problems
        .iter()
        .any(|p| p.kind == ProblemKind::StructuralImbalance));
}

#[test]
fn test_sub_process_with_bad_content() {
    let mut inner = vec![
        FlowElement::start_event("Inner_Start"),
        FlowElement::task("Inner_Task").with_duration(10.0),
        FlowElement::end_event("Inner_End"),
    ];
    connect_elements(&mut inner, "Inner_Start", "Inner_Task", None).unwrap();
    connect_elements(&mut inner, "Inner_Task", "Inner_End", None).unwrap();

    let result = validate_one(with_sub_process("Process_Outer", inner), Settings::default());

    assert!(!result.validation_passed);
    assert!(has(
        &result.problems,
        "Sub",
        "The subprocess has incorrect content, specifics are provided separately."
    ));
    assert!(has(&result.problems, "Inner_Task", "The element needs a cost."));
}

/// Rejects unnamed tasks on top of the basic checks
struct NamedTasks;

impl ElementValidator for NamedTasks {
    fn validate_element(
        &self,
        element: &FlowElement,
        level: &ProcessGraph<'_>,
        settings: &Settings,
    ) -> ElementCheck {
        let mut problems = BasicElementValidator
            .validate_element(element, level, settings)
            .problems;
        if element.kind.is_task_like() && element.name.is_none() {
            problems.push(Problem::new(
                element.id.clone(),
                ProblemKind::FieldValidationFailure,
                "Tasks need a name.",
            ));
        }
        ElementCheck::from_problems(problems)
    }
}

#[test]
fn test_custom_element_validator() {
    let validator =
        ProcessValidator::with_element_validator(Settings::default(), Arc::new(NamedTasks));
    let results = validator.validate(&bundle(vec![sequential("Process_Seq")]));

    assert!(!results[0].validation_passed);
    assert!(has(&results[0].problems, "A", "Tasks need a name."));
    assert!(has(&results[0].problems, "B", "Tasks need a name."));
}

#[test]
fn test_non_process_root_elements_are_ignored() {
    let json = r#"{
        "mainProcess": {
            "rootElements": [
                { "type": "collaboration", "id": "Collab_1" },
                { "type": "process", "id": "Process_Json", "flowElements": [] }
            ]
        }
    }"#;
    let bundle: ProcessBundle = serde_json::from_str(json).unwrap();
    let results = ProcessValidator::new(Settings::default()).validate(&bundle);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].process_id, "Process_Json");

    let empty = ProcessBundle::new(Definitions::new());
    assert!(ProcessValidator::new(Settings::default()).validate(&empty).is_empty());
}
