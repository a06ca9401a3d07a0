use crate::graph::ProcessGraph;
use perfcore::{
    ElementKind, FlowElement, Gateway, GatewayClass, GatewayPattern, Problem, ProblemKind,
};
use std::collections::{HashMap, HashSet};

const FORBIDDEN_LOOP: &str = "The element is part of a loop that does not fulfill the requirements. Loops can only consist of a join, an outgoing path with sequential elements that eventually leads to a split and a direct sequence flow from the split to the join.";

/// Outcome of checking that one level decomposes into nested blocks
#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    pub structure_validation_passed: bool,
    pub problems: Vec<Problem>,
    /// Empty unless the check passed
    pub gateways: Vec<Gateway>,
}

impl StructureReport {
    fn passed(gateways: Vec<Gateway>) -> Self {
        Self {
            structure_validation_passed: true,
            problems: Vec::new(),
            gateways,
        }
    }

    fn failed(problems: Vec<Problem>) -> Self {
        Self {
            structure_validation_passed: false,
            problems,
            gateways: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct GatewayTally {
    exclusive_split: usize,
    exclusive_join: usize,
    parallel_split: usize,
    parallel_join: usize,
}

impl GatewayTally {
    fn record(mut self, gateway: &Gateway) -> Self {
        match (gateway.exclusive_or_parallel, gateway.pattern) {
            (GatewayClass::Exclusive, GatewayPattern::Split) => self.exclusive_split += 1,
            (GatewayClass::Exclusive, GatewayPattern::Join) => self.exclusive_join += 1,
            (GatewayClass::Parallel, GatewayPattern::Split) => self.parallel_split += 1,
            (GatewayClass::Parallel, GatewayPattern::Join) => self.parallel_join += 1,
        }
        self
    }
}

/// Checks that the gateways of one process level pair up into blocks and
/// that every cycle has the supported loop shape.
pub struct StructureValidator<'g, 'a> {
    graph: &'g ProcessGraph<'a>,
}

impl<'g, 'a> StructureValidator<'g, 'a> {
    pub fn new(graph: &'g ProcessGraph<'a>) -> Self {
        Self { graph }
    }

    pub fn validate(&self) -> StructureReport {
        let (mut gateways, tally) = self.classify();
        if gateways.is_empty() {
            return StructureReport::passed(gateways);
        }
        tracing::debug!(?tally, "Classified {} gateways", gateways.len());

        let problems = class_balance_problems(&tally);
        if !problems.is_empty() {
            return StructureReport::failed(problems);
        }

        let problems = assign_potential_matches(&mut gateways);
        if !problems.is_empty() {
            return StructureReport::failed(problems);
        }

        let finder = LoopFinder::new(self.graph, &gateways);
        let mut loops = Vec::new();
        let mut problems = Vec::new();
        for join in gateways.iter().filter(|g| g.is_join()) {
            let outcome = finder.check_join(join);
            tracing::debug!(join = %join.id, ?outcome, "Loop walk finished");
            match outcome {
                LoopOutcome::Allowed { split } => loops.push((join.id.clone(), split)),
                LoopOutcome::Forbidden => problems.push(Problem::new(
                    join.id.clone(),
                    ProblemKind::ForbiddenLoop,
                    FORBIDDEN_LOOP,
                )),
                LoopOutcome::NoLoop | LoopOutcome::Unknown => {}
            }
        }
        if !problems.is_empty() {
            return StructureReport::failed(problems);
        }

        for (join_id, split_id) in loops {
            for gateway in gateways.iter_mut() {
                if gateway.id == join_id {
                    gateway.is_loop = true;
                    gateway.match_id = Some(split_id.clone());
                } else if gateway.id == split_id {
                    gateway.is_loop = true;
                    gateway.match_id = Some(join_id.clone());
                }
            }
        }

        StructureReport::passed(gateways)
    }

    fn classify(&self) -> (Vec<Gateway>, GatewayTally) {
        self.graph
            .elements()
            .filter_map(classify_gateway)
            .fold((Vec::new(), GatewayTally::default()), |(mut all, tally), gateway| {
                let tally = tally.record(&gateway);
                all.push(gateway);
                (all, tally)
            })
    }
}

/// Split/join and exclusive/parallel classification of a single element
pub fn classify_gateway(element: &FlowElement) -> Option<Gateway> {
    let class = element.kind.gateway_class()?;
    let (pattern, path_count) = if element.outgoing.len() > 1 {
        (GatewayPattern::Split, element.outgoing.len())
    } else {
        (GatewayPattern::Join, element.incoming.len())
    };
    Some(Gateway {
        id: element.id.clone(),
        kind_tag: element.kind.tag().to_string(),
        pattern,
        exclusive_or_parallel: class,
        path_count,
        incoming: element.incoming.clone(),
        outgoing: element.outgoing.clone(),
        potential_matches: Vec::new(),
        is_loop: false,
        match_id: None,
    })
}

fn class_balance_problems(tally: &GatewayTally) -> Vec<Problem> {
    let mut problems = Vec::new();
    if tally.exclusive_split != tally.exclusive_join {
        problems.push(Problem::process_level(
            ProblemKind::StructuralImbalance,
            "The number of exclusive splitting and exclusive joining gateways needs to be equal.",
        ));
    }
    if tally.parallel_split != tally.parallel_join {
        problems.push(Problem::process_level(
            ProblemKind::StructuralImbalance,
            "The number of parallel splitting and parallel joining gateways needs to be equal.",
        ));
    }
    problems
}

fn assign_potential_matches(gateways: &mut [Gateway]) -> Vec<Problem> {
    let mut problems = Vec::new();
    let mut matches = Vec::with_capacity(gateways.len());

    for gateway in gateways.iter() {
        let group = |pattern: GatewayPattern| -> Vec<String> {
            gateways
                .iter()
                .filter(|g| {
                    g.pattern == pattern
                        && g.exclusive_or_parallel == gateway.exclusive_or_parallel
                        && g.path_count == gateway.path_count
                })
                .map(|g| g.id.clone())
                .collect()
        };
        let split_matches = group(GatewayPattern::Split);
        let join_matches = group(GatewayPattern::Join);

        if split_matches.len() != join_matches.len() {
            let class = gateway.exclusive_or_parallel;
            let article = match class {
                GatewayClass::Exclusive => "an",
                GatewayClass::Parallel => "a",
            };
            problems.push(Problem::new(
                gateway.id.clone(),
                ProblemKind::StructuralImbalance,
                format!(
                    "All paths that were created by {article} {class} splitting gateway need to lead into a matching {class} joining gateway."
                ),
            ));
        }

        matches.push(match gateway.pattern {
            GatewayPattern::Split => join_matches,
            GatewayPattern::Join => split_matches,
        });
    }

    if problems.is_empty() {
        for (gateway, potential) in gateways.iter_mut().zip(matches) {
            gateway.potential_matches = potential;
        }
    }
    problems
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LoopOutcome {
    NoLoop,
    Allowed { split: String },
    Forbidden,
    /// A different cycle sits on this path; its own join reports it
    Unknown,
}

impl LoopOutcome {
    fn combine(outcomes: Vec<LoopOutcome>) -> LoopOutcome {
        if outcomes.iter().all(|o| *o == LoopOutcome::NoLoop) {
            return LoopOutcome::NoLoop;
        }
        if outcomes.contains(&LoopOutcome::Forbidden) {
            return LoopOutcome::Forbidden;
        }
        outcomes
            .into_iter()
            .find(|o| matches!(o, LoopOutcome::Allowed { .. }))
            .unwrap_or(LoopOutcome::Unknown)
    }
}

struct LoopFinder<'g, 'a> {
    graph: &'g ProcessGraph<'a>,
    gateways: HashMap<&'g str, &'g Gateway>,
}

impl<'g, 'a> LoopFinder<'g, 'a> {
    fn new(graph: &'g ProcessGraph<'a>, gateways: &'g [Gateway]) -> Self {
        Self {
            graph,
            gateways: gateways.iter().map(|g| (g.id.as_str(), g)).collect(),
        }
    }

    fn check_join(&self, join: &Gateway) -> LoopOutcome {
        match join.outgoing.first().and_then(|id| self.graph.flow(id).ok()) {
            Some(first) => self.walk(first, join, Vec::new()),
            None => LoopOutcome::NoLoop,
        }
    }

    fn walk(&self, start: &'a FlowElement, origin: &Gateway, mut seen: Vec<&'a str>) -> LoopOutcome {
        // Elements passed since the last split, so a cycle without gateways ends the walk
        let mut passed = HashSet::new();
        let mut current = start;
        loop {
            if current.kind == ElementKind::EndEvent {
                return LoopOutcome::NoLoop;
            }
            if !passed.insert(current.id.as_str()) {
                return LoopOutcome::Unknown;
            }

            if current.kind.is_gateway() {
                if current.id == origin.id {
                    return self.judge_cycle(origin, &seen);
                }
                if seen.contains(&current.id.as_str()) {
                    return LoopOutcome::Unknown;
                }
                seen.push(current.id.as_str());

                let Some(gateway) = self.gateways.get(current.id.as_str()) else {
                    return LoopOutcome::NoLoop;
                };
                if gateway.is_split() {
                    return self.walk_paths(current, origin, &seen);
                }
            }

            match self.graph.successor(current) {
                Some(next) => current = next,
                None => return LoopOutcome::NoLoop,
            }
        }
    }

    /// Follow the paths of a split that can still lead back to the origin.
    /// The others can only end as `NoLoop` or `Unknown`, and neither marks the
    /// origin.
    fn walk_paths(
        &self,
        split: &'a FlowElement,
        origin: &Gateway,
        seen: &[&'a str],
    ) -> LoopOutcome {
        let mut outcomes = Vec::new();
        for flow in self.graph.outgoing_flows(split) {
            let returns = flow
                .target_ref()
                .is_some_and(|target| self.graph.reaches(target, &origin.id));
            if !returns {
                outcomes.push(LoopOutcome::NoLoop);
                continue;
            }
            let outcome = self.walk(flow, origin, seen.to_vec());
            if outcome == LoopOutcome::Forbidden {
                return outcome;
            }
            outcomes.push(outcome);
        }
        LoopOutcome::combine(outcomes)
    }

    /// The walk came back to its origin join. Only an exclusive two-way join fed
    /// straight back from a matching two-way split is a supported loop.
    fn judge_cycle(&self, origin: &Gateway, seen: &[&'a str]) -> LoopOutcome {
        if origin.exclusive_or_parallel != GatewayClass::Exclusive || origin.incoming.len() != 2 {
            return LoopOutcome::Forbidden;
        }

        origin
            .incoming
            .iter()
            .filter_map(|id| self.graph.flow(id).ok()?.source_ref())
            .find(|source| {
                seen.contains(source)
                    && origin.potential_matches.iter().any(|m| m == source)
                    && self
                        .gateways
                        .get(*source)
                        .is_some_and(|split| split.outgoing.len() == 2)
            })
            .map(|split| LoopOutcome::Allowed {
                split: split.to_string(),
            })
            .unwrap_or(LoopOutcome::Forbidden)
    }
}
