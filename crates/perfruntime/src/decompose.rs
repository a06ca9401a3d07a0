use crate::graph::ProcessGraph;
use perfcore::{
    Activity, Block, BranchPath, DecomposeError, ElementKind, FlowElement, Gateway, GatewayClass,
    Member, NestedProcess, OrderedProcess, Settings, ValidationResult,
};
use std::collections::{HashMap, HashSet};

/// Build the ordered block structure of a process that passed validation
pub fn decompose(
    result: &ValidationResult,
    settings: &Settings,
) -> Result<OrderedProcess, DecomposeError> {
    let graph = ProcessGraph::new(&result.validated_elements)?;
    let start = graph
        .elements()
        .find(|e| e.kind == ElementKind::StartEvent)
        .ok_or(DecomposeError::MissingStart)?;

    let mut decomposer = Decomposer {
        graph: &graph,
        gateways: result.gateways.iter().map(|g| (g.id.as_str(), g)).collect(),
        result,
        settings,
        visited: HashSet::new(),
    };

    match decomposer.walk(start, None)? {
        (members, Stop::End) => Ok(members),
        (_, Stop::Join(join)) => Err(DecomposeError::StrayJoin(join.id.clone())),
        (_, Stop::Target(target)) => Err(DecomposeError::StrayJoin(target.id.clone())),
    }
}

/// Where a sequential walk ended
enum Stop<'a> {
    End,
    /// A plain join closing the enclosing split
    Join(&'a FlowElement),
    /// The element the caller asked to stop at
    Target(&'a FlowElement),
}

struct Decomposer<'g, 'a> {
    graph: &'g ProcessGraph<'a>,
    gateways: HashMap<&'a str, &'a Gateway>,
    result: &'a ValidationResult,
    settings: &'g Settings,
    visited: HashSet<&'a str>,
}

impl<'g, 'a> Decomposer<'g, 'a> {
    fn visit(&mut self, element: &'a FlowElement) -> Result<(), DecomposeError> {
        if self.visited.insert(element.id.as_str()) {
            Ok(())
        } else {
            Err(DecomposeError::Revisited(element.id.clone()))
        }
    }

    fn gateway(&self, id: &str) -> Result<&'a Gateway, DecomposeError> {
        self.gateways
            .get(id)
            .copied()
            .ok_or_else(|| DecomposeError::UnknownGateway(id.to_string()))
    }

    fn next(&self, element: &'a FlowElement) -> Result<&'a FlowElement, DecomposeError> {
        self.graph
            .successor(element)
            .ok_or_else(|| DecomposeError::DeadEnd(element.id.clone()))
    }

    /// Collect members from `current` until an end event, a closing join or `stop_at`
    fn walk(
        &mut self,
        mut current: &'a FlowElement,
        stop_at: Option<&str>,
    ) -> Result<(OrderedProcess, Stop<'a>), DecomposeError> {
        let mut members = Vec::new();
        loop {
            if stop_at == Some(current.id.as_str()) {
                return Ok((members, Stop::Target(current)));
            }
            tracing::trace!(element = %current.id, "Decomposing");

            if current.kind.is_gateway() {
                let gateway = self.gateway(&current.id)?;
                if gateway.is_join() && !gateway.is_loop {
                    return Ok((members, Stop::Join(current)));
                }
                self.visit(current)?;
                let (block, after) = if gateway.is_join() {
                    self.loop_block(current, gateway)?
                } else {
                    self.branch_block(current, gateway, stop_at)?
                };
                members.push(Member::Block(block));
                current = after;
                continue;
            }

            self.visit(current)?;
            match &current.kind {
                ElementKind::EndEvent => {
                    members.push(Member::Element(current.clone()));
                    return Ok((members, Stop::End));
                }
                kind if kind.is_activity() => {
                    members.push(Member::Activity(self.activity(current)?));
                }
                _ => members.push(Member::Element(current.clone())),
            }
            current = self.next(current)?;
        }
    }

    /// A split and the paths that close at its join. Returns the flow leaving the join.
    fn branch_block(
        &mut self,
        split: &'a FlowElement,
        gateway: &Gateway,
        stop_at: Option<&str>,
    ) -> Result<(Block, &'a FlowElement), DecomposeError> {
        let unmatched = || DecomposeError::UnmatchedSplit {
            split: split.id.clone(),
        };

        let mut paths = Vec::new();
        let mut closing: Option<&'a FlowElement> = None;
        for flow in self.graph.outgoing_flows(split) {
            let (members, stop) = self.walk(flow, stop_at)?;
            let Stop::Join(join) = stop else {
                return Err(unmatched());
            };
            match closing {
                Some(previous) if previous.id != join.id => return Err(unmatched()),
                _ => closing = Some(join),
            }
            paths.push(BranchPath {
                probability: flow.probability(),
                members,
            });
        }

        let join = closing.ok_or_else(unmatched)?;
        if self.gateway(&join.id)?.exclusive_or_parallel != gateway.exclusive_or_parallel {
            return Err(unmatched());
        }
        self.visit(join)?;

        let block = match gateway.exclusive_or_parallel {
            GatewayClass::Parallel => Block::Parallel {
                split: split.clone(),
                join: join.clone(),
                paths,
            },
            GatewayClass::Exclusive => Block::Exclusive {
                split: split.clone(),
                join: join.clone(),
                paths,
            },
        };
        Ok((block, self.next(join)?))
    }

    /// A loop join, the body up to its split, and the split's flow back.
    /// Returns the split's other flow, which continues the sequence.
    fn loop_block(
        &mut self,
        join: &'a FlowElement,
        gateway: &Gateway,
    ) -> Result<(Block, &'a FlowElement), DecomposeError> {
        let split_id = gateway
            .match_id
            .as_deref()
            .ok_or_else(|| DecomposeError::UnknownGateway(join.id.clone()))?;
        let broken = || DecomposeError::BrokenLoop {
            join: join.id.clone(),
            split: split_id.to_string(),
        };

        let (looped_path, stop) = self.walk(self.next(join)?, Some(split_id))?;
        let Stop::Target(split) = stop else {
            return Err(broken());
        };
        self.visit(split)?;

        let flows = self.graph.outgoing_flows(split);
        if flows.len() != 2 {
            return Err(broken());
        }
        let looping_flow = flows
            .iter()
            .copied()
            .find(|f| f.target_ref() == Some(join.id.as_str()))
            .ok_or_else(broken)?;
        let exit = flows
            .iter()
            .copied()
            .find(|f| f.id != looping_flow.id)
            .ok_or_else(broken)?;

        let block = Block::Loop {
            split: split.clone(),
            join: join.clone(),
            looped_path,
            looping_flow: looping_flow.clone(),
        };
        Ok((block, exit))
    }

    fn activity(&self, element: &'a FlowElement) -> Result<Activity, DecomposeError> {
        if self.settings.overwrite_with_parent_performance {
            return Ok(Activity {
                element: element.clone(),
                nested: None,
            });
        }

        let child = self
            .result
            .nested
            .get(&element.id)
            .ok_or_else(|| DecomposeError::MissingNested(element.id.clone()))?;
        Ok(Activity {
            element: element.clone(),
            nested: Some(NestedProcess {
                process_id: child.process_id.clone(),
                members: decompose(child, self.settings)?,
            }),
        })
    }
}
