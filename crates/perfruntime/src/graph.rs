use perfcore::{ElementKind, FlowElement, ModelError};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::HashMap;

/// Lookup index over the flow elements of one process level
pub struct ProcessGraph<'a> {
    elements: &'a [FlowElement],
    by_id: HashMap<&'a str, &'a FlowElement>,
    graph: DiGraph<&'a str, &'a str>,
    node_to_index: HashMap<&'a str, NodeIndex>,
}

impl<'a> ProcessGraph<'a> {
    pub fn new(elements: &'a [FlowElement]) -> Result<Self, ModelError> {
        let mut by_id = HashMap::new();
        for element in elements {
            if by_id.insert(element.id.as_str(), element).is_some() {
                return Err(ModelError::DuplicateId(element.id.clone()));
            }
        }

        let mut graph = DiGraph::new();
        let mut node_to_index = HashMap::new();
        for element in elements.iter().filter(|e| !e.is_sequence_flow()) {
            let idx = graph.add_node(element.id.as_str());
            node_to_index.insert(element.id.as_str(), idx);
        }

        // Flows with a dangling end are left out; the element checks report them
        for element in elements {
            if let ElementKind::SequenceFlow {
                source_ref,
                target_ref,
                ..
            } = &element.kind
            {
                if let (Some(from), Some(to)) = (
                    node_to_index.get(source_ref.as_str()),
                    node_to_index.get(target_ref.as_str()),
                ) {
                    graph.add_edge(*from, *to, element.id.as_str());
                }
            }
        }

        Ok(Self {
            elements,
            by_id,
            graph,
            node_to_index,
        })
    }

    /// Elements in declared order
    pub fn elements(&self) -> impl Iterator<Item = &'a FlowElement> {
        self.elements.iter()
    }

    pub fn element(&self, id: &str) -> Option<&'a FlowElement> {
        self.by_id.get(id).copied()
    }

    /// Resolve a sequence flow reference
    pub fn flow(&self, id: &str) -> Result<&'a FlowElement, ModelError> {
        let element = self
            .element(id)
            .ok_or_else(|| ModelError::FlowNotFound(id.to_string()))?;
        if element.is_sequence_flow() {
            Ok(element)
        } else {
            Err(ModelError::NotASequenceFlow(id.to_string()))
        }
    }

    /// Outgoing sequence flows in declared order; unresolvable references are skipped
    pub fn outgoing_flows(&self, element: &FlowElement) -> Vec<&'a FlowElement> {
        element
            .outgoing
            .iter()
            .filter_map(|id| self.flow(id).ok())
            .collect()
    }

    /// The next element along a walk: a flow's target, or a node's first outgoing flow
    pub fn successor(&self, element: &FlowElement) -> Option<&'a FlowElement> {
        match element.target_ref() {
            Some(target) => self.element(target),
            None => self.outgoing_flows(element).into_iter().next(),
        }
    }

    /// Whether some path of sequence flows leads from `from` to `to`
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        match (self.node_to_index.get(from), self.node_to_index.get(to)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Non-flow elements that no path from `start` reaches
    pub fn unreachable_from(&self, start: &str) -> Vec<&'a str> {
        let Some(&start_idx) = self.node_to_index.get(start) else {
            return Vec::new();
        };

        let mut reached = vec![false; self.graph.node_count()];
        let mut dfs = Dfs::new(&self.graph, start_idx);
        while let Some(idx) = dfs.next(&self.graph) {
            reached[idx.index()] = true;
        }

        self.elements
            .iter()
            .filter(|e| !e.is_sequence_flow())
            .filter_map(|e| {
                let idx = self.node_to_index.get(e.id.as_str())?;
                (!reached[idx.index()]).then_some(e.id.as_str())
            })
            .collect()
    }
}
