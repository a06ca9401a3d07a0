use crate::FlowElement;

/// A process level decomposed into nested blocks, walked left to right
pub type OrderedProcess = Vec<Member>;

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// Events, tasks and sequence flows
    Element(FlowElement),
    /// A sub-process or call activity
    Activity(Activity),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activity {
    pub element: FlowElement,
    /// The delegated process; `None` when the parent's fixed values are used
    pub nested: Option<NestedProcess>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedProcess {
    pub process_id: String,
    pub members: OrderedProcess,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Parallel {
        split: FlowElement,
        join: FlowElement,
        paths: Vec<BranchPath>,
    },
    /// Exclusive and event-based gateway pairs
    Exclusive {
        split: FlowElement,
        join: FlowElement,
        paths: Vec<BranchPath>,
    },
    Loop {
        split: FlowElement,
        join: FlowElement,
        looped_path: OrderedProcess,
        looping_flow: FlowElement,
    },
}

impl Block {
    pub fn split(&self) -> &FlowElement {
        match self {
            Block::Parallel { split, .. }
            | Block::Exclusive { split, .. }
            | Block::Loop { split, .. } => split,
        }
    }
}

/// One outgoing path of a split, starting with the flow that leaves it
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPath {
    pub probability: Option<f64>,
    pub members: OrderedProcess,
}
