use crate::{GatewayClass, ModelError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A parsed definitions document together with the processes it calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBundle {
    pub main_process: Definitions,
    #[serde(default)]
    pub called_processes: Vec<ProcessBundle>,
}

impl ProcessBundle {
    pub fn new(main_process: Definitions) -> Self {
        Self {
            main_process,
            called_processes: Vec::new(),
        }
    }

    pub fn with_called(mut self, called: ProcessBundle) -> Self {
        self.called_processes.push(called);
        self
    }

    /// Read a bundle from a JSON file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Process definitions of the main document
    pub fn processes(&self) -> impl Iterator<Item = &ProcessDefinition> {
        self.main_process.processes()
    }
}

/// Root of a definitions document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definitions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub root_elements: Vec<RootElement>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(mut self, process: ProcessDefinition) -> Self {
        self.root_elements.push(RootElement::Process(process));
        self
    }

    pub fn processes(&self) -> impl Iterator<Item = &ProcessDefinition> {
        self.root_elements.iter().filter_map(|root| match root {
            RootElement::Process(process) => Some(process),
            RootElement::Other => None,
        })
    }
}

/// Only process definitions take part in analysis; messages, collaborations
/// and the like are kept out of the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RootElement {
    Process(ProcessDefinition),
    #[serde(other)]
    Other,
}

/// A single process level: its flow elements, sequence flows included
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub flow_elements: Vec<FlowElement>,
}

impl ProcessDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            flow_elements: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn add(&mut self, element: FlowElement) -> String {
        let id = element.id.clone();
        self.flow_elements.push(element);
        id
    }

    /// Add a sequence flow between two existing elements and register it on both ends
    pub fn connect(&mut self, from: &str, to: &str) -> Result<String, ModelError> {
        connect_elements(&mut self.flow_elements, from, to, None)
    }

    pub fn connect_with_probability(
        &mut self,
        from: &str,
        to: &str,
        probability: f64,
    ) -> Result<String, ModelError> {
        connect_elements(&mut self.flow_elements, from, to, Some(probability))
    }

    pub fn find(&self, id: &str) -> Option<&FlowElement> {
        self.flow_elements.iter().find(|e| e.id == id)
    }
}

/// Shared by process definitions and sub-processes, which both own a flat element list.
pub fn connect_elements(
    elements: &mut Vec<FlowElement>,
    from: &str,
    to: &str,
    probability: Option<f64>,
) -> Result<String, ModelError> {
    if !elements.iter().any(|e| e.id == to) {
        return Err(ModelError::ElementNotFound(to.to_string()));
    }
    let flow_id = format!("Flow_{}_{}", from, to);
    if elements.iter().any(|e| e.id == flow_id) {
        return Err(ModelError::DuplicateId(flow_id));
    }
    let source = elements
        .iter_mut()
        .find(|e| e.id == from)
        .ok_or_else(|| ModelError::ElementNotFound(from.to_string()))?;
    source.outgoing.push(flow_id.clone());
    if let Some(target) = elements.iter_mut().find(|e| e.id == to) {
        target.incoming.push(flow_id.clone());
    }
    elements.push(FlowElement::new(
        flow_id.clone(),
        ElementKind::SequenceFlow {
            source_ref: from.to_string(),
            target_ref: to.to_string(),
            probability,
        },
    ));
    Ok(flow_id)
}

/// Fixed performance handed down by a parent model, used instead of
/// descending into a sub-process or called process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedPerformance {
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

/// One node or sequence flow of a process level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowElement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub incoming: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outgoing: Vec<String>,
    /// Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<FixedPerformance>,
}

impl FlowElement {
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            duration: None,
            cost: None,
            start: None,
            end: None,
            parent: None,
        }
    }

    pub fn start_event(id: impl Into<String>) -> Self {
        Self::new(id, ElementKind::StartEvent)
    }

    pub fn end_event(id: impl Into<String>) -> Self {
        Self::new(id, ElementKind::EndEvent)
    }

    pub fn task(id: impl Into<String>) -> Self {
        Self::new(id, ElementKind::Task)
    }

    pub fn exclusive_gateway(id: impl Into<String>) -> Self {
        Self::new(id, ElementKind::ExclusiveGateway)
    }

    pub fn parallel_gateway(id: impl Into<String>) -> Self {
        Self::new(id, ElementKind::ParallelGateway)
    }

    pub fn sub_process(id: impl Into<String>, flow_elements: Vec<FlowElement>) -> Self {
        Self::new(id, ElementKind::SubProcess { flow_elements })
    }

    pub fn call_activity(id: impl Into<String>, called_element: impl Into<String>) -> Self {
        Self::new(
            id,
            ElementKind::CallActivity {
                called_element: called_element.into(),
            },
        )
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration = Some(duration_ms);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn with_dates(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_parent(mut self, parent: FixedPerformance) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn is_sequence_flow(&self) -> bool {
        matches!(self.kind, ElementKind::SequenceFlow { .. })
    }

    pub fn source_ref(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::SequenceFlow { source_ref, .. } => Some(source_ref),
            _ => None,
        }
    }

    pub fn target_ref(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::SequenceFlow { target_ref, .. } => Some(target_ref),
            _ => None,
        }
    }

    pub fn probability(&self) -> Option<f64> {
        match &self.kind {
            ElementKind::SequenceFlow { probability, .. } => *probability,
            _ => None,
        }
    }
}

/// Element kinds understood by the engine, resolved once at ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    IntermediateCatchEvent,
    IntermediateThrowEvent,
    Task,
    UserTask,
    ServiceTask,
    ScriptTask,
    ManualTask,
    SendTask,
    ReceiveTask,
    BusinessRuleTask,
    ExclusiveGateway,
    ParallelGateway,
    EventBasedGateway,
    #[serde(rename_all = "camelCase")]
    SequenceFlow {
        source_ref: String,
        target_ref: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        probability: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    SubProcess {
        #[serde(default)]
        flow_elements: Vec<FlowElement>,
    },
    #[serde(rename_all = "camelCase")]
    CallActivity { called_element: String },
}

impl ElementKind {
    /// The BPMN tag name, as it appears in reports
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::StartEvent => "startEvent",
            ElementKind::EndEvent => "endEvent",
            ElementKind::IntermediateCatchEvent => "intermediateCatchEvent",
            ElementKind::IntermediateThrowEvent => "intermediateThrowEvent",
            ElementKind::Task => "task",
            ElementKind::UserTask => "userTask",
            ElementKind::ServiceTask => "serviceTask",
            ElementKind::ScriptTask => "scriptTask",
            ElementKind::ManualTask => "manualTask",
            ElementKind::SendTask => "sendTask",
            ElementKind::ReceiveTask => "receiveTask",
            ElementKind::BusinessRuleTask => "businessRuleTask",
            ElementKind::ExclusiveGateway => "exclusiveGateway",
            ElementKind::ParallelGateway => "parallelGateway",
            ElementKind::EventBasedGateway => "eventBasedGateway",
            ElementKind::SequenceFlow { .. } => "sequenceFlow",
            ElementKind::SubProcess { .. } => "subProcess",
            ElementKind::CallActivity { .. } => "callActivity",
        }
    }

    /// Elements that carry their own duration and cost
    pub fn is_task_like(&self) -> bool {
        matches!(
            self,
            ElementKind::IntermediateCatchEvent
                | ElementKind::IntermediateThrowEvent
                | ElementKind::Task
                | ElementKind::UserTask
                | ElementKind::ServiceTask
                | ElementKind::ScriptTask
                | ElementKind::ManualTask
                | ElementKind::SendTask
                | ElementKind::ReceiveTask
                | ElementKind::BusinessRuleTask
        )
    }

    pub fn is_gateway(&self) -> bool {
        self.gateway_class().is_some()
    }

    /// Event-based gateways pick exactly one path, so they count as exclusive.
    pub fn gateway_class(&self) -> Option<GatewayClass> {
        match self {
            ElementKind::ExclusiveGateway | ElementKind::EventBasedGateway => {
                Some(GatewayClass::Exclusive)
            }
            ElementKind::ParallelGateway => Some(GatewayClass::Parallel),
            _ => None,
        }
    }

    /// Sub-processes and call activities delegate to another process graph
    pub fn is_activity(&self) -> bool {
        matches!(
            self,
            ElementKind::SubProcess { .. } | ElementKind::CallActivity { .. }
        )
    }
}
