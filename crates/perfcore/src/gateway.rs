use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayPattern {
    Split,
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GatewayClass {
    Exclusive,
    Parallel,
}

impl fmt::Display for GatewayClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayClass::Exclusive => write!(f, "exclusive"),
            GatewayClass::Parallel => write!(f, "parallel"),
        }
    }
}

/// A gateway classified and annotated by the structure check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gateway {
    pub id: String,
    pub kind_tag: String,
    pub pattern: GatewayPattern,
    pub exclusive_or_parallel: GatewayClass,
    /// Outgoing count for splits, incoming count for joins
    pub path_count: usize,
    pub incoming: Vec<String>,
    pub outgoing: Vec<String>,
    /// Ids of opposite-pattern gateways with the same class and path count
    pub potential_matches: Vec<String>,
    pub is_loop: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
}

impl Gateway {
    pub fn is_split(&self) -> bool {
        self.pattern == GatewayPattern::Split
    }

    pub fn is_join(&self) -> bool {
        self.pattern == GatewayPattern::Join
    }
}
