use std::collections::BTreeMap;

use crate::types::{ActivityDoc, BoundaryDoc, GuardPolicy, PathDoc};

/// The declarative orchestration graph. Round-trips losslessly through JSON
/// and YAML; nested sub-documents carry the bodies of loop and nested
/// orchestration activities.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrchestrationDoc {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared start activity; derived from the single request-kind
    /// activity when absent, flagged invalid on mismatch.
    #[serde(default, rename = "startActivity", skip_serializing_if = "Option::is_none")]
    pub start_activity: Option<String>,

    pub activities: Vec<ActivityDoc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathDoc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boundaries: Vec<BoundaryDoc>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orchestrations: Vec<OrchestrationDoc>,
}

pub const PATH_SELECTION_PROPERTY: &str = "pathSelection";

impl OrchestrationDoc {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            start_activity: None,
            activities: Vec::new(),
            paths: Vec::new(),
            boundaries: Vec::new(),
            properties: BTreeMap::new(),
            orchestrations: Vec::new(),
        }
    }

    pub fn activity(&self, name: &str) -> Option<&ActivityDoc> {
        self.activities.iter().find(|a| a.name == name)
    }

    pub fn nested(&self, id: &str) -> Option<&OrchestrationDoc> {
        self.orchestrations.iter().find(|o| o.id == id)
    }

    /// The configured guard-selection policy, or an error carrying the raw
    /// property value when it names no known policy.
    pub fn guard_policy(&self) -> Result<GuardPolicy, String> {
        match self.properties.get(PATH_SELECTION_PROPERTY) {
            None => Ok(GuardPolicy::default()),
            Some(serde_json::Value::String(s)) => {
                GuardPolicy::parse(s).ok_or_else(|| s.clone())
            }
            Some(other) => Err(other.to_string()),
        }
    }
}
