//! Turns a declarative document into the executable, `Arc`-shared graph.
//!
//! Built once at load time, read-only for the life of the process; every
//! request walks the same instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use weft_core::error::Violation;
use weft_core::types::{BoundaryDoc, GuardPolicy, OrchestrationDoc, PathDoc};

use crate::activity::{Activity, ActivityRegistry};
use crate::assets::{AssetError, AssetStore};
use crate::http::HttpClient;

/// What activity constructors get to see while the graph is being built.
pub struct BuildContext<'a> {
    pub registry: &'a ActivityRegistry,
    pub policy: GuardPolicy,
    pub http: Arc<dyn HttpClient>,
    pub assets: Arc<dyn AssetStore>,
    /// Nested sub-documents of the document under construction.
    pub nested: &'a [OrchestrationDoc],
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("orchestration `{0}` declares no activities")]
    Empty(String),
    #[error("unknown activity type `{kind}` for activity `{name}`")]
    UnknownKind { name: String, kind: String },
    #[error("duplicate activity name `{0}`")]
    DuplicateActivity(String),
    #[error("path references unknown activity `{0}`")]
    DanglingPath(String),
    #[error("duplicate path {from} -> {target}")]
    DuplicatePath { from: String, target: String },
    #[error("orchestration `{0}` declares more than one request activity")]
    DuplicateStart(String),
    #[error("orchestration `{0}` declares no request activity")]
    MissingStart(String),
    #[error("invalid path selection policy `{0}`")]
    InvalidPolicy(String),
    #[error("nested orchestration `{0}` not found")]
    UnknownNested(String),
    #[error("activity `{name}` definition error: {message}")]
    Definition { name: String, message: String },
    #[error(transparent)]
    Asset(#[from] AssetError),
}

pub struct Orchestration {
    id: String,
    description: Option<String>,
    activities: BTreeMap<String, Arc<dyn Activity>>,
    paths: Vec<PathDoc>,
    boundaries: Vec<BoundaryDoc>,
    start: String,
    declared_start: Option<String>,
    policy: GuardPolicy,
    properties: BTreeMap<String, serde_json::Value>,
}

impl std::fmt::Debug for Orchestration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestration")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("activities", &self.activities.keys().collect::<Vec<_>>())
            .field("paths", &self.paths)
            .field("boundaries", &self.boundaries)
            .field("start", &self.start)
            .field("declared_start", &self.declared_start)
            .field("policy", &self.policy)
            .field("properties", &self.properties)
            .finish()
    }
}

impl Orchestration {
    /// Resolve every declared activity through the registry, install the
    /// declared edges, and derive the start activity. Fails fast: a request
    /// is never served off a graph that did not build cleanly.
    pub fn build(
        doc: &OrchestrationDoc,
        registry: &ActivityRegistry,
        http: Arc<dyn HttpClient>,
        assets: Arc<dyn AssetStore>,
    ) -> Result<Self, ModelError> {
        if doc.activities.is_empty() {
            return Err(ModelError::Empty(doc.id.clone()));
        }
        let policy = doc.guard_policy().map_err(ModelError::InvalidPolicy)?;

        let ctx = BuildContext {
            registry,
            policy,
            http,
            assets,
            nested: &doc.orchestrations,
        };

        let mut building: BTreeMap<String, Box<dyn Activity>> = BTreeMap::new();
        let mut request_activities = Vec::new();
        for activity_doc in &doc.activities {
            if building.contains_key(&activity_doc.name) {
                return Err(ModelError::DuplicateActivity(activity_doc.name.clone()));
            }
            if activity_doc.kind == "request" {
                request_activities.push(activity_doc.name.clone());
            }
            let activity = registry.construct(activity_doc, &ctx)?;
            building.insert(activity_doc.name.clone(), activity);
        }

        if request_activities.len() > 1 {
            return Err(ModelError::DuplicateStart(doc.id.clone()));
        }
        let start = request_activities
            .pop()
            .ok_or_else(|| ModelError::MissingStart(doc.id.clone()))?;

        for path in &doc.paths {
            building
                .get_mut(&path.source)
                .ok_or_else(|| ModelError::DanglingPath(path.source.clone()))?
                .add_output(path.clone())?;
            building
                .get_mut(&path.target)
                .ok_or_else(|| ModelError::DanglingPath(path.target.clone()))?
                .add_input(path.clone())?;
        }

        let activities = building
            .into_iter()
            .map(|(name, a)| (name, Arc::from(a)))
            .collect();

        Ok(Self {
            id: doc.id.clone(),
            description: doc.description.clone(),
            activities,
            paths: doc.paths.clone(),
            boundaries: doc.boundaries.clone(),
            start,
            declared_start: doc.start_activity.clone(),
            policy,
            properties: doc.properties.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn policy(&self) -> GuardPolicy {
        self.policy
    }

    pub fn properties(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.properties
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn activity(&self, name: &str) -> Option<Arc<dyn Activity>> {
        self.activities.get(name).cloned()
    }

    pub fn activities(&self) -> impl Iterator<Item = &Arc<dyn Activity>> {
        self.activities.values()
    }

    pub fn paths(&self) -> &[PathDoc] {
        &self.paths
    }

    pub fn boundary(&self, name: &str) -> Option<&BoundaryDoc> {
        self.boundaries.iter().find(|b| b.name == name)
    }

    pub fn boundaries(&self) -> &[BoundaryDoc] {
        &self.boundaries
    }

    /// Advisory shape check; invoke after construction and before first
    /// execution. Construction already guarantees referential integrity, so
    /// this is about edge shape per activity.
    pub fn is_valid(&self) -> bool {
        self.validity_violations().is_empty()
    }

    pub fn validity_violations(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        for activity in self.activities.values() {
            if !activity.is_valid() {
                violations.push(Violation::new(
                    activity.name().to_string(),
                    format!("{} activity has an invalid edge shape", activity.kind()),
                ));
            }
        }
        if let Some(declared) = &self.declared_start {
            if declared != &self.start {
                violations.push(Violation::new(
                    "startActivity",
                    "does not name the request activity",
                ));
            }
        }
        violations
    }
}
