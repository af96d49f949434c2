mod trace;

pub use trace::{TraceEntry, TraceRequest, TraceResponse, TraceSide};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use weft_store::GlobalStore;

use crate::assets::AssetStore;
use crate::resolver::ExpressionEngine;

/// A callable variable value: invoked with the reference's call-site args,
/// returns the substitution text.
pub type VarFn = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// A process variable is either a plain value or a callable built-in; the
/// split is explicit so arity problems surface at construction, not as
/// runtime reflection surprises.
#[derive(Clone)]
pub enum VarValue {
    Scalar(JsonValue),
    Callable(VarFn),
}

impl VarValue {
    pub fn string(s: impl Into<String>) -> Self {
        Self::Scalar(JsonValue::String(s.into()))
    }

    pub fn as_scalar(&self) -> Option<&JsonValue> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Callable(_) => None,
        }
    }
}

impl fmt::Debug for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Self::Callable(_) => f.write_str("Callable(..)"),
        }
    }
}

/// One line of the append-only audit log of executed activities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub activity: String,
    pub description: String,
    pub error: Option<String>,
}

impl Breadcrumb {
    pub fn ok(activity: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            description: description.into(),
            error: None,
        }
    }

    pub fn failed(
        activity: impl Into<String>,
        description: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            activity: activity.into(),
            description: description.into(),
            error: Some(error.into()),
        }
    }
}

/// The per-request mutable execution context threaded through one graph walk.
///
/// Exactly one worker owns a case for the duration of its walk; child cases
/// are fresh instances sharing nothing mutable with the parent.
pub struct WfCase {
    pub id: Uuid,
    vars: BTreeMap<String, VarValue>,
    entries: BTreeMap<String, TraceEntry>,
    breadcrumbs: Vec<Breadcrumb>,
    elapsed: Duration,
    deadline: Option<Duration>,
    temp_vars: Vec<String>,
    temp_seq: u64,
    engine: Arc<ExpressionEngine>,
    globals: Arc<dyn GlobalStore>,
    assets: Arc<dyn AssetStore>,
    dictionaries: Arc<BTreeMap<String, BTreeMap<String, String>>>,
}

impl WfCase {
    pub fn new(
        engine: Arc<ExpressionEngine>,
        globals: Arc<dyn GlobalStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            vars: BTreeMap::new(),
            entries: BTreeMap::new(),
            breadcrumbs: Vec::new(),
            elapsed: Duration::ZERO,
            deadline: None,
            temp_vars: Vec::new(),
            temp_seq: 0,
            engine,
            globals,
            assets,
            dictionaries: Arc::new(BTreeMap::new()),
        }
    }

    pub fn with_dictionaries(
        mut self,
        dictionaries: Arc<BTreeMap<String, BTreeMap<String, String>>>,
    ) -> Self {
        self.dictionaries = dictionaries;
        self
    }

    /// Soft per-request deadline; checked at activity-entry checkpoints only.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Record the inbound call that started this case under the reserved
    /// `request` entry name.
    pub fn record_inbound(&mut self, request: TraceRequest) {
        self.entries.insert(
            weft_core::types::INBOUND_ENTRY.to_string(),
            TraceEntry::inbound(request),
        );
    }

    pub fn engine(&self) -> Arc<ExpressionEngine> {
        Arc::clone(&self.engine)
    }

    pub fn globals(&self) -> Arc<dyn GlobalStore> {
        Arc::clone(&self.globals)
    }

    pub fn assets(&self) -> Arc<dyn AssetStore> {
        Arc::clone(&self.assets)
    }

    pub fn dictionaries(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        &self.dictionaries
    }

    // Variable space.

    pub fn var(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: VarValue) {
        self.vars.insert(name.into(), value);
    }

    pub fn vars(&self) -> &BTreeMap<String, VarValue> {
        &self.vars
    }

    /// Scalar view of the variable space, the evaluation context for guard
    /// expressions. Callables are not expression-visible.
    pub fn scalar_vars(&self) -> BTreeMap<String, JsonValue> {
        self.vars
            .iter()
            .filter_map(|(k, v)| v.as_scalar().map(|s| (k.clone(), s.clone())))
            .collect()
    }

    /// Bind a resolved value to a fresh temporary name, returning the name.
    /// Temporaries live until the current assignment batch completes.
    pub fn bind_temp(&mut self, value: String) -> String {
        self.temp_seq += 1;
        let name = format!("_wv{}", self.temp_seq);
        self.vars
            .insert(name.clone(), VarValue::Scalar(JsonValue::String(value)));
        self.temp_vars.push(name.clone());
        name
    }

    /// Drop scratch variables so they cannot leak into later guard
    /// evaluations.
    pub fn purge_temp_vars(&mut self) {
        for name in self.temp_vars.drain(..) {
            self.vars.remove(&name);
        }
    }

    // Trace entries.

    pub fn entry(&self, name: &str) -> Option<&TraceEntry> {
        self.entries.get(name)
    }

    pub fn record_entry(&mut self, name: impl Into<String>, entry: TraceEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn entries(&self) -> &BTreeMap<String, TraceEntry> {
        &self.entries
    }

    // Breadcrumbs.

    pub fn push_breadcrumb(&mut self, crumb: Breadcrumb) {
        self.breadcrumbs.push(crumb);
    }

    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.breadcrumbs
    }

    // Elapsed-time accounting. Advisory: checked at activity entry, never
    // preemptive.

    pub fn add_elapsed(&mut self, d: Duration) {
        self.elapsed += d;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| self.elapsed >= d)
    }

    /// Derive a fresh, independently owned child case. The seeds are the only
    /// state that crosses over; the synthetic inbound request lets a nested
    /// executor walk the child like any other case.
    pub fn new_child(
        &self,
        seeds: BTreeMap<String, VarValue>,
        inbound: TraceRequest,
    ) -> WfCase {
        let mut child = WfCase::new(self.engine(), self.globals(), self.assets())
            .with_dictionaries(Arc::clone(&self.dictionaries));
        if let Some(deadline) = self.deadline {
            child.deadline = Some(deadline.saturating_sub(self.elapsed));
        }
        child.vars = seeds;
        child.record_inbound(inbound);
        child
    }
}

impl fmt::Debug for WfCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WfCase")
            .field("id", &self.id)
            .field("vars", &self.vars.keys().collect::<Vec<_>>())
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("breadcrumbs", &self.breadcrumbs.len())
            .field("elapsed", &self.elapsed)
            .finish()
    }
}
