pub mod kinds;
mod registry;

pub use registry::{ActivityCtor, ActivityRegistry};

use async_trait::async_trait;

use weft_core::types::{ActivityDoc, GuardPolicy, PathDoc, ProcessVarDoc};

use crate::case::WfCase;
use crate::executor::EngineError;
use crate::graph::ModelError;
use crate::resolver::{self, ResolutionContext};

/// One node of the orchestration graph. Implementations are constructed once
/// at load time through the registry and shared read-only across all cases.
#[async_trait]
pub trait Activity: Send + Sync {
    fn base(&self) -> &ActivityBase;
    fn base_mut(&mut self) -> &mut ActivityBase;

    fn kind(&self) -> &str;

    /// Run the activity body against the case. Implementations performing an
    /// external call record exactly one trace entry keyed by their own name
    /// before returning.
    async fn execute(&self, case: &mut WfCase) -> Result<(), EngineError>;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn actor(&self) -> Option<&str> {
        self.base().actor.as_deref()
    }

    fn boundary(&self) -> &str {
        &self.base().boundary
    }

    fn is_boundary(&self) -> bool {
        self.base().is_boundary
    }

    fn process_vars(&self) -> &[ProcessVarDoc] {
        &self.base().process_vars
    }

    fn inputs(&self) -> &[PathDoc] {
        &self.base().inputs
    }

    fn outputs(&self) -> &[PathDoc] {
        &self.base().outputs
    }

    fn add_input(&mut self, path: PathDoc) -> Result<(), ModelError> {
        self.base_mut().add_input(path)
    }

    fn add_output(&mut self, path: PathDoc) -> Result<(), ModelError> {
        self.base_mut().add_output(path)
    }

    /// Shape check. Boundary activities carry no edges; everything else needs
    /// at least one inbound and one outbound edge. Start/terminal kinds
    /// override this.
    fn is_valid(&self) -> bool {
        let base = self.base();
        if base.is_boundary {
            base.inputs.is_empty() && base.outputs.is_empty()
        } else {
            !base.inputs.is_empty() && !base.outputs.is_empty()
        }
    }

    /// The trace entry this activity's own assignments and templates resolve
    /// against.
    fn resolution_context(&self) -> ResolutionContext {
        match &self.base().expression_context {
            Some(entry) => ResolutionContext::for_entry(entry),
            None => ResolutionContext::inbound(),
        }
    }

    /// Evaluate the `enabled` guard; a false result skips the body.
    async fn is_enabled(&self, case: &mut WfCase) -> Result<bool, EngineError> {
        let Some(guard) = &self.base().enabled else {
            return Ok(true);
        };
        resolver::eval_guard(case, &self.resolution_context(), guard)
            .await
            .map_err(|e| EngineError::resolve(self.name(), e))
    }

    /// Select the next activity by evaluating outgoing guards in declaration
    /// order; `None` means the walk terminates here.
    async fn next(&self, case: &mut WfCase) -> Result<Option<String>, EngineError> {
        let base = self.base();
        if base.outputs.is_empty() {
            return Ok(None);
        }
        let constraints: Vec<&str> = base.outputs.iter().map(|p| p.constraint.as_str()).collect();
        let index = select_index(
            self.name(),
            &constraints,
            base.policy,
            &self.resolution_context(),
            case,
        )
        .await?;
        Ok(index.map(|i| base.outputs[i].target.clone()))
    }
}

/// The declaration-time fields every concrete kind shares.
#[derive(Debug, Clone)]
pub struct ActivityBase {
    pub name: String,
    pub actor: Option<String>,
    pub boundary: String,
    pub is_boundary: bool,
    pub process_vars: Vec<ProcessVarDoc>,
    pub enabled: Option<String>,
    pub expression_context: Option<String>,
    pub inputs: Vec<PathDoc>,
    pub outputs: Vec<PathDoc>,
    pub policy: GuardPolicy,
}

impl ActivityBase {
    pub fn from_doc(doc: &ActivityDoc, policy: GuardPolicy) -> Self {
        Self {
            name: doc.name.clone(),
            actor: doc.actor.clone(),
            boundary: doc.boundary.clone(),
            is_boundary: doc.is_boundary,
            process_vars: doc.process_vars.clone(),
            enabled: doc.enabled.clone(),
            expression_context: doc.expression_context.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            policy,
        }
    }

    pub fn add_input(&mut self, path: PathDoc) -> Result<(), ModelError> {
        if self.inputs.contains(&path) {
            return Err(ModelError::DuplicatePath {
                from: path.source,
                target: path.target,
            });
        }
        self.inputs.push(path);
        Ok(())
    }

    pub fn add_output(&mut self, path: PathDoc) -> Result<(), ModelError> {
        if self.outputs.contains(&path) {
            return Err(ModelError::DuplicatePath {
                from: path.source,
                target: path.target,
            });
        }
        self.outputs.push(path);
        Ok(())
    }
}

/// Evaluate a constraint vector in declaration order and pick one index under
/// the given policy. Callers pass the policy explicitly: the walk uses the
/// orchestration's configured policy, sub-selectors (response templates)
/// always pass `AtLeastOne`.
pub(crate) async fn select_index(
    ambit: &str,
    constraints: &[&str],
    policy: GuardPolicy,
    ctx: &ResolutionContext,
    case: &mut WfCase,
) -> Result<Option<usize>, EngineError> {
    match policy {
        GuardPolicy::AtLeastOne => {
            for (i, constraint) in constraints.iter().enumerate() {
                if eval_one(ambit, constraint, ctx, case).await? {
                    return Ok(Some(i));
                }
            }
            Err(EngineError::no_true_guard(ambit))
        }
        GuardPolicy::ExactlyOne => {
            let mut selected = None;
            for (i, constraint) in constraints.iter().enumerate() {
                if eval_one(ambit, constraint, ctx, case).await? {
                    if selected.is_some() {
                        return Err(EngineError::ambiguous_guard(ambit));
                    }
                    selected = Some(i);
                }
            }
            match selected {
                Some(i) => Ok(Some(i)),
                None => Err(EngineError::no_true_guard(ambit)),
            }
        }
    }
}

async fn eval_one(
    ambit: &str,
    constraint: &str,
    ctx: &ResolutionContext,
    case: &mut WfCase,
) -> Result<bool, EngineError> {
    resolver::eval_guard(case, ctx, constraint)
        .await
        .map_err(|e| EngineError::resolve(ambit, e))
}
