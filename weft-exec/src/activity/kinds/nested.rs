use std::sync::Arc;

use async_trait::async_trait;

use weft_core::types::{ActivityDoc, ProcessVarDoc};

use crate::activity::{Activity, ActivityBase};
use crate::case::{TraceEntry, TraceRequest, TraceResponse, WfCase};
use crate::executor::{EngineError, Executor};
use crate::graph::{BuildContext, ModelError, Orchestration};
use crate::resolver;

use super::require_definition;

#[derive(Debug, Clone, serde::Deserialize)]
struct NestedDef {
    orchestration: String,
    #[serde(default)]
    seeds: Vec<ProcessVarDoc>,
    /// Template for the child's inbound body; the context body when absent.
    #[serde(default)]
    body: Option<String>,
}

/// Walks a sub-orchestration in a fully isolated child case and folds the
/// child's rendered response back under this activity's name. A child
/// failure becomes a synthetic error entry rather than aborting the parent.
pub struct NestedActivity {
    base: ActivityBase,
    def: NestedDef,
    sub: Arc<Orchestration>,
}

pub(crate) fn construct(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn Activity>, ModelError> {
    let def = require_definition::<NestedDef>(doc, ctx)?;
    let sub_doc = ctx
        .nested
        .iter()
        .find(|o| o.id == def.orchestration)
        .ok_or_else(|| ModelError::UnknownNested(def.orchestration.clone()))?;
    let sub = Orchestration::build(
        sub_doc,
        ctx.registry,
        Arc::clone(&ctx.http),
        Arc::clone(&ctx.assets),
    )?;
    Ok(Box::new(NestedActivity {
        base: ActivityBase::from_doc(doc, ctx.policy),
        def,
        sub: Arc::new(sub),
    }))
}

#[async_trait]
impl Activity for NestedActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActivityBase {
        &mut self.base
    }

    fn kind(&self) -> &str {
        "nested"
    }

    async fn execute(&self, case: &mut WfCase) -> Result<(), EngineError> {
        let ctx = self.resolution_context();

        let seeds = resolver::resolve_seeds(case, &ctx, &self.def.seeds)
            .await
            .map_err(|e| EngineError::resolve(self.name(), e))?;

        let (body, mime) = match &self.def.body {
            Some(template) => {
                let body = resolver::interpolate(case, &ctx, template)
                    .await
                    .map_err(|e| EngineError::resolve(self.name(), e))?;
                case.purge_temp_vars();
                (body.into_bytes(), "application/json".to_string())
            }
            None => {
                let entry = case.entry(&ctx.entry);
                let body = entry
                    .and_then(|e| e.body(ctx.side))
                    .map(<[u8]>::to_vec)
                    .unwrap_or_default();
                (body, "application/json".to_string())
            }
        };

        let inbound = TraceRequest::synthetic(self.kind(), self.name()).with_body(body, mime);
        let mut child = case.new_child(seeds, inbound);

        let response = match Executor::default().run(&self.sub, &mut child).await {
            Ok(walk) => child
                .entry(&walk.terminal)
                .and_then(|e| e.response.clone())
                .unwrap_or_else(|| {
                    TraceResponse::new(204, Vec::new(), "application/json".to_string())
                }),
            Err(e) => TraceResponse::new(
                e.status,
                serde_json::to_vec(&e.to_body()).unwrap_or_default(),
                "application/json".to_string(),
            ),
        };

        case.record_entry(
            self.name().to_string(),
            TraceEntry::exchange(
                TraceRequest::synthetic(self.kind(), self.name()),
                response,
            ),
        );
        Ok(())
    }
}
