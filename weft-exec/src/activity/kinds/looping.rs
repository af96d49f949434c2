use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use weft_core::types::{ActivityDoc, ProcessVarDoc};

use crate::activity::{Activity, ActivityBase};
use crate::case::{TraceEntry, TraceRequest, TraceResponse, VarValue, WfCase};
use crate::executor::{EngineError, Executor};
use crate::graph::{BuildContext, ModelError, Orchestration};
use crate::resolver;

use super::require_definition;

#[derive(Debug, Clone, serde::Deserialize)]
struct LoopDef {
    orchestration: String,
    /// Template resolving to the JSON array being iterated.
    source: String,
    #[serde(default = "default_item_var", rename = "itemVar")]
    item_var: String,
    #[serde(default)]
    seeds: Vec<ProcessVarDoc>,
}

fn default_item_var() -> String {
    "item".to_string()
}

/// One child case per element, strictly in order: later iterations may
/// depend on state accumulated by earlier ones. Child responses concatenate
/// into a JSON array recorded as this activity's response; a failed
/// iteration contributes its error object instead.
pub struct LoopActivity {
    base: ActivityBase,
    def: LoopDef,
    sub: Arc<Orchestration>,
}

pub(crate) fn construct(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn Activity>, ModelError> {
    let def = require_definition::<LoopDef>(doc, ctx)?;
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
    Ok(Box::new(LoopActivity {
        base: ActivityBase::from_doc(doc, ctx.policy),
        def,
        sub: Arc::new(sub),
    }))
}

#[async_trait]
impl Activity for LoopActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActivityBase {
        &mut self.base
    }

    fn kind(&self) -> &str {
        "loop"
    }

    async fn execute(&self, case: &mut WfCase) -> Result<(), EngineError> {
        let ctx = self.resolution_context();

        let raw = resolver::interpolate(case, &ctx, &self.def.source)
            .await
            .map_err(|e| EngineError::resolve(self.name(), e))?;
        case.purge_temp_vars();
        let items: Vec<JsonValue> = match serde_json::from_str::<JsonValue>(&raw) {
            Ok(JsonValue::Array(items)) => items,
            _ => {
                return Err(EngineError::server(
                    self.name(),
                    "WFG-LOOP",
                    "loop source does not resolve to a JSON array",
                ))
            }
        };

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut seeds = resolver::resolve_seeds(case, &ctx, &self.def.seeds)
                .await
                .map_err(|e| EngineError::resolve(self.name(), e))?;
            seeds.insert(self.def.item_var.clone(), VarValue::Scalar(item.clone()));
            seeds.insert(
                "index".to_string(),
                VarValue::Scalar(JsonValue::from(index as u64)),
            );

            let body = serde_json::to_vec(&item).unwrap_or_default();
            let inbound = TraceRequest::synthetic(self.kind(), self.name())
                .with_body(body, "application/json".to_string());
            let mut child = case.new_child(seeds, inbound);

            match Executor::default().run(&self.sub, &mut child).await {
                Ok(walk) => {
                    let value = child
                        .entry(&walk.terminal)
                        .and_then(|e| e.response.as_ref())
                        .map(|r| {
                            r.body_json()
                                .unwrap_or_else(|| {
                                    JsonValue::String(
                                        String::from_utf8_lossy(&r.body).into_owned(),
                                    )
                                })
                        })
                        .unwrap_or(JsonValue::Null);
                    results.push(value);
                }
                Err(e) => results.push(e.to_body()),
            }
        }

        let body = serde_json::to_vec(&JsonValue::Array(results)).unwrap_or_default();
        case.record_entry(
            self.name().to_string(),
            TraceEntry::exchange(
                TraceRequest::synthetic(self.kind(), self.name()),
                TraceResponse::new(200, body, "application/json".to_string()),
            ),
        );
        Ok(())
    }
}
