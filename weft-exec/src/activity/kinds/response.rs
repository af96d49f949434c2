use std::collections::BTreeMap;

use async_trait::async_trait;

use weft_core::types::{ActivityDoc, GuardPolicy};

use crate::activity::{select_index, Activity, ActivityBase};
use crate::case::{TraceEntry, TraceRequest, TraceResponse, WfCase};
use crate::executor::EngineError;
use crate::graph::{BuildContext, ModelError};
use crate::resolver;

use super::load_definition;

#[derive(Debug, Clone, serde::Deserialize)]
struct ResponseDef {
    responses: Vec<TemplateDef>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct TemplateDef {
    #[serde(default)]
    constraint: String,
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default = "default_mime")]
    mime: String,
    #[serde(default)]
    body: String,
}

fn default_status() -> u16 {
    200
}

fn default_mime() -> String {
    "application/json".to_string()
}

impl Default for TemplateDef {
    fn default() -> Self {
        Self {
            constraint: String::new(),
            status: default_status(),
            headers: BTreeMap::new(),
            mime: default_mime(),
            body: String::new(),
        }
    }
}

/// The terminal activity: renders the payload the caller receives. Template
/// selection is first-true-wins, so an unguarded template placed last is the
/// catch-all.
pub struct ResponseActivity {
    base: ActivityBase,
    templates: Vec<TemplateDef>,
}

pub(crate) fn construct(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn Activity>, ModelError> {
    let templates = match load_definition::<ResponseDef>(doc, ctx)? {
        Some(def) if !def.responses.is_empty() => def.responses,
        Some(_) => {
            return Err(ModelError::Definition {
                name: doc.name.clone(),
                message: "definition declares no response templates".to_string(),
            })
        }
        None => vec![TemplateDef::default()],
    };
    Ok(Box::new(ResponseActivity {
        base: ActivityBase::from_doc(doc, ctx.policy),
        templates,
    }))
}

#[async_trait]
impl Activity for ResponseActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActivityBase {
        &mut self.base
    }

    fn kind(&self) -> &str {
        "response"
    }

    fn is_valid(&self) -> bool {
        !self.base.inputs.is_empty() && self.base.outputs.is_empty()
    }

    async fn execute(&self, case: &mut WfCase) -> Result<(), EngineError> {
        let ctx = self.resolution_context();

        let constraints: Vec<&str> = self
            .templates
            .iter()
            .map(|t| t.constraint.as_str())
            .collect();
        let index = select_index(
            self.name(),
            &constraints,
            GuardPolicy::AtLeastOne,
            &ctx,
            case,
        )
        .await?
        .unwrap_or(0);
        let template = &self.templates[index];

        let body = resolver::interpolate(case, &ctx, &template.body)
            .await
            .map_err(|e| EngineError::resolve(self.name(), e))?;

        let mut headers = BTreeMap::new();
        for (name, value) in &template.headers {
            let value = resolver::interpolate(case, &ctx, value)
                .await
                .map_err(|e| EngineError::resolve(self.name(), e))?;
            headers.insert(name.clone(), value);
        }
        case.purge_temp_vars();

        case.record_entry(
            self.name().to_string(),
            TraceEntry::exchange(
                TraceRequest::synthetic(self.kind(), self.name()),
                TraceResponse::new(template.status, body.into_bytes(), template.mime.clone())
                    .with_headers(headers),
            ),
        );
        Ok(())
    }
}
