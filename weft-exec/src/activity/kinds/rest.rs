use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use weft_core::types::{ActivityDoc, ProcessVarDoc};

use crate::activity::{Activity, ActivityBase};
use crate::case::{TraceEntry, TraceRequest, TraceResponse, WfCase};
use crate::executor::EngineError;
use crate::graph::{BuildContext, ModelError};
use crate::http::{HttpClient, HttpRequestParts};
use crate::resolver::{self, ResolutionContext};

use super::require_definition;

#[derive(Debug, Clone, serde::Deserialize)]
struct RestDef {
    endpoint: EndpointDef,
    /// Applied against this activity's own response entry after the call.
    #[serde(default)]
    assign: Vec<ProcessVarDoc>,
}

#[derive(Debug, Clone, serde::Deserialize)]
struct EndpointDef {
    method: String,
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    query: BTreeMap<String, String>,
    #[serde(default)]
    body: String,
    #[serde(default = "default_mime")]
    mime: String,
    #[serde(default = "default_timeout_ms", rename = "timeoutMs")]
    timeout_ms: u64,
    #[serde(default = "default_max_response_bytes", rename = "maxResponseBytes")]
    max_response_bytes: usize,
}

fn default_mime() -> String {
    "application/json".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_max_response_bytes() -> usize {
    4_194_304
}

/// Invokes an HTTP endpoint from an interpolated endpoint template and
/// records the wire exchange. Retry/backoff is the client's concern.
pub struct RestActivity {
    base: ActivityBase,
    def: RestDef,
    http: Arc<dyn HttpClient>,
}

pub(crate) fn construct(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn Activity>, ModelError> {
    let def = require_definition::<RestDef>(doc, ctx)?;
    Ok(Box::new(RestActivity {
        base: ActivityBase::from_doc(doc, ctx.policy),
        def,
        http: Arc::clone(&ctx.http),
    }))
}

#[async_trait]
impl Activity for RestActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActivityBase {
        &mut self.base
    }

    fn kind(&self) -> &str {
        "rest"
    }

    async fn execute(&self, case: &mut WfCase) -> Result<(), EngineError> {
        let ctx = self.resolution_context();
        let endpoint = &self.def.endpoint;

        let mut url = self.resolve(case, &ctx, &endpoint.url).await?;
        let mut query = BTreeMap::new();
        for (name, value) in &endpoint.query {
            query.insert(name.clone(), self.resolve(case, &ctx, value).await?);
        }
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            let sep = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{sep}{}", encoded.join("&"));
        }
        url::Url::parse(&url).map_err(|e| {
            EngineError::server(self.name(), "WFG-URL", format!("invalid endpoint url: {e}"))
        })?;

        let mut headers = BTreeMap::new();
        for (name, value) in &endpoint.headers {
            headers.insert(name.clone(), self.resolve(case, &ctx, value).await?);
        }
        let body = self.resolve(case, &ctx, &endpoint.body).await?.into_bytes();
        case.purge_temp_vars();

        let request = HttpRequestParts {
            method: endpoint.method.clone(),
            url: url.clone(),
            headers: headers.clone(),
            body: body.clone(),
        };
        let response = self
            .http
            .send(
                request,
                Duration::from_millis(endpoint.timeout_ms),
                endpoint.max_response_bytes,
            )
            .await
            .map_err(|e| EngineError::bad_gateway(self.name(), e.to_string()))?;

        let response_mime = response
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| endpoint.mime.clone());

        case.record_entry(
            self.name().to_string(),
            TraceEntry::exchange(
                TraceRequest::new(endpoint.method.clone(), url)
                    .with_headers(headers)
                    .with_query(query)
                    .with_body(body, endpoint.mime.clone()),
                TraceResponse::new(response.status, response.body, response_mime)
                    .with_headers(response.headers),
            ),
        );

        if !self.def.assign.is_empty() {
            let own = ResolutionContext::for_entry(self.name());
            resolver::apply_process_vars(case, &own, &self.def.assign)
                .await
                .map_err(|e| EngineError::resolve(self.name(), e))?;
        }
        Ok(())
    }
}

impl RestActivity {
    async fn resolve(
        &self,
        case: &mut WfCase,
        ctx: &ResolutionContext,
        template: &str,
    ) -> Result<String, EngineError> {
        resolver::interpolate(case, ctx, template)
            .await
            .map_err(|e| EngineError::resolve(self.name(), e))
    }
}
