use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use weft_core::types::OrchestrationDoc;
use weft_exec::http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts};
use weft_exec::{
    ActivityRegistry, Executor, ExpressionEngine, MemoryAssetStore, Orchestration, TraceRequest,
    WfCase,
};
use weft_store::MemoryGlobalStore;

/// Canned backend: records the request it saw, answers with a fixed body.
struct CannedHttpClient {
    seen: Mutex<Vec<HttpRequestParts>>,
    status: u16,
    body: &'static str,
    fail: bool,
}

impl CannedHttpClient {
    fn ok(status: u16, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            status,
            body,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            status: 0,
            body: "",
            fail: true,
        })
    }
}

#[async_trait]
impl HttpClient for CannedHttpClient {
    async fn send(
        &self,
        req: HttpRequestParts,
        _timeout: Duration,
        _max_response_bytes: usize,
    ) -> Result<HttpResponseParts, HttpError> {
        self.seen.lock().unwrap().push(req);
        if self.fail {
            return Err(HttpError::Network("connection refused".to_string()));
        }
        Ok(HttpResponseParts {
            status: self.status,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: self.body.as_bytes().to_vec(),
        })
    }
}

fn endpoint_assets() -> MemoryAssetStore {
    let mut assets = MemoryAssetStore::new();
    assets.insert(
        "lookup.json",
        serde_json::to_vec(&json!({
            "endpoint": {
                "method": "POST",
                "url": "https://backend.test/customers/{$.id}",
                "headers": {"Accept": "application/json"},
                "query": {"expand": "profile name"},
                "body": "{\"customer\": \"{$.id}\"}"
            },
            "assign": [
                {"name": "token", "value": "{$.token}"}
            ]
        }))
        .unwrap(),
    );
    assets
}

fn doc() -> OrchestrationDoc {
    serde_json::from_value(json!({
        "id": "lookup-flow",
        "activities": [
            {"name": "start", "type": "request"},
            {"name": "lookup", "type": "rest", "definition": "lookup.json"},
            {"name": "end", "type": "response"}
        ],
        "paths": [
            {"source": "start", "target": "lookup"},
            {"source": "lookup", "target": "end"}
        ]
    }))
    .unwrap()
}

fn new_case(body: serde_json::Value) -> WfCase {
    let mut case = WfCase::new(
        Arc::new(ExpressionEngine::default()),
        Arc::new(MemoryGlobalStore::new()),
        Arc::new(MemoryAssetStore::new()),
    );
    case.record_inbound(
        TraceRequest::new("POST", "case://localhost/test")
            .with_body(serde_json::to_vec(&body).unwrap(), "application/json"),
    );
    case
}

#[tokio::test]
async fn interpolates_the_endpoint_and_records_the_exchange() {
    let http = CannedHttpClient::ok(200, r#"{"token": "abc123"}"#);
    let orchestration = Orchestration::build(
        &doc(),
        &ActivityRegistry::builtin(),
        http.clone(),
        Arc::new(endpoint_assets()),
    )
    .unwrap();

    let mut case = new_case(json!({"id": 7}));
    Executor::default().run(&orchestration, &mut case).await.unwrap();

    let seen = http.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(
        seen[0].url,
        "https://backend.test/customers/7?expand=profile%20name"
    );
    assert_eq!(seen[0].headers.get("Accept").unwrap(), "application/json");
    assert_eq!(seen[0].body, br#"{"customer": "7"}"#.to_vec());

    let entry = case.entry("lookup").expect("wire trace entry");
    assert_eq!(entry.request.url, seen[0].url);
    let response = entry.response.as_ref().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.mime, "application/json");

    // Post-assignments read this activity's own response.
    assert_eq!(
        case.var("token").and_then(|v| v.as_scalar()),
        Some(&json!("abc123"))
    );
}

#[tokio::test]
async fn transport_failures_become_bad_gateway_errors() {
    let http = CannedHttpClient::failing();
    let orchestration = Orchestration::build(
        &doc(),
        &ActivityRegistry::builtin(),
        http,
        Arc::new(endpoint_assets()),
    )
    .unwrap();

    let mut case = new_case(json!({"id": 7}));
    let err = Executor::default().run(&orchestration, &mut case).await.unwrap_err();

    assert_eq!(err.status, 502);
    assert_eq!(err.ambit, "lookup");
    assert!(err.message.contains("connection refused"), "{err}");
    assert!(case.entry("lookup").is_none(), "no entry for a failed call");
}

#[tokio::test]
async fn missing_definition_fails_the_build() {
    let err = Orchestration::build(
        &doc(),
        &ActivityRegistry::builtin(),
        CannedHttpClient::ok(200, "{}"),
        Arc::new(MemoryAssetStore::new()),
    )
    .unwrap_err();
    assert!(err.to_string().contains("lookup.json"), "{err}");
}
