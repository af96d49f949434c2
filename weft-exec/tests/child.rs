use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use weft_core::types::OrchestrationDoc;
use weft_exec::{
    ActivityRegistry, Executor, ExpressionEngine, MemoryAssetStore, Orchestration,
    ReqwestHttpClient, TraceRequest, VarValue, WfCase,
};
use weft_store::MemoryGlobalStore;

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

fn build_with_assets(value: serde_json::Value, assets: MemoryAssetStore) -> Orchestration {
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    Orchestration::build(
        &doc,
        &ActivityRegistry::builtin(),
        Arc::new(ReqwestHttpClient::default()),
        Arc::new(assets),
    )
    .unwrap()
}

#[test]
fn child_variables_never_touch_the_parent() {
    let mut parent = new_case(json!({}));
    parent.set_var("shared", VarValue::Scalar(json!("original")));

    let seeds = BTreeMap::from([("shared".to_string(), VarValue::Scalar(json!("original")))]);
    let mut child = parent.new_child(
        seeds,
        TraceRequest::new("POST", "activity://localhost/nested/child"),
    );

    child.set_var("shared", VarValue::Scalar(json!("mutated")));
    child.set_var("child-only", VarValue::Scalar(json!(true)));

    assert_eq!(
        parent.var("shared").and_then(|v| v.as_scalar()),
        Some(&json!("original"))
    );
    assert!(parent.var("child-only").is_none());
}

#[test]
fn child_gets_its_own_inbound_entry() {
    let parent = new_case(json!({"msg": "hi"}));
    let child = parent.new_child(
        BTreeMap::new(),
        TraceRequest::new("POST", "activity://localhost/nested/child")
            .with_body(b"{}".to_vec(), "application/json"),
    );

    assert!(child.entry("request").is_some());
    assert!(child.breadcrumbs().is_empty());
    assert!(child.entries().len() == 1, "only the synthetic inbound entry");
}

/// Sub-orchestration used by the nested and loop tests: echoes its inbound
/// body and renders it through the terminal response.
fn sub_doc() -> serde_json::Value {
    json!({
        "id": "sub",
        "activities": [
            {"name": "sub-start", "type": "request"},
            {"name": "sub-echo", "type": "echo"},
            {"name": "sub-end", "type": "response",
             "expressionContext": "sub-echo", "definition": "sub-response.json"}
        ],
        "paths": [
            {"source": "sub-start", "target": "sub-echo"},
            {"source": "sub-echo", "target": "sub-end"}
        ]
    })
}

#[tokio::test]
async fn nested_activity_folds_the_child_response_into_the_parent() {
    let mut assets = MemoryAssetStore::new();
    assets.insert(
        "enrich.json",
        serde_json::to_vec(&json!({"orchestration": "sub"})).unwrap(),
    );
    assets.insert(
        "sub-response.json",
        serde_json::to_vec(&json!({
            "responses": [{"body": "{$.msg}", "mime": "text/plain"}]
        }))
        .unwrap(),
    );

    let orchestration = build_with_assets(
        json!({
            "id": "parent",
            "activities": [
                {"name": "start", "type": "request"},
                {"name": "enrich", "type": "nested", "definition": "enrich.json"},
                {"name": "end", "type": "response"}
            ],
            "paths": [
                {"source": "start", "target": "enrich"},
                {"source": "enrich", "target": "end"}
            ],
            "orchestrations": [sub_doc()]
        }),
        assets,
    );

    let mut case = new_case(json!({"msg": "hi"}));
    let walk = Executor::default().run(&orchestration, &mut case).await.unwrap();
    assert_eq!(walk.terminal, "end");

    let entry = case.entry("enrich").expect("nested trace entry");
    let response = entry.response.as_ref().expect("child response folded back");
    assert_eq!(response.body, b"hi".to_vec());
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn nested_child_failure_becomes_a_synthetic_error_entry() {
    let mut assets = MemoryAssetStore::new();
    assets.insert(
        "enrich.json",
        serde_json::to_vec(&json!({"orchestration": "sub"})).unwrap(),
    );

    // The sub-orchestration dead-ends: its only guard is never true.
    let orchestration = build_with_assets(
        json!({
            "id": "parent",
            "activities": [
                {"name": "start", "type": "request"},
                {"name": "enrich", "type": "nested", "definition": "enrich.json"},
                {"name": "end", "type": "response"}
            ],
            "paths": [
                {"source": "start", "target": "enrich"},
                {"source": "enrich", "target": "end"}
            ],
            "orchestrations": [{
                "id": "sub",
                "activities": [
                    {"name": "sub-start", "type": "request"},
                    {"name": "sub-end", "type": "response"}
                ],
                "paths": [
                    {"source": "sub-start", "target": "sub-end", "constraint": "1 == 2"}
                ]
            }]
        }),
        assets,
    );

    let mut case = new_case(json!({}));
    // The parent walk itself succeeds; the failure is folded into the trace.
    Executor::default().run(&orchestration, &mut case).await.unwrap();

    let response = case
        .entry("enrich")
        .and_then(|e| e.response.clone())
        .expect("synthetic error entry");
    assert_eq!(response.status, 500);
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["code"], json!("WFG-NOMATCH"));
}

#[tokio::test]
async fn loop_concatenates_child_responses_in_order() {
    let mut assets = MemoryAssetStore::new();
    assets.insert(
        "each.json",
        serde_json::to_vec(&json!({
            "orchestration": "sub",
            "source": "{$.items}"
        }))
        .unwrap(),
    );
    assets.insert(
        "sub-response.json",
        serde_json::to_vec(&json!({
            "responses": [{"body": "{v:item}", "mime": "application/json"}]
        }))
        .unwrap(),
    );

    let orchestration = build_with_assets(
        json!({
            "id": "parent",
            "activities": [
                {"name": "start", "type": "request"},
                {"name": "each", "type": "loop", "definition": "each.json"},
                {"name": "end", "type": "response"}
            ],
            "paths": [
                {"source": "start", "target": "each"},
                {"source": "each", "target": "end"}
            ],
            "orchestrations": [sub_doc()]
        }),
        assets,
    );

    let mut case = new_case(json!({"items": [1, 2, 3]}));
    Executor::default().run(&orchestration, &mut case).await.unwrap();

    let response = case
        .entry("each")
        .and_then(|e| e.response.clone())
        .expect("loop trace entry");
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body, json!([1, 2, 3]));
}

#[tokio::test]
async fn loop_source_must_be_an_array() {
    let mut assets = MemoryAssetStore::new();
    assets.insert(
        "each.json",
        serde_json::to_vec(&json!({
            "orchestration": "sub",
            "source": "{$.items}"
        }))
        .unwrap(),
    );
    assets.insert(
        "sub-response.json",
        serde_json::to_vec(&json!({"responses": [{"body": ""}]})).unwrap(),
    );

    let orchestration = build_with_assets(
        json!({
            "id": "parent",
            "activities": [
                {"name": "start", "type": "request"},
                {"name": "each", "type": "loop", "definition": "each.json"},
                {"name": "end", "type": "response"}
            ],
            "paths": [
                {"source": "start", "target": "each"},
                {"source": "each", "target": "end"}
            ],
            "orchestrations": [sub_doc()]
        }),
        assets,
    );

    let mut case = new_case(json!({"items": "not-an-array"}));
    let err = Executor::default().run(&orchestration, &mut case).await.unwrap_err();
    assert_eq!(err.code, "WFG-LOOP");
}
