use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;

use weft_core::types::ProcessVarDoc;
use weft_exec::resolver::{self, ResolutionContext};
use weft_exec::{
    ExpressionEngine, MemoryAssetStore, TraceEntry, TraceRequest, TraceResponse, VarValue, WfCase,
};
use weft_store::{GlobalStore, MemoryGlobalStore};

fn new_case() -> (WfCase, Arc<MemoryGlobalStore>) {
    let globals = Arc::new(MemoryGlobalStore::new());
    let case = WfCase::new(
        Arc::new(ExpressionEngine::default()),
        globals.clone(),
        Arc::new(MemoryAssetStore::new()),
    );
    (case, globals)
}

fn case_with_inbound(body: serde_json::Value) -> WfCase {
    let (mut case, _) = new_case();
    case.record_inbound(
        TraceRequest::new("POST", "case://localhost/test")
            .with_body(serde_json::to_vec(&body).unwrap(), "application/json"),
    );
    case
}

#[tokio::test]
async fn literal_strings_pass_through_unchanged() {
    let (mut case, _) = new_case();
    let ctx = ResolutionContext::inbound();

    for input in ["", "plain text", r#"{"not": "a reference"}"#, "a > b && c"] {
        let out = resolver::interpolate(&mut case, &ctx, input).await.unwrap();
        assert_eq!(out, input);
    }
}

#[tokio::test]
async fn json_path_resolves_against_the_inbound_body() {
    let mut case = case_with_inbound(json!({"year": 1939, "title": "X"}));
    let ctx = ResolutionContext::inbound();

    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{$.year}").await.unwrap(),
        "1939"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{$.title}").await.unwrap(),
        "X"
    );
    // A missing key resolves to empty without failing the interpolation.
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{$.missing}").await.unwrap(),
        ""
    );
}

#[tokio::test]
async fn json_path_against_non_json_body_is_an_error() {
    let (mut case, _) = new_case();
    case.record_inbound(
        TraceRequest::new("POST", "case://localhost/test")
            .with_body(b"definitely not json".to_vec(), "text/plain"),
    );
    let ctx = ResolutionContext::inbound();

    let err = resolver::interpolate(&mut case, &ctx, "{$.x}").await.unwrap_err();
    assert!(err.to_string().contains("not valid JSON"), "{err}");
}

#[tokio::test]
async fn header_param_and_query_lookups() {
    let (mut case, _) = new_case();
    case.record_inbound(
        TraceRequest::new("GET", "case://localhost/test")
            .with_headers(BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]))
            .with_params(BTreeMap::from([("id".to_string(), "42".to_string())]))
            .with_query(BTreeMap::from([("page".to_string(), "3".to_string())])),
    );
    let ctx = ResolutionContext::inbound();

    // Header lookup is case-insensitive.
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{h:content-type}").await.unwrap(),
        "application/json"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{p:id}").await.unwrap(),
        "42"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{q:page}").await.unwrap(),
        "3"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{h:absent}").await.unwrap(),
        ""
    );
}

#[tokio::test]
async fn variable_lookup_and_callable_invocation() {
    let (mut case, _) = new_case();
    case.set_var("total", VarValue::Scalar(json!(120)));
    case.set_var(
        "join",
        VarValue::Callable(Arc::new(|args: &[String]| args.join("-"))),
    );
    let ctx = ResolutionContext::inbound();

    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "total={v:total}").await.unwrap(),
        "total=120"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{v:join,a,b}").await.unwrap(),
        "a-b"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{v:ghost}").await.unwrap(),
        ""
    );
}

#[tokio::test]
async fn environment_fallback_without_a_prefix() {
    std::env::set_var("WEFT_RESOLVER_TEST", "from-env");
    let (mut case, _) = new_case();
    let ctx = ResolutionContext::inbound();

    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{WEFT_RESOLVER_TEST}").await.unwrap(),
        "from-env"
    );
}

#[tokio::test]
async fn global_store_lookup_with_default() {
    let (mut case, globals) = new_case();
    globals
        .set("session", "token", json!("abc123"), None)
        .await
        .unwrap();
    let ctx = ResolutionContext::inbound();

    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{g:session:token}").await.unwrap(),
        "abc123"
    );
    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{g:session:absent,anon}").await.unwrap(),
        "anon"
    );
}

#[tokio::test]
async fn escape_option_json_escapes_the_value() {
    let mut case = case_with_inbound(json!({"title": "say \"hi\""}));
    let ctx = ResolutionContext::inbound();

    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{!$.title}").await.unwrap(),
        r#"say \"hi\""#
    );
}

#[tokio::test]
async fn tovar_binds_a_temporary_variable() {
    let mut case = case_with_inbound(json!({"year": 1939}));
    let ctx = ResolutionContext::inbound();

    let out = resolver::interpolate(&mut case, &ctx, "{$.year,tovar}").await.unwrap();
    assert!(out.starts_with("_wv"), "substitutes the temp name: {out}");
    assert_eq!(
        case.var(&out).and_then(|v| v.as_scalar()).cloned(),
        Some(json!("1939"))
    );
}

#[tokio::test]
async fn assignments_purge_temporaries_after_the_batch() {
    let mut case = case_with_inbound(json!({"year": 1939}));
    let ctx = ResolutionContext::inbound();

    let assignments = vec![ProcessVarDoc::new("bound", "{$.year,tovar}")];
    resolver::apply_process_vars(&mut case, &ctx, &assignments).await.unwrap();

    // The assignment observed the temp name; the temp itself is gone.
    let bound = case.var("bound").and_then(|v| v.as_scalar()).cloned().unwrap();
    let temp_name = bound.as_str().unwrap().to_string();
    assert!(temp_name.starts_with("_wv"));
    assert!(case.var(&temp_name).is_none(), "temporaries must not leak");
}

#[tokio::test]
async fn assignment_values_are_plain_strings_unless_marked() {
    let mut case = case_with_inbound(json!({"year": 1939}));
    let ctx = ResolutionContext::inbound();

    let assignments = vec![
        ProcessVarDoc::new("literal", "2 + 2"),
        ProcessVarDoc::new("year", "{$.year}"),
        ProcessVarDoc::new("doubled", ":{$.year} * 2"),
    ];
    resolver::apply_process_vars(&mut case, &ctx, &assignments).await.unwrap();

    assert_eq!(
        case.var("literal").and_then(|v| v.as_scalar()),
        Some(&json!("2 + 2"))
    );
    assert_eq!(
        case.var("year").and_then(|v| v.as_scalar()),
        Some(&json!("1939"))
    );
    assert_eq!(
        case.var("doubled").and_then(|v| v.as_scalar()),
        Some(&json!(3878))
    );
}

#[tokio::test]
async fn guards_evaluate_over_process_variables() {
    let mut case = case_with_inbound(json!({"year": 1939}));
    case.set_var("total", VarValue::Scalar(json!(120)));
    let ctx = ResolutionContext::inbound();

    assert!(resolver::eval_guard(&mut case, &ctx, "").await.unwrap());
    assert!(resolver::eval_guard(&mut case, &ctx, "total > 100").await.unwrap());
    assert!(!resolver::eval_guard(&mut case, &ctx, "total > 200").await.unwrap());
    assert!(resolver::eval_guard(&mut case, &ctx, "{$.year} == 1939").await.unwrap());

    let err = resolver::eval_guard(&mut case, &ctx, "total + 1").await.unwrap_err();
    assert!(err.to_string().contains("boolean"), "{err}");
}

#[tokio::test]
async fn references_read_a_named_entry_on_its_response_side() {
    let (mut case, _) = new_case();
    case.record_entry(
        "lookup-customer",
        TraceEntry::exchange(
            TraceRequest::new("GET", "https://backend/customers/7"),
            TraceResponse::new(
                200,
                serde_json::to_vec(&json!({"name": "ada"})).unwrap(),
                "application/json",
            ),
        ),
    );
    let ctx = ResolutionContext::for_entry("lookup-customer");

    assert_eq!(
        resolver::interpolate(&mut case, &ctx, "{$.name}").await.unwrap(),
        "ada"
    );
}
