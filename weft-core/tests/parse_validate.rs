use weft_core::types::{GuardPolicy, OrchestrationDoc};
use weft_core::{parse_document_str, DocumentFormat, Validate};

fn minimal_doc_json() -> serde_json::Value {
    serde_json::json!({
        "id": "order-lookup",
        "description": "fetch one order",
        "activities": [
            {"name": "start", "type": "request"},
            {"name": "fetch", "type": "echo"},
            {"name": "end", "type": "response"}
        ],
        "paths": [
            {"source": "start", "target": "fetch"},
            {"source": "fetch", "target": "end"}
        ]
    })
}

#[test]
fn parses_json_and_detects_format() {
    let input = minimal_doc_json().to_string();
    let parsed = parse_document_str(&input, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Json);
    assert_eq!(parsed.document.id, "order-lookup");
    assert_eq!(parsed.document.activities.len(), 3);
}

#[test]
fn parses_yaml_and_detects_format() {
    let input = r#"
id: order-lookup
activities:
  - name: start
    type: request
  - name: end
    type: response
paths:
  - source: start
    target: end
"#;
    let parsed = parse_document_str(input, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Yaml);
    assert_eq!(parsed.document.activities[0].kind, "request");
}

#[test]
fn round_trips_between_json_and_yaml() {
    let input = minimal_doc_json().to_string();
    let parsed = parse_document_str(&input, DocumentFormat::Json).unwrap();

    let yaml = serde_yaml::to_string(&parsed.document).unwrap();
    let reparsed = parse_document_str(&yaml, DocumentFormat::Yaml).unwrap();
    assert_eq!(parsed.document, reparsed.document);

    let json = serde_json::to_string(&reparsed.document).unwrap();
    let again = parse_document_str(&json, DocumentFormat::Json).unwrap();
    assert_eq!(parsed.document, again.document);
}

#[test]
fn boundary_default_is_global() {
    let doc: OrchestrationDoc = serde_json::from_value(minimal_doc_json()).unwrap();
    assert_eq!(doc.activities[0].boundary, "global");
    assert!(!doc.activities[0].is_boundary);
}

#[test]
fn guard_policy_parses_from_properties() {
    let mut value = minimal_doc_json();
    value["properties"] = serde_json::json!({"pathSelection": "at-least-one"});
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    assert_eq!(doc.guard_policy().unwrap(), GuardPolicy::AtLeastOne);

    let doc: OrchestrationDoc = serde_json::from_value(minimal_doc_json()).unwrap();
    assert_eq!(doc.guard_policy().unwrap(), GuardPolicy::ExactlyOne);
}

#[test]
fn valid_document_passes_validation() {
    let doc: OrchestrationDoc = serde_json::from_value(minimal_doc_json()).unwrap();
    assert!(doc.validate().is_ok());
}

fn violation_paths(doc: &OrchestrationDoc) -> Vec<String> {
    match doc.validate() {
        Ok(()) => Vec::new(),
        Err(e) => e.violations.into_iter().map(|v| v.path).collect(),
    }
}

#[test]
fn dangling_path_is_a_violation() {
    let mut value = minimal_doc_json();
    value["paths"][1]["target"] = serde_json::json!("nowhere");
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(paths.iter().any(|p| p.contains("paths[1].target")), "{paths:?}");
}

#[test]
fn two_request_activities_are_a_violation() {
    let mut value = minimal_doc_json();
    value["activities"][1]["type"] = serde_json::json!("request");
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    assert!(!violation_paths(&doc).is_empty());
}

#[test]
fn unknown_guard_policy_is_a_violation() {
    let mut value = minimal_doc_json();
    value["properties"] = serde_json::json!({"pathSelection": "whichever"});
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(paths.iter().any(|p| p.contains("pathSelection")), "{paths:?}");
}

#[test]
fn malformed_constraint_reference_is_a_violation() {
    let mut value = minimal_doc_json();
    value["paths"][0]["constraint"] = serde_json::json!("{h:Accept == 1");
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(paths.iter().any(|p| p.contains("paths[0].constraint")), "{paths:?}");
}

#[test]
fn boundary_activity_with_edges_is_a_violation() {
    let mut value = minimal_doc_json();
    value["activities"][1]["isBoundary"] = serde_json::json!(true);
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(!paths.is_empty(), "boundary member carries edges");
}

#[test]
fn boundary_referencing_unknown_activity_is_a_violation() {
    let mut value = minimal_doc_json();
    value["boundaries"] = serde_json::json!([{"name": "audit", "activities": ["ghost"]}]);
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(paths.iter().any(|p| p.contains("boundaries[0]")), "{paths:?}");
}

#[test]
fn start_activity_mismatch_is_a_violation() {
    let mut value = minimal_doc_json();
    value["startActivity"] = serde_json::json!("fetch");
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(paths.iter().any(|p| p.contains("startActivity")), "{paths:?}");
}

#[test]
fn nested_orchestrations_are_validated() {
    let mut value = minimal_doc_json();
    value["orchestrations"] = serde_json::json!([{
        "id": "sub",
        "activities": [
            {"name": "sub-start", "type": "request"}
        ]
    }]);
    let doc: OrchestrationDoc = serde_json::from_value(value).unwrap();
    let paths = violation_paths(&doc);
    assert!(
        paths.iter().any(|p| p.contains("orchestrations[0]")),
        "nested doc without a response activity must be flagged: {paths:?}"
    );
}
