use std::collections::HashSet;

use crate::types::{GuardPolicy, OrchestrationDoc};
use crate::validate::rules::activity;
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_orchestration(v: &mut Validator, doc: &OrchestrationDoc, path: &str) {
    if !ID_RE.is_match(&doc.id) {
        v.push(format!("{path}.id"), "must match regex [A-Za-z0-9_\\-]+");
    }

    if doc.activities.is_empty() {
        v.push(format!("{path}.activities"), "must have at least one entry");
    }

    let mut names = HashSet::<&str>::new();
    let mut request_activities = Vec::new();
    let mut response_count = 0usize;
    for (idx, a) in doc.activities.iter().enumerate() {
        let apath = format!("{path}.activities[{idx}]");
        if !names.insert(a.name.as_str()) {
            v.push(
                format!("{apath}.name"),
                "must be unique within the orchestration",
            );
        }
        match a.kind.as_str() {
            "request" => request_activities.push(a.name.as_str()),
            "response" => response_count += 1,
            _ => {}
        }
        activity::validate_activity(v, a, &apath);
    }

    if request_activities.len() > 1 {
        v.push(
            format!("{path}.activities"),
            "must declare exactly one request activity",
        );
    }
    if request_activities.is_empty() {
        v.push(
            format!("{path}.activities"),
            "must declare a request activity",
        );
    }
    if response_count == 0 {
        v.push(
            format!("{path}.activities"),
            "must declare at least one response activity",
        );
    }

    if let Some(start) = &doc.start_activity {
        if request_activities.first() != Some(&start.as_str()) {
            v.push(
                format!("{path}.startActivity"),
                "must name the request activity",
            );
        }
    }

    let known = |name: &str| doc.activities.iter().any(|a| a.name == name);
    let boundary_member = |name: &str| {
        doc.activities
            .iter()
            .any(|a| a.name == name && a.is_boundary)
    };

    for (idx, p) in doc.paths.iter().enumerate() {
        let ppath = format!("{path}.paths[{idx}]");
        if !known(&p.source) {
            v.push(format!("{ppath}.source"), "references an unknown activity");
        }
        if !known(&p.target) {
            v.push(format!("{ppath}.target"), "references an unknown activity");
        }
        if boundary_member(&p.source) || boundary_member(&p.target) {
            v.push(ppath.clone(), "boundary activities must not carry edges");
        }
        v.validate_template(&format!("{ppath}.constraint"), &p.constraint);
    }

    let mut boundary_names = HashSet::<&str>::new();
    for (idx, b) in doc.boundaries.iter().enumerate() {
        let bpath = format!("{path}.boundaries[{idx}]");
        if b.name.is_empty() {
            v.push(format!("{bpath}.name"), "must not be empty");
        }
        if !boundary_names.insert(b.name.as_str()) {
            v.push(format!("{bpath}.name"), "must be unique");
        }
        for (midx, m) in b.activities.iter().enumerate() {
            if !known(m) {
                v.push(
                    format!("{bpath}.activities[{midx}]"),
                    "references an unknown activity",
                );
            }
        }
    }

    if let Err(raw) = doc.guard_policy() {
        v.push(
            format!("{path}.properties.pathSelection"),
            format!(
                "unknown policy `{raw}` (expected `{}` or `{}`)",
                GuardPolicy::ExactlyOne.as_str(),
                GuardPolicy::AtLeastOne.as_str()
            ),
        );
    }

    let mut nested_ids = HashSet::<&str>::new();
    for (idx, nested) in doc.orchestrations.iter().enumerate() {
        let npath = format!("{path}.orchestrations[{idx}]");
        if !nested_ids.insert(nested.id.as_str()) {
            v.push(format!("{npath}.id"), "must be unique");
        }
        validate_orchestration(v, nested, &npath);
    }
}
