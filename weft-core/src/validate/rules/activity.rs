use crate::types::ActivityDoc;
use crate::validate::validator::{Validator, ID_RE};

pub(crate) fn validate_activity(v: &mut Validator, a: &ActivityDoc, path: &str) {
    if !ID_RE.is_match(&a.name) {
        v.push(format!("{path}.name"), "must match regex [A-Za-z0-9_\\-]+");
    }
    if a.kind.is_empty() {
        v.push(format!("{path}.type"), "must not be empty");
    }
    if a.boundary.is_empty() {
        v.push(format!("{path}.boundary"), "must not be empty");
    }

    if let Some(enabled) = &a.enabled {
        v.validate_template(&format!("{path}.enabled"), enabled);
    }

    for (idx, pv) in a.process_vars.iter().enumerate() {
        let vpath = format!("{path}.processVars[{idx}]");
        if pv.name.is_empty() {
            v.push(format!("{vpath}.name"), "must not be empty");
        }
        v.validate_template(&format!("{vpath}.value"), &pv.value);
    }
}
