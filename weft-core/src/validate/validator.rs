use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, Violation};
use crate::types::OrchestrationDoc;

use super::rules;

pub(crate) static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid"));

pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.violations))
        }
    }

    pub fn validate_document(&mut self, doc: &OrchestrationDoc) {
        rules::orchestration::validate_orchestration(self, doc, "$");
    }

    pub(crate) fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    /// Every guard and template in a document must at least scan; resolution
    /// failures are a runtime concern, syntax failures are not.
    pub(crate) fn validate_template(&mut self, path: &str, template: &str) {
        if let Err(e) = crate::expressions::scan_template(template) {
            self.push(path, e.to_string());
        }
    }
}
