use crate::types::{Extensions, GLOBAL_BOUNDARY};

/// One declared activity. The `type` discriminator is resolved through the
/// runtime's constructor registry; everything a concrete kind needs beyond
/// the common fields travels in `definition` (an asset path) or `extensions`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActivityDoc {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    #[serde(default = "default_boundary")]
    pub boundary: String,

    #[serde(default, rename = "isBoundary")]
    pub is_boundary: bool,

    #[serde(default, rename = "processVars", skip_serializing_if = "Vec::is_empty")]
    pub process_vars: Vec<ProcessVarDoc>,

    /// Guard expression; a false result skips the activity body at runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<String>,

    /// Name of the trace entry that supplies `{$...}` values for this
    /// activity's own assignments and templates.
    #[serde(default, rename = "expressionContext", skip_serializing_if = "Option::is_none")]
    pub expression_context: Option<String>,

    /// Asset path of the externally-loaded definition blob (endpoint
    /// templates, response templates, sub-orchestration references).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(flatten, default)]
    pub extensions: Extensions,
}

impl ActivityDoc {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            actor: None,
            boundary: default_boundary(),
            is_boundary: false,
            process_vars: Vec::new(),
            enabled: None,
            expression_context: None,
            definition: None,
            extensions: Extensions::new(),
        }
    }
}

fn default_boundary() -> String {
    GLOBAL_BOUNDARY.to_string()
}

/// A named assignment applied to the case's variable space when the owning
/// activity executes. The value is an interpolation template; a leading `:`
/// in the interpolated result routes it through the expression engine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProcessVarDoc {
    pub name: String,
    pub value: String,
}

impl ProcessVarDoc {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
