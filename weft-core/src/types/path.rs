/// A directed edge between two named activities. The constraint is a guard
/// expression; the empty string means "always true".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PathDoc {
    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraint: String,
}

impl PathDoc {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            constraint: String::new(),
        }
    }

    pub fn guarded(
        source: impl Into<String>,
        target: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            constraint: constraint.into(),
        }
    }
}
