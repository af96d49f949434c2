use std::collections::BTreeMap;

pub type AnyValue = serde_json::Value;

/// Extra fields captured from the document; the `type`-specific payload of an
/// activity lands here so host-registered kinds can carry their own knobs.
pub type Extensions = BTreeMap<String, serde_json::Value>;

/// Default boundary every activity belongs to unless the document says otherwise.
pub const GLOBAL_BOUNDARY: &str = "global";

/// Reserved trace-entry name for the inbound call that started the case.
pub const INBOUND_ENTRY: &str = "request";

/// How the executor resolves multiple true guards on one activity's outgoing
/// paths. Kept as an enum so illegal policy strings are unrepresentable past
/// the document layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum GuardPolicy {
    /// More than one true guard is an error.
    #[default]
    #[serde(rename = "exactly-one")]
    ExactlyOne,
    /// First true guard wins; an always-true empty guard placed last acts as
    /// the catch-all default.
    #[serde(rename = "at-least-one")]
    AtLeastOne,
}

impl GuardPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exactly-one" => Some(Self::ExactlyOne),
            "at-least-one" => Some(Self::AtLeastOne),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactlyOne => "exactly-one",
            Self::AtLeastOne => "at-least-one",
        }
    }
}
