/// A named group of activities executed out-of-band after the main walk,
/// regardless of its outcome.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BoundaryDoc {
    pub name: String,

    #[serde(default)]
    pub activities: Vec<String>,
}
