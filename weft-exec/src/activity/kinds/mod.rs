pub(crate) mod echo;
pub(crate) mod looping;
pub(crate) mod nested;
pub(crate) mod request;
pub(crate) mod response;
pub(crate) mod rest;

use serde::de::DeserializeOwned;

use weft_core::types::ActivityDoc;

use crate::graph::{BuildContext, ModelError};

/// Resolve and parse an activity's definition blob. Definitions are loaded
/// at build time so a malformed one never reaches request time.
pub(crate) fn load_definition<T: DeserializeOwned>(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Option<T>, ModelError> {
    let Some(path) = &doc.definition else {
        return Ok(None);
    };
    let bytes = ctx.assets.get(path)?;
    let parsed = serde_json::from_slice(&bytes).map_err(|e| ModelError::Definition {
        name: doc.name.clone(),
        message: e.to_string(),
    })?;
    Ok(Some(parsed))
}

pub(crate) fn require_definition<T: DeserializeOwned>(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<T, ModelError> {
    load_definition(doc, ctx)?.ok_or_else(|| ModelError::Definition {
        name: doc.name.clone(),
        message: "definition reference is required".to_string(),
    })
}
