use std::collections::HashMap;

use weft_core::types::ActivityDoc;

use crate::activity::{kinds, Activity};
use crate::graph::{BuildContext, ModelError};

/// Constructor for one activity kind, invoked while the declarative document
/// is being turned into an executable graph.
pub type ActivityCtor =
    fn(&ActivityDoc, &BuildContext<'_>) -> Result<Box<dyn Activity>, ModelError>;

/// Type-to-constructor table. The document layer stays open: hosts register
/// their own kinds (kafka producers, document stores, transformation rule
/// engines) next to the structural ones shipped here.
pub struct ActivityRegistry {
    ctors: HashMap<String, ActivityCtor>,
}

impl ActivityRegistry {
    pub fn empty() -> Self {
        Self {
            ctors: HashMap::new(),
        }
    }

    /// The structural kinds the default build installs.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("request", kinds::request::construct);
        registry.register("response", kinds::response::construct);
        registry.register("echo", kinds::echo::construct);
        registry.register("rest", kinds::rest::construct);
        registry.register("nested", kinds::nested::construct);
        registry.register("loop", kinds::looping::construct);
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, ctor: ActivityCtor) {
        self.ctors.insert(kind.into(), ctor);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.ctors.contains_key(kind)
    }

    pub fn construct(
        &self,
        doc: &ActivityDoc,
        ctx: &BuildContext<'_>,
    ) -> Result<Box<dyn Activity>, ModelError> {
        let ctor = self
            .ctors
            .get(&doc.kind)
            .ok_or_else(|| ModelError::UnknownKind {
                name: doc.name.clone(),
                kind: doc.kind.clone(),
            })?;
        ctor(doc, ctx)
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
