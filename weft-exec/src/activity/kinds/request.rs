use async_trait::async_trait;

use weft_core::types::ActivityDoc;

use crate::activity::{Activity, ActivityBase};
use crate::case::WfCase;
use crate::executor::EngineError;
use crate::graph::{BuildContext, ModelError};

/// The start marker. The inbound call is already recorded under the reserved
/// `request` entry when the case is constructed; this activity only anchors
/// the walk and carries the initial variable assignments.
pub struct RequestActivity {
    base: ActivityBase,
}

pub(crate) fn construct(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn Activity>, ModelError> {
    Ok(Box::new(RequestActivity {
        base: ActivityBase::from_doc(doc, ctx.policy),
    }))
}

#[async_trait]
impl Activity for RequestActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActivityBase {
        &mut self.base
    }

    fn kind(&self) -> &str {
        "request"
    }

    fn is_valid(&self) -> bool {
        self.base.inputs.is_empty() && !self.base.outputs.is_empty()
    }

    async fn execute(&self, _case: &mut WfCase) -> Result<(), EngineError> {
        Ok(())
    }
}
