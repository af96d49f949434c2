use async_trait::async_trait;

use weft_core::types::ActivityDoc;

use crate::activity::{Activity, ActivityBase};
use crate::case::{TraceEntry, TraceRequest, TraceResponse, WfCase};
use crate::executor::EngineError;
use crate::graph::{BuildContext, ModelError};

/// Copies its context body into its own response entry. Doubles as the
/// canonical audit/boundary activity.
pub struct EchoActivity {
    base: ActivityBase,
}

pub(crate) fn construct(
    doc: &ActivityDoc,
    ctx: &BuildContext<'_>,
) -> Result<Box<dyn Activity>, ModelError> {
    Ok(Box::new(EchoActivity {
        base: ActivityBase::from_doc(doc, ctx.policy),
    }))
}

#[async_trait]
impl Activity for EchoActivity {
    fn base(&self) -> &ActivityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ActivityBase {
        &mut self.base
    }

    fn kind(&self) -> &str {
        "echo"
    }

    async fn execute(&self, case: &mut WfCase) -> Result<(), EngineError> {
        let ctx = self.resolution_context();
        let (body, mime) = match case.entry(&ctx.entry) {
            Some(entry) => {
                let body = entry.body(ctx.side).map(<[u8]>::to_vec).unwrap_or_default();
                let mime = match ctx.side {
                    crate::case::TraceSide::Request => entry.request.mime.clone(),
                    crate::case::TraceSide::Response => entry
                        .response
                        .as_ref()
                        .map(|r| r.mime.clone())
                        .unwrap_or_default(),
                };
                (body, mime)
            }
            None => (Vec::new(), String::new()),
        };

        case.record_entry(
            self.name().to_string(),
            TraceEntry::exchange(
                TraceRequest::synthetic(self.kind(), self.name()),
                TraceResponse::new(200, body, mime),
            ),
        );
        Ok(())
    }
}
