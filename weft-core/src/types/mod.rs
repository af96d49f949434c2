mod activity;
mod boundary;
mod common;
mod orchestration;
mod path;

pub use activity::{ActivityDoc, ProcessVarDoc};
pub use boundary::BoundaryDoc;
pub use common::{AnyValue, Extensions, GuardPolicy, GLOBAL_BOUNDARY, INBOUND_ENTRY};
pub use orchestration::OrchestrationDoc;
pub use path::PathDoc;
