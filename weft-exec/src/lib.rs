#![forbid(unsafe_code)]

//! Graph-walking runtime for weft orchestrations.
//!
//! Document parsing and validation live in `weft-core`; this crate builds the
//! executable graph, owns the per-request case, and walks it.

pub mod activity;
pub mod assets;
pub mod case;
pub mod executor;
pub mod graph;
pub mod http;
pub mod resolver;

pub use crate::activity::{Activity, ActivityRegistry};
pub use crate::assets::{AssetError, AssetStore, FsAssetStore, MemoryAssetStore};
pub use crate::case::{Breadcrumb, TraceEntry, TraceRequest, TraceResponse, VarValue, WfCase};
pub use crate::executor::{
    CompositeEventSink, EngineError, Event, EventSink, Executor, ExecutorConfig, NoOpEventSink,
    StdoutEventSink, WalkResult,
};
pub use crate::graph::{ModelError, Orchestration};
pub use crate::http::{HttpClient, HttpError, ReqwestHttpClient};
pub use crate::resolver::{ExpressionEngine, ResolutionContext, ResolveError};
