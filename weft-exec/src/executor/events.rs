use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

/// Walk-lifecycle notifications. This is the interface the asynchronous
/// trace reporters consume; the executor itself only emits.
#[derive(Debug, Clone)]
pub enum Event {
    WalkStarted {
        case_id: Uuid,
        orchestration_id: String,
    },
    ActivityStarted {
        case_id: Uuid,
        activity: String,
    },
    ActivitySucceeded {
        case_id: Uuid,
        activity: String,
    },
    ActivitySkipped {
        case_id: Uuid,
        activity: String,
    },
    ActivityFailed {
        case_id: Uuid,
        activity: String,
        error: String,
    },
    WalkFinished {
        case_id: Uuid,
        terminal: Option<String>,
        success: bool,
    },
    BoundaryStarted {
        case_id: Uuid,
        boundary: String,
    },
    BoundaryFinished {
        case_id: Uuid,
        boundary: String,
        failed: usize,
    },
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// JSON lines on stdout, one object per event.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        let json = match event {
            Event::WalkStarted {
                case_id,
                orchestration_id,
            } => {
                json!({ "type": "walk.started", "case_id": case_id.to_string(), "orchestration_id": orchestration_id })
            }
            Event::ActivityStarted { case_id, activity } => {
                json!({ "type": "activity.started", "case_id": case_id.to_string(), "activity": activity })
            }
            Event::ActivitySucceeded { case_id, activity } => {
                json!({ "type": "activity.succeeded", "case_id": case_id.to_string(), "activity": activity })
            }
            Event::ActivitySkipped { case_id, activity } => {
                json!({ "type": "activity.skipped", "case_id": case_id.to_string(), "activity": activity })
            }
            Event::ActivityFailed {
                case_id,
                activity,
                error,
            } => {
                json!({ "type": "activity.failed", "case_id": case_id.to_string(), "activity": activity, "error": error })
            }
            Event::WalkFinished {
                case_id,
                terminal,
                success,
            } => {
                json!({ "type": "walk.finished", "case_id": case_id.to_string(), "terminal": terminal, "success": success })
            }
            Event::BoundaryStarted { case_id, boundary } => {
                json!({ "type": "boundary.started", "case_id": case_id.to_string(), "boundary": boundary })
            }
            Event::BoundaryFinished {
                case_id,
                boundary,
                failed,
            } => {
                json!({ "type": "boundary.finished", "case_id": case_id.to_string(), "boundary": boundary, "failed": failed })
            }
        };
        println!("{}", serde_json::to_string(&json).unwrap_or_default());
    }
}
