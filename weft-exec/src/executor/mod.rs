mod events;
mod result;

pub use events::{CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink};
pub use result::{
    EngineError, CODE_AMBIGUOUS_GUARD, CODE_BACKEND, CODE_BOUNDARY, CODE_DEADLINE,
    CODE_HOP_BUDGET, CODE_NO_TRUE_GUARD, CODE_RESOLVE, CODE_UNKNOWN_ACTIVITY,
};

use std::sync::Arc;
use std::time::Instant;

use crate::activity::Activity;
use crate::case::{Breadcrumb, WfCase};
use crate::graph::Orchestration;
use crate::resolver;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Backstop against cyclic graphs; one hop is one activity visit.
    pub max_hops: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_hops: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkResult {
    /// Name of the activity the walk terminated at; normally the response
    /// activity.
    pub terminal: String,
    pub hops: usize,
}

/// Walks an orchestration graph with one case. Stateless beyond its config:
/// everything mutable lives in the case, so one executor serves any number
/// of sequential walks.
pub struct Executor {
    config: ExecutorConfig,
    events: Arc<dyn EventSink>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default(), Arc::new(NoOpEventSink))
    }
}

impl Executor {
    pub fn new(config: ExecutorConfig, events: Arc<dyn EventSink>) -> Self {
        Self { config, events }
    }

    /// Walk from the start activity to a terminal one. Guard selection
    /// follows the orchestration's configured policy; the first activity
    /// error aborts the walk with the breadcrumb log already carrying the
    /// partial trail.
    pub async fn run(
        &self,
        orchestration: &Orchestration,
        case: &mut WfCase,
    ) -> Result<WalkResult, EngineError> {
        self.events
            .emit(Event::WalkStarted {
                case_id: case.id,
                orchestration_id: orchestration.id().to_string(),
            })
            .await;

        let mut current = orchestration.start().to_string();
        let mut hops = 0usize;

        loop {
            hops += 1;
            if hops > self.config.max_hops {
                let error = EngineError::server(
                    current.clone(),
                    result::CODE_HOP_BUDGET,
                    format!("walk exceeded {} hops", self.config.max_hops),
                );
                self.finish(case, None, false).await;
                return Err(error);
            }

            let activity = orchestration.activity(&current).ok_or_else(|| {
                EngineError::server(
                    current.clone(),
                    result::CODE_UNKNOWN_ACTIVITY,
                    "path target does not exist in the graph",
                )
            })?;

            match self.run_activity(activity.as_ref(), case).await {
                Ok(()) => {}
                Err(error) => {
                    self.finish(case, None, false).await;
                    return Err(error);
                }
            }

            match activity.next(case).await {
                Ok(Some(target)) => current = target,
                Ok(None) => {
                    self.finish(case, Some(current.clone()), true).await;
                    return Ok(WalkResult {
                        terminal: current,
                        hops,
                    });
                }
                Err(error) => {
                    case.push_breadcrumb(Breadcrumb::failed(
                        activity.name(),
                        "path selection",
                        error.to_string(),
                    ));
                    self.finish(case, None, false).await;
                    return Err(error);
                }
            }
        }
    }

    /// Run every activity listed under a named boundary, unconditionally and
    /// without short-circuiting; used for side effects that must happen
    /// regardless of how the primary walk went.
    pub async fn execute_boundary(
        &self,
        orchestration: &Orchestration,
        boundary: &str,
        case: &mut WfCase,
    ) -> Result<(), EngineError> {
        let members = orchestration
            .boundary(boundary)
            .ok_or_else(|| {
                EngineError::server(
                    boundary,
                    result::CODE_BOUNDARY,
                    "boundary is not declared in the orchestration",
                )
            })?
            .activities
            .clone();

        self.events
            .emit(Event::BoundaryStarted {
                case_id: case.id,
                boundary: boundary.to_string(),
            })
            .await;

        let mut failed = 0usize;
        for name in &members {
            let Some(activity) = orchestration.activity(name) else {
                failed += 1;
                continue;
            };
            if self.run_activity(activity.as_ref(), case).await.is_err() {
                failed += 1;
            }
        }

        self.events
            .emit(Event::BoundaryFinished {
                case_id: case.id,
                boundary: boundary.to_string(),
                failed,
            })
            .await;

        if failed > 0 {
            return Err(EngineError::server(
                boundary,
                result::CODE_BOUNDARY,
                format!("{failed} of {} boundary activities failed", members.len()),
            ));
        }
        Ok(())
    }

    /// One activity visit: deadline checkpoint, enabled guard, variable
    /// assignments, body, breadcrumb.
    async fn run_activity(
        &self,
        activity: &dyn Activity,
        case: &mut WfCase,
    ) -> Result<(), EngineError> {
        let name = activity.name().to_string();

        if case.deadline_exceeded() {
            let error = EngineError::deadline(name.clone());
            case.push_breadcrumb(Breadcrumb::failed(
                name.clone(),
                activity.kind(),
                error.to_string(),
            ));
            self.events
                .emit(Event::ActivityFailed {
                    case_id: case.id,
                    activity: name,
                    error: error.to_string(),
                })
                .await;
            return Err(error);
        }

        self.events
            .emit(Event::ActivityStarted {
                case_id: case.id,
                activity: name.clone(),
            })
            .await;

        if !activity.is_enabled(case).await? {
            case.push_breadcrumb(Breadcrumb::ok(name.clone(), "skipped"));
            self.events
                .emit(Event::ActivitySkipped {
                    case_id: case.id,
                    activity: name,
                })
                .await;
            return Ok(());
        }

        let started = Instant::now();
        let outcome = self.invoke(activity, case).await;
        case.add_elapsed(started.elapsed());

        match outcome {
            Ok(()) => {
                case.push_breadcrumb(Breadcrumb::ok(name.clone(), activity.kind()));
                self.events
                    .emit(Event::ActivitySucceeded {
                        case_id: case.id,
                        activity: name,
                    })
                    .await;
                Ok(())
            }
            Err(error) => {
                case.push_breadcrumb(Breadcrumb::failed(
                    name.clone(),
                    activity.kind(),
                    error.to_string(),
                ));
                self.events
                    .emit(Event::ActivityFailed {
                        case_id: case.id,
                        activity: name,
                        error: error.to_string(),
                    })
                    .await;
                Err(error)
            }
        }
    }

    async fn invoke(
        &self,
        activity: &dyn Activity,
        case: &mut WfCase,
    ) -> Result<(), EngineError> {
        resolver::apply_process_vars(
            case,
            &activity.resolution_context(),
            activity.process_vars(),
        )
        .await
        .map_err(|e| EngineError::resolve(activity.name(), e))?;
        activity.execute(case).await
    }

    async fn finish(&self, case: &WfCase, terminal: Option<String>, success: bool) {
        self.events
            .emit(Event::WalkFinished {
                case_id: case.id,
                terminal,
                success,
            })
            .await;
    }
}
