use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use weft_core::{parse_document_str, DocumentFormat, Validate};
use weft_exec::{
    ActivityRegistry, Executor, ExecutorConfig, ExpressionEngine, FsAssetStore, NoOpEventSink,
    Orchestration, ReqwestHttpClient, StdoutEventSink, TraceRequest, VarValue, WfCase,
};
use weft_store::MemoryGlobalStore;

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct RunResult {
    terminal: String,
    status: u16,
    mime: String,
    body: String,
    breadcrumbs: Vec<String>,
}

pub async fn run_cmd(
    path: &Path,
    input: Option<&Path>,
    set_vars: &[String],
    deadline_ms: Option<u64>,
    events: bool,
    output: OutputArgs,
) -> i32 {
    let content = match std::fs::read_to_string(path) {
        Ok(v) => v,
        Err(e) => {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to read {}: {e}", path.display()),
            );
            return exit_codes::RUNTIME_ERROR;
        }
    };

    let parsed = match parse_document_str(&content, DocumentFormat::Auto) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };
    if let Err(e) = parsed.document.validate() {
        print_error(
            output.format,
            output.quiet,
            &format!(
                "document failed validation ({} violations)",
                e.violations.len()
            ),
        );
        return exit_codes::VALIDATION_FAILED;
    }

    let assets_root = path.parent().unwrap_or_else(|| Path::new("."));
    let registry = ActivityRegistry::builtin();
    let orchestration = match Orchestration::build(
        &parsed.document,
        &registry,
        Arc::new(ReqwestHttpClient::default()),
        Arc::new(FsAssetStore::new(assets_root)),
    ) {
        Ok(o) => o,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };
    if !orchestration.is_valid() {
        for v in orchestration.validity_violations() {
            print_error(
                output.format,
                output.quiet,
                &format!("{}: {}", v.path, v.message),
            );
        }
        return exit_codes::VALIDATION_FAILED;
    }

    let body = match input {
        Some(input_path) => match std::fs::read(input_path) {
            Ok(v) => v,
            Err(e) => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("failed to read {}: {e}", input_path.display()),
                );
                return exit_codes::RUNTIME_ERROR;
            }
        },
        None => Vec::new(),
    };

    let engine = Arc::new(ExpressionEngine::default());
    let globals = Arc::new(MemoryGlobalStore::new());
    let assets = Arc::new(FsAssetStore::new(assets_root));

    let mut case = WfCase::new(engine, globals, assets);
    if let Some(ms) = deadline_ms {
        case = case.with_deadline(Duration::from_millis(ms));
    }
    case.record_inbound(
        TraceRequest::new("POST", format!("case://localhost/{}", orchestration.id()))
            .with_body(body, "application/json"),
    );
    for pair in set_vars {
        match pair.split_once('=') {
            Some((key, value)) => case.set_var(key.to_string(), VarValue::string(value)),
            None => {
                print_error(
                    output.format,
                    output.quiet,
                    &format!("--set expects KEY=VALUE, got `{pair}`"),
                );
                return exit_codes::RUNTIME_ERROR;
            }
        }
    }

    let executor = if events {
        Executor::new(ExecutorConfig::default(), Arc::new(StdoutEventSink))
    } else {
        Executor::new(ExecutorConfig::default(), Arc::new(NoOpEventSink))
    };

    match executor.run(&orchestration, &mut case).await {
        Ok(walk) => {
            let response = case.entry(&walk.terminal).and_then(|e| e.response.clone());
            let (status, mime, body) = match response {
                Some(r) => (
                    r.status,
                    r.mime.clone(),
                    String::from_utf8_lossy(&r.body).into_owned(),
                ),
                None => (204, String::new(), String::new()),
            };
            let result = RunResult {
                terminal: walk.terminal,
                status,
                mime,
                body: body.clone(),
                breadcrumbs: case
                    .breadcrumbs()
                    .iter()
                    .map(|b| format!("{}: {}", b.activity, b.description))
                    .collect(),
            };
            if output.format == OutputFormat::Text && !output.quiet {
                println!("{body}");
            } else {
                print_result(output.format, output.quiet, &result);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            for b in case.breadcrumbs() {
                if let Some(err) = &b.error {
                    print_error(
                        output.format,
                        output.quiet,
                        &format!("at {}: {err}", b.activity),
                    );
                }
            }
            exit_codes::RUN_FAILED
        }
    }
}
