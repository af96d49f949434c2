use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use weft_core::{parse_document_str, DocumentFormat, ParseError, Validate};
use weft_exec::{ActivityRegistry, FsAssetStore, Orchestration, ReqwestHttpClient};

use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::OutputArgs;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(path: &Path, output: OutputArgs) -> i32 {
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
        Err(ParseError::Json(e)) => {
            print_error(
                output.format,
                output.quiet,
                &format!("JSON parse failed: {e}"),
            );
            return exit_codes::VALIDATION_FAILED;
        }
        Err(ParseError::Yaml(e)) => {
            print_error(
                output.format,
                output.quiet,
                &format!("YAML parse failed: {e}"),
            );
            return exit_codes::VALIDATION_FAILED;
        }
        Err(ParseError::UnknownFormat) => {
            print_error(
                output.format,
                output.quiet,
                "input is neither valid JSON nor valid YAML",
            );
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let mut errors: Vec<String> = Vec::new();
    if let Err(err) = parsed.document.validate() {
        errors.extend(
            err.violations
                .iter()
                .map(|v| format!("{}: {}", v.path, v.message)),
        );
    }

    // Document-level checks passed; build the graph and run the advisory
    // shape check as well, using assets next to the document.
    if errors.is_empty() {
        let assets_root = path.parent().unwrap_or_else(|| Path::new("."));
        let registry = ActivityRegistry::builtin();
        match Orchestration::build(
            &parsed.document,
            &registry,
            Arc::new(ReqwestHttpClient::default()),
            Arc::new(FsAssetStore::new(assets_root)),
        ) {
            Ok(orchestration) => {
                errors.extend(
                    orchestration
                        .validity_violations()
                        .iter()
                        .map(|v| format!("{}: {}", v.path, v.message)),
                );
            }
            Err(e) => errors.push(e.to_string()),
        }
    }

    let result = ValidateResult {
        valid: errors.is_empty(),
        format: format!("{:?}", parsed.format),
        errors: errors.clone(),
    };

    if errors.is_empty() {
        if output.format == OutputFormat::Text && !output.quiet {
            println!("ok: valid orchestration document ({:?})", parsed.format);
        } else {
            print_result(output.format, output.quiet, &result);
        }
        exit_codes::SUCCESS
    } else {
        if output.format == OutputFormat::Text && !output.quiet {
            eprintln!("error: validation failed");
            for e in &errors {
                eprintln!("- {e}");
            }
        } else {
            print_result(output.format, output.quiet, &result);
        }
        exit_codes::VALIDATION_FAILED
    }
}
