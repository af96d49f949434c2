//! Variable interpolation and guard evaluation against a live case.
//!
//! Two distinct responsibilities: substituting `{prefix:name}` references
//! into strings, and evaluating boolean/value expressions over the process
//! variable space. A value template is interpolated first and only routed
//! through the expression engine when it carries the leading `:` marker, so
//! literal text with operator-like characters is never evaluated by accident.

mod engine;

pub use engine::{ExprError, ExpressionEngine};

use serde_json::Value as JsonValue;
use serde_json_path::JsonPath;
use tracing::debug;

use weft_core::expressions::{scan_template, Prefix, Reference, Segment, TokenError};
use weft_core::types::{ProcessVarDoc, INBOUND_ENTRY};

use crate::case::{TraceSide, VarValue, WfCase};

/// Which trace entry (and which side of it) supplies `{$...}`, `h:`, `p:`
/// and `q:` values during one resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub entry: String,
    pub side: TraceSide,
}

impl ResolutionContext {
    /// The default context: the inbound call, request side (it has no
    /// response of its own).
    pub fn inbound() -> Self {
        Self {
            entry: INBOUND_ENTRY.to_string(),
            side: TraceSide::Request,
        }
    }

    /// Context for a named entry; every entry other than the inbound one is
    /// read on its response side.
    pub fn for_entry(entry: &str) -> Self {
        if entry == INBOUND_ENTRY {
            Self::inbound()
        } else {
            Self {
                entry: entry.to_string(),
                side: TraceSide::Response,
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("invalid json path `{path}`: {message}")]
    JsonPath { path: String, message: String },
    #[error("trace entry `{0}` body is not valid JSON")]
    BodyNotJson(String),
    #[error(transparent)]
    Expression(#[from] ExprError),
    #[error("guard `{expr}` did not evaluate to a boolean")]
    NotBoolean { expr: String },
    #[error(transparent)]
    Store(#[from] weft_store::StoreError),
}

/// Substitute every reference in `input`. Unresolvable references become the
/// empty string (with a diagnostic); only syntax errors and JSON-path
/// failures other than key-not-found propagate.
pub async fn interpolate(
    case: &mut WfCase,
    ctx: &ResolutionContext,
    input: &str,
) -> Result<String, ResolveError> {
    let template = scan_template(input)?;
    if template.is_literal() {
        return Ok(input.to_string());
    }

    let mut out = String::new();
    for segment in template.segments {
        match segment {
            Segment::Literal(l) => out.push_str(&l),
            Segment::Reference(r) => {
                let mut value = resolve_reference(case, ctx, &r).await?;
                if r.escape {
                    value = json_escape(&value);
                }
                if r.to_var {
                    out.push_str(&case.bind_temp(value));
                } else {
                    out.push_str(&value);
                }
            }
        }
    }
    Ok(out)
}

/// Apply one batch of variable assignments relative to `ctx`, then purge the
/// scratch variables the batch created.
pub async fn apply_process_vars(
    case: &mut WfCase,
    ctx: &ResolutionContext,
    assignments: &[ProcessVarDoc],
) -> Result<(), ResolveError> {
    for assignment in assignments {
        let raw = interpolate(case, ctx, &assignment.value).await?;
        let value = match raw.strip_prefix(':') {
            Some(expr) => {
                let vars = case.scalar_vars();
                VarValue::Scalar(case.engine().evaluate(expr, &vars)?)
            }
            None => VarValue::Scalar(JsonValue::String(raw)),
        };
        case.set_var(assignment.name.clone(), value);
    }
    case.purge_temp_vars();
    Ok(())
}

/// Resolve a seed list for a child case against the parent's context, without
/// touching the parent's variable space. Same two-stage semantics as
/// `apply_process_vars`.
pub async fn resolve_seeds(
    case: &mut WfCase,
    ctx: &ResolutionContext,
    seeds: &[ProcessVarDoc],
) -> Result<std::collections::BTreeMap<String, VarValue>, ResolveError> {
    let mut out = std::collections::BTreeMap::new();
    for seed in seeds {
        let raw = interpolate(case, ctx, &seed.value).await?;
        let value = match raw.strip_prefix(':') {
            Some(expr) => {
                let vars = case.scalar_vars();
                VarValue::Scalar(case.engine().evaluate(expr, &vars)?)
            }
            None => VarValue::Scalar(JsonValue::String(raw)),
        };
        out.insert(seed.name.clone(), value);
    }
    case.purge_temp_vars();
    Ok(out)
}

/// Evaluate a guard constraint: interpolate, then evaluate over the process
/// variable space. The empty constraint is always true.
pub async fn eval_guard(
    case: &mut WfCase,
    ctx: &ResolutionContext,
    constraint: &str,
) -> Result<bool, ResolveError> {
    if constraint.trim().is_empty() {
        return Ok(true);
    }

    let expr = interpolate(case, ctx, constraint).await?;
    let vars = case.scalar_vars();
    case.engine()
        .evaluate_bool(&expr, &vars)?
        .ok_or(ResolveError::NotBoolean { expr })
}

async fn resolve_reference(
    case: &mut WfCase,
    ctx: &ResolutionContext,
    r: &Reference,
) -> Result<String, ResolveError> {
    match r.prefix {
        Prefix::JsonPath => resolve_json_path(case, ctx, r),
        Prefix::Header => {
            let value = case.entry(&ctx.entry).and_then(|e| {
                e.headers(ctx.side).and_then(|headers| {
                    headers
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(&r.name))
                        .map(|(_, v)| v.clone())
                })
            });
            Ok(value.unwrap_or_else(|| {
                debug!(entry = %ctx.entry, header = %r.name, "unresolved header reference");
                String::new()
            }))
        }
        Prefix::Param => Ok(lookup_request_map(case, ctx, &r.name, |req| &req.params)),
        Prefix::Query => Ok(lookup_request_map(case, ctx, &r.name, |req| &req.query)),
        Prefix::Var => match case.var(&r.name) {
            Some(VarValue::Scalar(v)) => Ok(value_to_string(v)),
            Some(VarValue::Callable(f)) => Ok(f(&r.args)),
            None => {
                debug!(var = %r.name, "unresolved variable reference");
                Ok(String::new())
            }
        },
        Prefix::Global => {
            let (namespace, name) = r
                .name
                .split_once(':')
                .unwrap_or(("global", r.name.as_str()));
            let default = r.args.first().map(|d| JsonValue::String(d.clone()));
            let value = case.globals().get(namespace, name, default).await?;
            Ok(match value {
                Some(v) => value_to_string(&v),
                None => {
                    debug!(namespace, name, "unresolved global reference");
                    String::new()
                }
            })
        }
        Prefix::Env => Ok(std::env::var(&r.name).unwrap_or_else(|_| {
            debug!(name = %r.name, "unresolved environment reference");
            String::new()
        })),
    }
}

fn resolve_json_path(
    case: &WfCase,
    ctx: &ResolutionContext,
    r: &Reference,
) -> Result<String, ResolveError> {
    let Some(entry) = case.entry(&ctx.entry) else {
        debug!(entry = %ctx.entry, "reference against missing trace entry");
        return Ok(String::new());
    };
    let Some(body) = entry.body(ctx.side) else {
        debug!(entry = %ctx.entry, "reference against entry with no recorded response");
        return Ok(String::new());
    };

    let json: JsonValue =
        serde_json::from_slice(body).map_err(|_| ResolveError::BodyNotJson(ctx.entry.clone()))?;

    let path = JsonPath::parse(&r.name).map_err(|e| ResolveError::JsonPath {
        path: r.name.clone(),
        message: e.to_string(),
    })?;

    let nodes = path.query(&json).all();
    match nodes.first().copied() {
        Some(node) => Ok(value_to_string(node)),
        None => {
            // Key not found is the routine "optional field" case.
            debug!(entry = %ctx.entry, path = %r.name, "json path matched nothing");
            Ok(String::new())
        }
    }
}

fn lookup_request_map<'a>(
    case: &'a WfCase,
    ctx: &ResolutionContext,
    name: &str,
    pick: impl Fn(&'a crate::case::TraceRequest) -> &'a std::collections::BTreeMap<String, String>,
) -> String {
    case.entry(&ctx.entry)
        .and_then(|e| pick(&e.request).get(name).cloned())
        .unwrap_or_else(|| {
            debug!(entry = %ctx.entry, name, "unresolved param reference");
            String::new()
        })
}

pub(crate) fn value_to_string(v: &JsonValue) -> String {
    match v {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_escape(s: &str) -> String {
    let quoted = serde_json::to_string(s).unwrap_or_default();
    quoted
        .strip_prefix('"')
        .and_then(|q| q.strip_suffix('"'))
        .unwrap_or(&quoted)
        .to_string()
}
