use std::sync::LazyLock;

use regex::Regex;

static ENV_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\.\-_:]+$").expect("valid regex"));

/// Reserved option: bind the resolved value to a fresh temporary variable and
/// substitute the variable's name, deferring evaluation into the guard
/// language.
pub const DEFER_BIND_OPTION: &str = "tovar";

/// Where a `{...}` reference resolves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `$.`/`$[` — JSON-path lookup into the bound body.
    JsonPath,
    /// `h:` — header lookup.
    Header,
    /// `p:` — path-param lookup.
    Param,
    /// `q:` — query-param lookup.
    Query,
    /// `v:` — named process variable; callables are invoked with the args.
    Var,
    /// `g:` — process-wide global variable store.
    Global,
    /// No recognized prefix: environment-variable fallback.
    Env,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub prefix: Prefix,
    pub name: String,
    pub args: Vec<String>,
    /// Leading `!`: JSON-escape the substituted value.
    pub escape: bool,
    /// `tovar` option present: substitute a fresh temp-variable name instead
    /// of the value itself.
    pub to_var: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Reference(Reference),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// True when the template carries no references at all.
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }
}

/// Scan a string for `{prefix:name[,opts]}` references.
///
/// A `{` that does not open a well-formed reference is kept as literal text,
/// so JSON payloads embedded in templated strings survive untouched. A `{`
/// that *looks* like a reference but never closes is a hard error.
pub fn scan_template(input: &str) -> Result<Template, TokenError> {
    let mut segments = Vec::new();
    let mut buf = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch != '{' {
            buf.push(ch);
            continue;
        }

        let rest = &input[idx + 1..];
        match rest.find('}') {
            Some(end) => {
                let inner = &rest[..end];
                match parse_reference(inner) {
                    Some(reference) => {
                        if !buf.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut buf)));
                        }
                        segments.push(Segment::Reference(reference));
                        // Skip past the consumed `inner}`.
                        for _ in 0..=inner.chars().count() {
                            chars.next();
                        }
                    }
                    None => buf.push('{'),
                }
            }
            None => {
                if looks_like_reference(rest) {
                    return Err(TokenError::Unclosed(rest.to_string()));
                }
                buf.push('{');
            }
        }
    }

    if !buf.is_empty() {
        segments.push(Segment::Literal(buf));
    }

    Ok(Template { segments })
}

fn looks_like_reference(inner: &str) -> bool {
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    inner.starts_with("$.")
        || inner.starts_with("$[")
        || inner.starts_with("h:")
        || inner.starts_with("p:")
        || inner.starts_with("q:")
        || inner.starts_with("v:")
        || inner.starts_with("g:")
}

fn parse_reference(inner: &str) -> Option<Reference> {
    let (escape, inner) = match inner.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    if inner.starts_with("$.") || inner.starts_with("$[") {
        // JSON paths keep embedded commas; only a trailing option is split off.
        let (path, to_var) = match inner.strip_suffix(&format!(",{DEFER_BIND_OPTION}")) {
            Some(head) => (head, true),
            None => (inner, false),
        };
        return Some(Reference {
            prefix: Prefix::JsonPath,
            name: path.to_string(),
            args: Vec::new(),
            escape,
            to_var,
        });
    }

    let (prefix, rest) = if let Some(rest) = inner.strip_prefix("h:") {
        (Prefix::Header, rest)
    } else if let Some(rest) = inner.strip_prefix("p:") {
        (Prefix::Param, rest)
    } else if let Some(rest) = inner.strip_prefix("q:") {
        (Prefix::Query, rest)
    } else if let Some(rest) = inner.strip_prefix("v:") {
        (Prefix::Var, rest)
    } else if let Some(rest) = inner.strip_prefix("g:") {
        (Prefix::Global, rest)
    } else {
        // Environment fallback only for bare identifier-shaped names.
        let mut parts = inner.split(',');
        let name = parts.next()?.trim();
        if !ENV_NAME_RE.is_match(name) {
            return None;
        }
        let (args, to_var) = collect_args(parts);
        return Some(Reference {
            prefix: Prefix::Env,
            name: name.to_string(),
            args,
            escape,
            to_var,
        });
    };

    let mut parts = rest.split(',');
    let name = parts.next()?.trim();
    if name.is_empty() || !NAME_RE.is_match(name) {
        return None;
    }
    let (args, to_var) = collect_args(parts);

    Some(Reference {
        prefix,
        name: name.to_string(),
        args,
        escape,
        to_var,
    })
}

fn collect_args<'a>(parts: impl Iterator<Item = &'a str>) -> (Vec<String>, bool) {
    let mut args = Vec::new();
    let mut to_var = false;
    for p in parts {
        let p = p.trim();
        if p == DEFER_BIND_OPTION {
            to_var = true;
        } else {
            args.push(p.to_string());
        }
    }
    (args, to_var)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("unclosed reference (missing '}}'): {{{0}")]
    Unclosed(String),
}
