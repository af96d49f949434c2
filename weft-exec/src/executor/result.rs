use crate::resolver::ResolveError;

/// Machine codes for the executor's own failure modes.
pub const CODE_AMBIGUOUS_GUARD: &str = "WFG-AMBIG";
pub const CODE_NO_TRUE_GUARD: &str = "WFG-NOMATCH";
pub const CODE_RESOLVE: &str = "WFG-RESOLVE";
pub const CODE_BOUNDARY: &str = "WFG-BOUNDARY";
pub const CODE_HOP_BUDGET: &str = "WFG-HOPS";
pub const CODE_UNKNOWN_ACTIVITY: &str = "WFG-UNKNOWN";
pub const CODE_BACKEND: &str = "WFG-BACKEND";
pub const CODE_DEADLINE: &str = "WfCaseDeadlineExceeded";

/// The uniform caller-facing error shape. Activities translate backend
/// failures into this before returning, so the terminal response can render
/// one structure regardless of which collaborator failed. `ambit` tags the
/// offending activity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code} [{ambit}]: {message}")]
pub struct EngineError {
    pub status: u16,
    pub ambit: String,
    pub code: String,
    pub message: String,
}

impl EngineError {
    pub fn server(
        ambit: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status: 500,
            ambit: ambit.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_gateway(ambit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: 502,
            ambit: ambit.into(),
            code: CODE_BACKEND.to_string(),
            message: message.into(),
        }
    }

    pub fn deadline(ambit: impl Into<String>) -> Self {
        Self {
            status: 504,
            ambit: ambit.into(),
            code: CODE_DEADLINE.to_string(),
            message: "projected completion exceeds the case deadline".to_string(),
        }
    }

    pub fn ambiguous_guard(ambit: impl Into<String>) -> Self {
        Self::server(
            ambit,
            CODE_AMBIGUOUS_GUARD,
            "more than one expression evaluates to true",
        )
    }

    pub fn no_true_guard(ambit: impl Into<String>) -> Self {
        Self::server(ambit, CODE_NO_TRUE_GUARD, "no expression evaluates to true")
    }

    pub fn resolve(ambit: impl Into<String>, e: ResolveError) -> Self {
        Self::server(ambit, CODE_RESOLVE, e.to_string())
    }

    /// Structured body the terminal response activity renders for failures.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "ambit": self.ambit,
            "code": self.code,
            "message": self.message,
        })
    }
}
