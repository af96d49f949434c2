#![forbid(unsafe_code)]

pub mod error;
pub mod expressions;
pub mod parser;
pub mod statements;
pub mod types;
pub mod validate;

pub use crate::error::{ParseError, ValidationError, WeftError};
pub use crate::parser::{parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::statements::{Block, Case, Goto, If, Simple, Statement, StatementError, Switch};
pub use crate::types::OrchestrationDoc;
pub use crate::validate::{validate_document, Validate};
