use jsontree::Span;
use thiserror::Error;

use crate::path::AxisName;

/// Failure to turn path text into a [`Path`](crate::Path). Spans index into the path text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("{message}")]
    Syntax { message: String, span: Span },
    #[error("unknown axis `{name}`")]
    BadAxisName {
        name: String,
        span: Span,
        suggestion: Option<&'static str>,
    },
    #[error("unsupported node test `{test}`")]
    BadAxisTest { test: String, span: Span },
}

impl PathError {
    pub fn span(&self) -> Span {
        match self {
            PathError::Syntax { span, .. }
            | PathError::BadAxisName { span, .. }
            | PathError::BadAxisTest { span, .. } => *span,
        }
    }
}

/// Failure while evaluating a path. Either one ends the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("the {0} axis is not supported by this tree")]
    UnsupportedAxis(AxisName),
    #[error("query exceeded its limit of {0} evaluation steps")]
    StepLimitExceeded(u64),
}
