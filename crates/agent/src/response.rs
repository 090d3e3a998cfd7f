use crate::agent_loop::AgentOutcome;
use defraud_core::{DefraudError, Result, SourceRef};
use serde::Serialize;

/// What the query interface returns: a verdict, or a failure naming its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryResponse {
    Verdict {
        verdict: String,
        sources: Vec<SourceRef>,
    },
    Failure {
        kind: String,
        message: String,
    },
}

impl QueryResponse {
    pub fn verdict(verdict: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        QueryResponse::Verdict {
            verdict: verdict.into(),
            sources,
        }
    }

    pub fn failure(err: &DefraudError) -> Self {
        QueryResponse::Failure {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn from_outcome(result: Result<AgentOutcome>) -> Self {
        match result {
            Ok(outcome) => QueryResponse::verdict(outcome.answer, outcome.sources),
            Err(err) => QueryResponse::failure(&err),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, QueryResponse::Failure { .. })
    }
}
