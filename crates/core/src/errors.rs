use thiserror::Error;

/// The only failure text a caller ever sees. Diagnostic detail stays in the
/// audit trail and the logs.
pub const GENERIC_FAILURE_TEXT: &str =
    "We're experiencing a temporary issue, please try again.";

/// Failures raised inside a handler stage.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("ticket repository unavailable: {0}")]
    DatabaseUnavailable(String),
    #[error("upstream call exceeded its deadline: {0}")]
    Timeout(String),
    #[error("no ticket id token found in message text")]
    TicketIdNotFound,
    #[error("model capability failure: {0}")]
    ModelUnavailable(String),
}

impl HandlerError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DatabaseUnavailable(_) => "database_unavailable",
            Self::Timeout(_) => "timeout",
            Self::TicketIdNotFound => "ticket_id_not_found",
            Self::ModelUnavailable(_) => "model_unavailable",
        }
    }
}

/// Terminal error taxonomy for one `process` call. Every variant is caught at
/// the orchestrator boundary and converted into a graceful failure response;
/// none propagate to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("classification failed: {0}")]
    Classification(String),
    #[error("routing failed: {0}")]
    Routing(String),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ProcessError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Classification(_) => "classification_error",
            Self::Routing(_) => "routing_error",
            Self::Handler(inner) => inner.kind(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_TEXT
    }
}

#[cfg(test)]
mod tests {
    use super::{HandlerError, ProcessError, GENERIC_FAILURE_TEXT};

    #[test]
    fn every_kind_maps_to_the_generic_user_message() {
        let errors = [
            ProcessError::Classification("parse failure".to_owned()),
            ProcessError::Routing("no handler".to_owned()),
            ProcessError::Handler(HandlerError::TicketIdNotFound),
            ProcessError::Handler(HandlerError::DatabaseUnavailable("pool closed".to_owned())),
        ];

        for error in errors {
            assert_eq!(error.user_message(), GENERIC_FAILURE_TEXT);
        }
    }

    #[test]
    fn display_keeps_diagnostic_detail_for_the_audit_trail() {
        let error =
            ProcessError::Handler(HandlerError::DatabaseUnavailable("pool closed".to_owned()));
        assert!(error.to_string().contains("pool closed"));
        assert_eq!(error.kind(), "database_unavailable");
    }
}
