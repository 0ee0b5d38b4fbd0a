use std::fmt;
use std::time::Duration;

use serde_json::Value;
use sip_core::{
    FieldSpec, FormConfig, FormData, OperationKind, RetrievalOutcome, ValidationOutcome,
};

/// Work the driver hands to the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    LoadFormConfig,
    LoadConditionalFields { goal_type: String },
    Validate { form: FormData },
    /// `run` is echoed on every stream event so the driver can drop leftovers
    /// of a replaced stream.
    OpenStream {
        operation: OperationKind,
        run: u64,
        endpoint: String,
        payload: Value,
    },
    CancelStream { operation: OperationKind },
    FetchReport { operation: OperationKind, path: String },
    ScheduleResultsTransition {
        operation: OperationKind,
        delay: Duration,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    FormConfigLoaded(Result<FormConfig, FetchError>),
    ConditionalFieldsLoaded {
        goal_type: String,
        result: Result<Vec<FieldSpec>, FetchError>,
    },
    ValidationFinished(Result<ValidationOutcome, FetchError>),
    StreamFrame {
        operation: OperationKind,
        run: u64,
        payload: String,
    },
    StreamEnded {
        operation: OperationKind,
        run: u64,
    },
    StreamFailed {
        operation: OperationKind,
        run: u64,
        error: FetchError,
    },
    ReportRetrieved {
        operation: OperationKind,
        path: String,
        outcome: RetrievalOutcome,
    },
    ResultsDelayElapsed { operation: OperationKind },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    InvalidResponse,
    Unavailable,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Unavailable => write!(f, "unavailable"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
