//! SIP planner core: pure wizard state machine, stream classification and
//! view-model helpers.
mod auth;
mod effect;
mod event;
mod form;
mod frame;
mod log_book;
mod msg;
mod operation;
mod profile;
mod progress;
pub mod report;
mod state;
pub mod stream;
mod update;
mod view_model;

pub use auth::{
    decode_token, encode_token, AuthError, AuthGate, Claims, DemoUser, IssuedSession,
    MemorySessionStore, SessionStore, SessionUser, AUTH_EXP_KEY, AUTH_TOKEN_KEY,
    FORM_CONFIG_CACHE_KEY, SESSION_MINUTES,
};
pub use effect::Effect;
pub use event::{EventKind, StreamEvent};
pub use form::{
    is_blank, missing_required_fields, FieldOption, FieldSpec, FormConfig, FormData, FormFields,
    ValidationOutcome, GOAL_TYPE_FIELD,
};
pub use frame::{frame_payload, FrameDecoder, DATA_MARKER};
pub use log_book::{display_time, LogBook, LogEntry, LogLevel};
pub use msg::Msg;
pub use operation::{
    CompletionFlag, GeneratedArtifact, OperationKind, OperationState, ReportDocument,
    RetrievalMethod, RetrievalOutcome, RetrievedReport, StrategyFailure,
};
pub use profile::{display_agent_name, AgentRule, ProgressRule, StreamProfile};
pub use progress::{ProgressState, PROGRESS_CEILING};
pub use state::{initial_form_data, CalculationSummary, WizardState, WizardStep};
pub use update::{update, RESULTS_TRANSITION_DELAY};
pub use view_model::{FieldView, OperationView, WizardViewModel};
