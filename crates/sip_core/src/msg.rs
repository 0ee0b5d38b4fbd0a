use serde_json::Value;

use crate::{FieldSpec, FormConfig, OperationKind, RetrievalOutcome, ValidationOutcome};

/// Inputs to the wizard. Times are seconds since the epoch, supplied by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Driver is ready; the form configuration should be loaded.
    AppStarted,
    FormConfigLoaded(Result<FormConfig, String>),
    /// User edited a field. `goal_type` edits reload the conditional fields.
    FieldChanged { name: String, value: Value },
    ConditionalFieldsLoaded {
        goal_type: String,
        result: Result<Vec<FieldSpec>, String>,
    },
    ValidateClicked,
    ValidationFinished(Result<ValidationOutcome, String>),
    /// User asked for the operation to run; a settled run only navigates.
    RunClicked { operation: OperationKind },
    /// User asked for a fresh run regardless of the previous outcome.
    RegenerateClicked { operation: OperationKind },
    StopClicked { operation: OperationKind, now: f64 },
    /// One `data: ` payload, already stripped and trimmed. `run` is the id
    /// carried by the `OpenStream` effect that started the stream.
    StreamFrame {
        operation: OperationKind,
        run: u64,
        payload: String,
        received_at: f64,
    },
    /// The response body ended without a transport error.
    StreamEnded {
        operation: OperationKind,
        run: u64,
        received_at: f64,
    },
    StreamFailed {
        operation: OperationKind,
        run: u64,
        message: String,
        received_at: f64,
    },
    ReportRetrieved {
        operation: OperationKind,
        path: String,
        outcome: RetrievalOutcome,
        received_at: f64,
    },
    /// The post-completion display delay elapsed.
    ResultsDelayElapsed { operation: OperationKind, now: f64 },
    /// User navigated back to an earlier step.
    StepSelected(crate::WizardStep),
    StartOverClicked,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
