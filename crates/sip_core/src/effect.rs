use std::time::Duration;

use serde_json::Value;

use crate::{FormData, OperationKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadFormConfig,
    LoadConditionalFields { goal_type: String },
    SubmitValidation { form: FormData },
    /// POST `payload` to `endpoint` and stream the response back as frames.
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
