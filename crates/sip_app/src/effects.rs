//! Translation between core effects/messages and engine commands/events.

use sip_core::{Effect, Msg};
use sip_engine::{EngineCommand, EngineEvent};

pub(crate) fn command_for(effect: Effect) -> EngineCommand {
    match effect {
        Effect::LoadFormConfig => EngineCommand::LoadFormConfig,
        Effect::LoadConditionalFields { goal_type } => {
            EngineCommand::LoadConditionalFields { goal_type }
        }
        Effect::SubmitValidation { form } => EngineCommand::Validate { form },
        Effect::OpenStream {
            operation,
            run,
            endpoint,
            payload,
        } => EngineCommand::OpenStream {
            operation,
            run,
            endpoint,
            payload,
        },
        Effect::CancelStream { operation } => EngineCommand::CancelStream { operation },
        Effect::FetchReport { operation, path } => EngineCommand::FetchReport { operation, path },
        Effect::ScheduleResultsTransition { operation, delay } => {
            EngineCommand::ScheduleResultsTransition { operation, delay }
        }
    }
}

/// Engine events become messages stamped with the driver's receipt time.
pub(crate) fn msg_for(event: EngineEvent, now: f64) -> Msg {
    match event {
        EngineEvent::FormConfigLoaded(result) => {
            Msg::FormConfigLoaded(result.map_err(|err| err.to_string()))
        }
        EngineEvent::ConditionalFieldsLoaded { goal_type, result } => {
            Msg::ConditionalFieldsLoaded {
                goal_type,
                result: result.map_err(|err| err.to_string()),
            }
        }
        EngineEvent::ValidationFinished(result) => {
            Msg::ValidationFinished(result.map_err(|err| err.to_string()))
        }
        EngineEvent::StreamFrame {
            operation,
            run,
            payload,
        } => Msg::StreamFrame {
            operation,
            run,
            payload,
            received_at: now,
        },
        EngineEvent::StreamEnded { operation, run } => Msg::StreamEnded {
            operation,
            run,
            received_at: now,
        },
        EngineEvent::StreamFailed {
            operation,
            run,
            error,
        } => Msg::StreamFailed {
            operation,
            run,
            message: error.to_string(),
            received_at: now,
        },
        EngineEvent::ReportRetrieved {
            operation,
            path,
            outcome,
        } => Msg::ReportRetrieved {
            operation,
            path,
            outcome,
            received_at: now,
        },
        EngineEvent::ResultsDelayElapsed { operation } => {
            Msg::ResultsDelayElapsed { operation, now }
        }
    }
}
