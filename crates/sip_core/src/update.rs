use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use serde_json::{json, Value};

use crate::report::{append_path_footer, placeholder_report};
use crate::state::initial_form_data;
use crate::stream::{self, Signal};
use crate::{
    is_blank, missing_required_fields, CalculationSummary, Effect, FieldSpec, FormConfig,
    LogLevel, Msg, OperationKind, ReportDocument, RetrievalMethod, RetrievalOutcome,
    StreamProfile, ValidationOutcome, WizardState, WizardStep, GOAL_TYPE_FIELD,
};

/// Pause between a completed run and the switch to its results step.
pub const RESULTS_TRANSITION_DELAY: Duration = Duration::from_secs(2);

const CONFIG_LOAD_ERROR: &str =
    "Failed to load form configuration. Please check if the API is running.";
const CONDITIONAL_LOAD_ERROR: &str = "Failed to load goal-specific fields";
const INCOMPLETE_FORM_ERROR: &str = "Please fill in all required fields";
const RETRIEVAL_EXHAUSTED_ERROR: &str =
    "Error in processing - File not found. Please regenerate the report.";
const MISSING_REPORT_ERROR: &str =
    "No calculation report available. Please run the SIP calculation first.";
const NOT_VALIDATED_ERROR: &str = "Please validate the form before calculating";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: WizardState, msg: Msg) -> (WizardState, Vec<Effect>) {
    let effects = match msg {
        Msg::AppStarted => {
            if state.form_config.is_some() {
                return (state, Vec::new());
            }
            state.config_loading = true;
            state.mark_dirty();
            vec![Effect::LoadFormConfig]
        }
        Msg::FormConfigLoaded(result) => {
            state.config_loading = false;
            match result {
                Ok(config) => {
                    engine_info!("Form configuration loaded: {}", config.title);
                    state.form_config = Some(config);
                    state.general_error = None;
                }
                Err(message) => {
                    engine_warn!("Form configuration failed to load: {message}");
                    state.general_error = Some(CONFIG_LOAD_ERROR.to_string());
                }
            }
            state.mark_dirty();
            Vec::new()
        }
        Msg::FieldChanged { name, value } => field_changed(&mut state, name, value),
        Msg::ConditionalFieldsLoaded { goal_type, result } => {
            conditional_fields_loaded(&mut state, &goal_type, result);
            Vec::new()
        }
        Msg::ValidateClicked => validate_clicked(&mut state),
        Msg::ValidationFinished(result) => {
            validation_finished(&mut state, result);
            Vec::new()
        }
        Msg::RunClicked { operation } => run_clicked(&mut state, operation),
        Msg::RegenerateClicked { operation } => {
            let mut effects = Vec::new();
            let op = state.operation_mut(operation);
            if op.streaming {
                op.streaming = false;
                effects.push(Effect::CancelStream { operation });
            }
            op.flag.reset();
            engine_info!("{} regenerate requested", operation.label());
            effects.extend(run_clicked(&mut state, operation));
            effects
        }
        Msg::StopClicked { operation, now } => {
            let profile = StreamProfile::for_operation(operation);
            let op = state.operation_mut(operation);
            if !op.streaming {
                return (state, Vec::new());
            }
            op.streaming = false;
            op.logs.push(LogLevel::Warning, profile.stopped_message, now);
            state.mark_dirty();
            vec![Effect::CancelStream { operation }]
        }
        Msg::StreamFrame {
            operation,
            run,
            payload,
            received_at,
        } => {
            let profile = StreamProfile::for_operation(operation);
            let op = state.operation_mut(operation);
            if !op.accepts(run) {
                return (state, Vec::new());
            }
            let signals = stream::apply_payload(op, &profile, &payload, received_at);
            state.mark_dirty();
            handle_signals(&mut state, &profile, signals, received_at)
        }
        Msg::StreamEnded {
            operation,
            run,
            received_at,
        } => {
            let profile = StreamProfile::for_operation(operation);
            let op = state.operation_mut(operation);
            if !op.accepts(run) {
                return (state, Vec::new());
            }
            op.streaming = false;
            let signals = stream::apply_stream_end(op, &profile, received_at);
            state.mark_dirty();
            handle_signals(&mut state, &profile, signals, received_at)
        }
        Msg::StreamFailed {
            operation,
            run,
            message,
            received_at,
        } => {
            let op = state.operation_mut(operation);
            if !op.accepts(run) {
                return (state, Vec::new());
            }
            op.streaming = false;
            op.logs.push(LogLevel::Error, message.clone(), received_at);
            op.progress.clear_agent();
            op.flag.mark_errored();
            engine_warn!("{} stream failed: {message}", operation.label());
            state.general_error = Some(format!("{} failed: {message}", operation.label()));
            state.mark_dirty();
            Vec::new()
        }
        Msg::ReportRetrieved {
            operation,
            path,
            outcome,
            received_at,
        } => {
            report_retrieved(&mut state, operation, &path, outcome, received_at);
            Vec::new()
        }
        Msg::ResultsDelayElapsed { operation, now } => {
            let profile = StreamProfile::for_operation(operation);
            let settled = state.operation(operation).flag.is_settled();
            if settled && state.step == profile.streaming_step {
                state.step = profile.results_step;
                state
                    .operation_mut(operation)
                    .logs
                    .push(LogLevel::Info, profile.redirect_message, now);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StepSelected(step) => {
            if step_reachable(&state, step) && state.step != step {
                state.step = step;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StartOverClicked => {
            let effects = [OperationKind::SipCalculation, OperationKind::FundRecommendation]
                .into_iter()
                .filter(|kind| state.operation(*kind).streaming)
                .map(|operation| Effect::CancelStream { operation })
                .collect();
            let form_config = state.form_config.take();
            state = WizardState {
                form_config,
                last_run: state.last_run,
                ..WizardState::default()
            };
            state.mark_dirty();
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn field_changed(state: &mut WizardState, name: String, value: Value) -> Vec<Effect> {
    let is_goal = name == GOAL_TYPE_FIELD;
    let previous = state.form_data.insert(name, value.clone());
    state.mark_dirty();
    if !is_goal || previous.as_ref() == Some(&value) {
        return Vec::new();
    }

    let goal = match &value {
        Value::String(text) => text.trim().to_string(),
        other => other.to_string(),
    };
    if is_blank(Some(&value)) || state.form_config.is_none() {
        clear_conditional_values(state);
        state.conditional_fields.clear();
        state.conditional_goal = None;
        return Vec::new();
    }
    state.conditional_goal = Some(goal.clone());
    state.config_loading = true;
    vec![Effect::LoadConditionalFields { goal_type: goal }]
}

fn conditional_fields_loaded(
    state: &mut WizardState,
    goal_type: &str,
    result: Result<Vec<FieldSpec>, String>,
) {
    if state.conditional_goal.as_deref() != Some(goal_type) {
        return;
    }
    state.config_loading = false;
    match result {
        Ok(fields) => {
            clear_conditional_values(state);
            state.conditional_fields = fields;
            state.validation = None;
            state.summary = None;
            state.step = WizardStep::Form;
            state.general_error = None;
            engine_info!("Loaded conditional fields for {goal_type}");
        }
        Err(message) => {
            engine_warn!("Conditional fields for {goal_type} failed to load: {message}");
            state.general_error = Some(CONDITIONAL_LOAD_ERROR.to_string());
        }
    }
    state.mark_dirty();
}

fn clear_conditional_values(state: &mut WizardState) {
    for field in &state.conditional_fields {
        state.form_data.remove(&field.name);
    }
}

fn validate_clicked(state: &mut WizardState) -> Vec<Effect> {
    state.mark_dirty();
    let complete = state
        .form_config
        .as_ref()
        .is_some_and(|config: &FormConfig| {
            missing_required_fields(config, &state.conditional_fields, &state.form_data)
                .is_empty()
        });
    if !complete {
        state.general_error = Some(INCOMPLETE_FORM_ERROR.to_string());
        return Vec::new();
    }
    state.general_error = None;
    state.validating = true;
    vec![Effect::SubmitValidation {
        form: state.form_data.clone(),
    }]
}

fn validation_finished(state: &mut WizardState, result: Result<ValidationOutcome, String>) {
    state.validating = false;
    match result {
        Ok(outcome) if outcome.valid => {
            engine_info!("Form validation successful");
            state.validation = Some(outcome);
            state.step = WizardStep::Validation;
        }
        Ok(outcome) => {
            state.general_error = Some(if outcome.message.is_empty() {
                "Validation failed".to_string()
            } else {
                outcome.message
            });
        }
        Err(message) => {
            state.general_error = Some(format!("Validation failed: {message}"));
        }
    }
    state.mark_dirty();
}

fn run_clicked(state: &mut WizardState, operation: OperationKind) -> Vec<Effect> {
    let profile = StreamProfile::for_operation(operation);
    state.mark_dirty();

    let op = state.operation(operation);
    let (settled, streaming) = (op.flag.is_settled(), op.streaming);
    if settled {
        engine_info!(
            "{} already completed, showing previous results",
            operation.label()
        );
        state.step = profile.results_step;
        return Vec::new();
    }
    if streaming {
        return Vec::new();
    }

    let payload = match operation {
        OperationKind::SipCalculation => {
            if state.validation.is_none() {
                state.general_error = Some(NOT_VALIDATED_ERROR.to_string());
                return Vec::new();
            }
            Value::Object(state.form_data.clone())
        }
        OperationKind::FundRecommendation => {
            let Some(report_path) = state.report_path_for_recommendation.clone() else {
                state.general_error = Some(MISSING_REPORT_ERROR.to_string());
                return Vec::new();
            };
            json!({
                "report_file_path": report_path,
                "form_data": Value::Object(state.form_data.clone()),
            })
        }
    };

    state.last_run += 1;
    let run = state.last_run;
    state.operation_mut(operation).reset_for_run(run);
    state.step = profile.streaming_step;
    state.general_error = None;
    engine_info!("{} started against /{}", operation.label(), profile.endpoint);
    vec![Effect::OpenStream {
        operation,
        run,
        endpoint: profile.endpoint.to_string(),
        payload,
    }]
}

fn handle_signals(
    state: &mut WizardState,
    profile: &StreamProfile,
    signals: Vec<Signal>,
    at: f64,
) -> Vec<Effect> {
    let operation = profile.operation;
    let mut effects = Vec::new();
    for signal in signals {
        match signal {
            Signal::FetchReport { path } => {
                state
                    .operation_mut(operation)
                    .logs
                    .push(LogLevel::Info, format!("Loading HTML report from: {path}"), at);
                if operation == OperationKind::SipCalculation {
                    state.report_path_for_recommendation = Some(path.clone());
                }
                effects.push(Effect::FetchReport { operation, path });
            }
            Signal::Completed { result } => {
                match operation {
                    OperationKind::SipCalculation => {
                        state.summary = Some(CalculationSummary {
                            time_horizon_years: state
                                .validation
                                .as_ref()
                                .and_then(|v| v.time_horizon_years),
                            total_months: state.validation.as_ref().and_then(|v| v.total_months),
                            report_path: state.report_path_for_recommendation.clone(),
                        });
                        if let Some(result) = result {
                            state.calculation.result = Some(result);
                        }
                    }
                    OperationKind::FundRecommendation => {
                        state.recommendation.result = result;
                    }
                }
                effects.push(Effect::ScheduleResultsTransition {
                    operation,
                    delay: RESULTS_TRANSITION_DELAY,
                });
            }
            Signal::Failed { message } => {
                state.general_error = Some(format!("{} failed: {message}", operation.label()));
            }
        }
    }
    effects
}

fn report_label(operation: OperationKind) -> &'static str {
    match operation {
        OperationKind::SipCalculation => "HTML report",
        OperationKind::FundRecommendation => "Fund Recommendation HTML report",
    }
}

fn report_retrieved(
    state: &mut WizardState,
    operation: OperationKind,
    path: &str,
    outcome: RetrievalOutcome,
    at: f64,
) {
    let current = state
        .operation(operation)
        .artifact
        .as_ref()
        .map(|artifact| artifact.retrieval_target() == path)
        .unwrap_or(false);
    if !current {
        engine_warn!("Ignoring stale report for {path}");
        return;
    }
    state.mark_dirty();

    let RetrievalOutcome { failures, retrieved } = outcome;
    match retrieved {
        Some(report) => {
            let op = state.operation_mut(operation);
            for failure in &failures {
                op.logs.push(
                    LogLevel::Warning,
                    format!("{} retrieval failed: {}", failure.method, failure.message),
                    at,
                );
            }
            op.logs.push(
                LogLevel::Success,
                format!(
                    "{} ready for display (loaded via: {})",
                    report_label(operation),
                    report.method
                ),
                at,
            );
            op.report = Some(ReportDocument {
                content: append_path_footer(&report.content, path, at),
                path: path.to_string(),
                method: report.method,
            });
            if let Some(artifact) = op.artifact.as_mut() {
                artifact.file_path.get_or_insert_with(|| path.to_string());
            }
            if operation == OperationKind::SipCalculation {
                state.report_path_for_recommendation = Some(path.to_string());
                if let Some(summary) = state.summary.as_mut() {
                    summary.report_path = Some(path.to_string());
                }
            }
        }
        None => {
            let diagnostic = failures
                .iter()
                .map(|failure| format!("{}({})", failure.method.tag(), failure.message))
                .collect::<Vec<_>>()
                .join(", ");
            let content = placeholder_report(
                operation,
                &state.form_data,
                state.validation.as_ref(),
                path,
            );
            let op = state.operation_mut(operation);
            op.logs.push(
                LogLevel::Error,
                format!("All methods failed: {diagnostic}"),
                at,
            );
            op.logs.push(
                LogLevel::Info,
                "Using placeholder report as final fallback",
                at,
            );
            op.flag.mark_errored();
            op.report = Some(ReportDocument {
                content,
                path: path.to_string(),
                method: RetrievalMethod::Placeholder,
            });
            engine_warn!("{} report retrieval exhausted for {path}", operation.label());
            state.general_error = Some(RETRIEVAL_EXHAUSTED_ERROR.to_string());
        }
    }
}

fn step_reachable(state: &WizardState, step: WizardStep) -> bool {
    match step {
        WizardStep::Form => true,
        WizardStep::Validation => state.validation.is_some(),
        WizardStep::Streaming => {
            state.calculation.streaming || !state.calculation.logs.is_empty()
        }
        WizardStep::Results => state.calculation.flag.completed,
        WizardStep::FundRecommendation => {
            state.recommendation.streaming || !state.recommendation.logs.is_empty()
        }
        WizardStep::FundRecommendationResult => state.recommendation.flag.completed,
    }
}
