//! Classification of stream payloads into progress, log and flag changes.
//!
//! Everything here mutates a single [`OperationState`]; consequences that reach
//! beyond the operation (fetching a report, leaving the streaming step,
//! surfacing an error) are returned as [`Signal`]s for `update` to act on.

use engine_logging::engine_debug;
use serde_json::Value;

use crate::report::{extract_report_path, file_name_from_path};
use crate::{
    display_agent_name, EventKind, GeneratedArtifact, LogLevel, OperationState, ProgressRule,
    StreamEvent, StreamProfile, PROGRESS_CEILING,
};

const AGENT_STEP: u8 = 10;
const COMPLETED_STEP: u8 = 5;
const RAW_REPORT_PERCENT: u8 = 90;
const END_OF_STREAM_THRESHOLD: u8 = 90;

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    FetchReport { path: String },
    Completed { result: Option<Value> },
    Failed { message: String },
}

/// Applies one frame payload: a JSON event when it parses, raw text otherwise.
pub fn apply_payload(
    op: &mut OperationState,
    profile: &StreamProfile,
    payload: &str,
    received_at: f64,
) -> Vec<Signal> {
    match StreamEvent::parse(payload) {
        Some(event) => dispatch_event(op, profile, &event, received_at),
        None => apply_raw_text(op, profile, payload, received_at),
    }
}

pub fn dispatch_event(
    op: &mut OperationState,
    profile: &StreamProfile,
    event: &StreamEvent,
    received_at: f64,
) -> Vec<Signal> {
    let at = event.timestamp.unwrap_or(received_at);
    let kind = event.kind(profile.completion_event);
    engine_debug!("{:?} event {:?}", profile.operation, kind);

    match kind {
        EventKind::ConnectionEstablished => {
            op.logs.push(LogLevel::Info, profile.connected_message, at);
            op.progress.set_agent(profile.primary_agent);
            op.progress.set_percent(10);
            Vec::new()
        }
        EventKind::PromptGenerated => {
            op.logs.push(
                LogLevel::Info,
                "Prompt generated, starting agent execution...",
                at,
            );
            op.progress.set_agent(profile.primary_agent);
            op.progress.set_percent(25);
            Vec::new()
        }
        EventKind::FileGenerated => file_generated(op, profile, event, at),
        EventKind::StreamComplete => {
            op.logs.push(LogLevel::Success, profile.completed_message, at);
            op.progress.clear_agent();
            op.progress.set_percent(100);
            op.flag.mark_completed();
            vec![Signal::Completed {
                result: event.data_field("result").cloned(),
            }]
        }
        EventKind::StreamError | EventKind::FatalError => {
            let message = event.error_message();
            op.logs.push(LogLevel::Error, message.clone(), at);
            op.progress.clear_agent();
            op.flag.mark_errored();
            vec![Signal::Failed { message }]
        }
        EventKind::StreamEnd => {
            op.logs.push(LogLevel::Info, "Stream ended", at);
            op.progress.clear_agent();
            Vec::new()
        }
        EventKind::AgentProcessing => {
            if let Some(agent) = event.data_str("agent") {
                op.progress.set_agent(agent);
                op.progress.advance(AGENT_STEP, PROGRESS_CEILING);
                op.logs.push(
                    LogLevel::Info,
                    format!("Processing with {}", display_agent_name(agent)),
                    at,
                );
            }
            Vec::new()
        }
        EventKind::AgentResponse => {
            let message = event.data_str("message").unwrap_or_default().to_string();
            if !message.is_empty() {
                op.logs.push(LogLevel::Info, message.clone(), at);
            }
            apply_agent_table(op, profile, &message);
            Vec::new()
        }
        EventKind::Other => {
            let message = match &event.data {
                Some(Value::Object(map)) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
                Some(Value::String(text)) => text.clone(),
                _ => return Vec::new(),
            };
            if !message.is_empty() {
                op.logs.push(LogLevel::Info, message.clone(), at);
            }
            apply_agent_table(op, profile, &message);
            Vec::new()
        }
    }
}

fn file_generated(
    op: &mut OperationState,
    profile: &StreamProfile,
    event: &StreamEvent,
    at: f64,
) -> Vec<Signal> {
    let path = event
        .data_str_any(&["filepath", "filePath", "file_path"])
        .map(ToOwned::to_owned);
    let name = event
        .data_str_any(&["filename", "fileName", "file_name"])
        .map(ToOwned::to_owned)
        .or_else(|| path.as_deref().map(|p| file_name_from_path(p).to_string()));

    let mut signals = Vec::new();
    if let Some(name) = name {
        op.logs.push(
            LogLevel::Success,
            format!("{}: {}", profile.file_message_prefix, name),
            at,
        );
        let is_html =
            name.ends_with(".html") || path.as_deref().is_some_and(|p| p.ends_with(".html"));
        let artifact = GeneratedArtifact {
            file_name: name,
            file_path: path,
        };
        if is_html {
            op.logs
                .push(LogLevel::Info, "Fetching HTML report for display...", at);
            if let Some(agent) = profile.report_agent {
                op.progress.set_agent(agent);
            }
            signals.push(Signal::FetchReport {
                path: artifact.retrieval_target().to_string(),
            });
        }
        op.artifact = Some(artifact);
    }
    op.progress.set_percent(profile.file_generated_percent);
    signals
}

/// Heuristics for payloads that are not structured events.
///
/// The agent, `completed` and report-name checks are independent; the generic
/// fallback logs text none of them logged.
pub fn apply_raw_text(
    op: &mut OperationState,
    profile: &StreamProfile,
    text: &str,
    received_at: f64,
) -> Vec<Signal> {
    let mut logged = false;
    let mut signals = Vec::new();

    if let Some(agent) = profile.raw_agents.iter().find(|agent| text.contains(**agent)) {
        op.progress.set_agent(*agent);
        op.progress.advance(AGENT_STEP, PROGRESS_CEILING);
        op.logs.push(LogLevel::Info, text, received_at);
        logged = true;
    }

    if text.contains("completed") {
        op.progress.advance(COMPLETED_STEP, PROGRESS_CEILING);
        op.logs.push(LogLevel::Success, text, received_at);
        logged = true;
    }

    if let Some(report_name) = profile.report_file_name.filter(|name| text.contains(*name)) {
        let path = extract_report_path(text, report_name);
        if let Some(path) = &path {
            signals.push(Signal::FetchReport { path: path.clone() });
        }
        // A path recorded earlier survives mentions of the bare name.
        let file_path = path.or_else(|| {
            op.artifact
                .as_ref()
                .and_then(|artifact| artifact.file_path.clone())
        });
        op.artifact = Some(GeneratedArtifact {
            file_name: report_name.to_string(),
            file_path,
        });
        op.progress.set_percent(RAW_REPORT_PERCENT);
        op.logs.push(
            LogLevel::Success,
            format!("Generated {report_name}"),
            received_at,
        );
        logged = true;
    }

    if !logged && text.chars().count() > 3 && !text.starts_with('{') {
        op.logs.push(LogLevel::Info, text, received_at);
    }

    signals
}

/// First case-insensitive match in the profile's agent table wins.
fn apply_agent_table(op: &mut OperationState, profile: &StreamProfile, message: &str) {
    if message.is_empty() {
        return;
    }
    let lowered = message.to_ascii_lowercase();
    let Some(rule) = profile
        .agent_table
        .iter()
        .find(|rule| lowered.contains(&rule.name.to_ascii_lowercase()))
    else {
        return;
    };
    op.progress.set_agent(rule.name);
    match rule.rule {
        ProgressRule::Floor(floor) => op.progress.raise_to(floor),
        ProgressRule::Step(step) => op.progress.advance(step, PROGRESS_CEILING),
    }
}

/// Transport finished without error. A run that got far enough is treated as
/// complete; anything below the threshold stays incomplete.
pub fn apply_stream_end(
    op: &mut OperationState,
    profile: &StreamProfile,
    received_at: f64,
) -> Vec<Signal> {
    if op.flag.completed || op.flag.errored {
        return Vec::new();
    }
    if op.progress.percent() >= END_OF_STREAM_THRESHOLD {
        op.progress.set_percent(100);
        op.progress.clear_agent();
        op.flag.mark_completed();
        op.logs.push(LogLevel::Success, profile.completed_message, received_at);
        return vec![Signal::Completed { result: None }];
    }
    op.logs.push(
        LogLevel::Info,
        format!(
            "Stream ended before completion at {}%",
            op.progress.percent()
        ),
        received_at,
    );
    Vec::new()
}
