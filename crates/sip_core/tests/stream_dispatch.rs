use std::sync::Once;

use pretty_assertions::assert_eq;
use sip_core::stream::{apply_payload, apply_raw_text, apply_stream_end, Signal};
use sip_core::{CompletionFlag, LogLevel, OperationState, StreamProfile};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn feed(op: &mut OperationState, profile: &StreamProfile, payload: &str) -> Vec<Signal> {
    apply_payload(op, profile, payload, 1_700_000_000.0)
}

fn levels(op: &OperationState) -> Vec<LogLevel> {
    op.logs().entries().iter().map(|entry| entry.level).collect()
}

fn messages(op: &OperationState) -> Vec<String> {
    op.logs()
        .entries()
        .iter()
        .map(|entry| entry.message.clone())
        .collect()
}

#[test]
fn sip_event_sequence_reaches_completion() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    let signals = feed(&mut op, &profile, r#"{"type":"connection_established","timestamp":1}"#);
    assert!(signals.is_empty());
    assert_eq!(op.progress().percent(), 10);
    assert_eq!(op.progress().current_agent(), "SIPGoalPlannerAgent");

    feed(&mut op, &profile, r#"{"type":"prompt_generated","timestamp":2}"#);
    assert_eq!(op.progress().percent(), 25);

    let signals = feed(
        &mut op,
        &profile,
        r#"{"type":"file_generated","data":{"filename":"comprehensive_report.html","filepath":"/media/generated/x/comprehensive_report.html"}}"#,
    );
    assert_eq!(
        signals,
        vec![Signal::FetchReport {
            path: "/media/generated/x/comprehensive_report.html".to_string()
        }]
    );
    assert_eq!(op.progress().percent(), 90);
    let artifact = op.artifact().expect("artifact recorded");
    assert_eq!(artifact.file_name, "comprehensive_report.html");
    assert_eq!(
        artifact.file_path.as_deref(),
        Some("/media/generated/x/comprehensive_report.html")
    );

    let signals = feed(&mut op, &profile, r#"{"type":"stream_complete"}"#);
    assert_eq!(signals, vec![Signal::Completed { result: None }]);
    assert_eq!(op.progress().percent(), 100);
    assert_eq!(op.progress().current_agent(), "");
    assert!(op.flag().completed);
    assert!(!op.flag().errored);
    assert_eq!(
        messages(&op),
        vec![
            "Connection established",
            "Prompt generated, starting agent execution...",
            "Generated file: comprehensive_report.html",
            "Fetching HTML report for display...",
            "Stream completed successfully",
        ]
    );
}

#[test]
fn event_timestamps_drive_log_time() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(
        &mut op,
        &profile,
        r#"{"type":"connection_established","timestamp":3723}"#,
    );

    assert_eq!(op.logs().entries()[0].timestamp, "01:02:03");
}

#[test]
fn raw_line_with_agent_and_completed_fires_both_branches() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    let signals = feed(&mut op, &profile, "RetrieverAgent is now running, task completed");

    assert!(signals.is_empty());
    assert_eq!(op.progress().percent(), 15);
    assert_eq!(op.progress().current_agent(), "RetrieverAgent");
    assert_eq!(levels(&op), vec![LogLevel::Info, LogLevel::Success]);
}

#[test]
fn raw_increments_are_capped_at_ceiling() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    for _ in 0..20 {
        feed(&mut op, &profile, "ThinkerAgent completed a step");
    }

    assert_eq!(op.progress().percent(), 85);
}

#[test]
fn raw_report_name_extracts_path_and_triggers_fetch() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    let signals = apply_raw_text(
        &mut op,
        &profile,
        r"Saved to C:\srv\media\generated\42\comprehensive_report.html",
        10.0,
    );

    assert_eq!(
        signals,
        vec![Signal::FetchReport {
            path: r"media\generated\42\comprehensive_report.html".to_string()
        }]
    );
    assert_eq!(op.progress().percent(), 90);
    assert_eq!(
        messages(&op),
        vec!["Generated comprehensive_report.html".to_string()]
    );
}

#[test]
fn raw_fallback_skips_short_and_json_like_text() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(&mut op, &profile, "ok");
    feed(&mut op, &profile, "{not really json");
    feed(&mut op, &profile, "Collecting market data");

    assert_eq!(messages(&op), vec!["Collecting market data".to_string()]);
    assert_eq!(op.progress().percent(), 0);
}

#[test]
fn json_without_type_is_treated_as_raw_text() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(&mut op, &profile, r#"{"message":"QAAgent completed"}"#);

    // Agent and completed checks fire; the generic fallback does not.
    assert_eq!(op.progress().percent(), 15);
    assert_eq!(op.logs().len(), 2);
}

#[test]
fn agent_response_floors_never_lower_progress() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_response","data":{"message":"FormatterAgent finished layout"}}"#,
    );
    assert_eq!(op.progress().percent(), 75);

    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_response","data":{"message":"RetrieverAgent fetched data"}}"#,
    );
    assert_eq!(op.progress().percent(), 75);
    assert_eq!(op.progress().current_agent(), "RetrieverAgent");
}

#[test]
fn agent_table_first_match_wins() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_response","data":{"message":"sipgoalplanneragent is running"}}"#,
    );

    assert_eq!(op.progress().current_agent(), "PlannerAgent");
    assert_eq!(op.progress().percent(), 40);
}

#[test]
fn unknown_event_logs_mapping_and_applies_floor() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_update","data":{"message":"QAAgent reviewing"}}"#,
    );
    feed(&mut op, &profile, r#"{"type":"heartbeat","data":{"seq":1}}"#);
    feed(&mut op, &profile, r#"{"type":"heartbeat"}"#);

    assert_eq!(
        messages(&op),
        vec!["QAAgent reviewing".to_string(), r#"{"seq":1}"#.to_string()]
    );
    assert_eq!(op.progress().percent(), 70);
}

#[test]
fn agent_processing_advances_once_per_frame() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();

    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_processing","data":{"agent":"ThinkerAgent"}}"#,
    );
    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_processing","data":{"agent":"QAAgent"}}"#,
    );

    assert_eq!(op.progress().percent(), 20);
    assert_eq!(
        messages(&op),
        vec!["Processing with Thinker Agent", "Processing with QA Agent"]
    );
}

#[test]
fn stream_error_marks_errored_and_signals_failure() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();
    feed(&mut op, &profile, r#"{"type":"connection_established"}"#);

    let signals = feed(
        &mut op,
        &profile,
        r#"{"type":"fatal_error","data":{"error":"model unavailable"}}"#,
    );

    assert_eq!(
        signals,
        vec![Signal::Failed {
            message: "model unavailable".to_string()
        }]
    );
    assert!(op.flag().errored);
    assert!(!op.flag().completed);
    assert_eq!(op.progress().current_agent(), "");
    assert_eq!(op.logs().last().map(|entry| entry.level), Some(LogLevel::Error));
}

#[test]
fn stream_end_event_does_not_touch_flag() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();
    feed(&mut op, &profile, r#"{"type":"connection_established"}"#);

    feed(&mut op, &profile, r#"{"type":"stream_end"}"#);

    assert_eq!(op.flag(), CompletionFlag::default());
    assert_eq!(op.progress().current_agent(), "");
    assert_eq!(op.progress().percent(), 10);
}

#[test]
fn transport_end_completes_runs_past_ninety() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();
    feed(
        &mut op,
        &profile,
        r#"{"type":"file_generated","data":{"filename":"summary.json"}}"#,
    );

    let signals = apply_stream_end(&mut op, &profile, 5.0);

    assert_eq!(signals, vec![Signal::Completed { result: None }]);
    assert_eq!(op.progress().percent(), 100);
    assert!(op.flag().completed);
}

#[test]
fn transport_end_below_ninety_leaves_run_incomplete() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();
    feed(&mut op, &profile, r#"{"type":"prompt_generated"}"#);

    let signals = apply_stream_end(&mut op, &profile, 5.0);

    assert!(signals.is_empty());
    assert_eq!(op.progress().percent(), 25);
    assert_eq!(op.flag(), CompletionFlag::default());
    assert_eq!(
        op.logs().last().map(|entry| entry.message.as_str()),
        Some("Stream ended before completion at 25%")
    );
}

#[test]
fn transport_end_after_completion_is_ignored() {
    init_logging();
    let profile = StreamProfile::sip_calculation();
    let mut op = OperationState::default();
    feed(&mut op, &profile, r#"{"type":"stream_complete"}"#);
    let logged = op.logs().len();

    assert!(apply_stream_end(&mut op, &profile, 5.0).is_empty());
    assert_eq!(op.logs().len(), logged);
}

#[test]
fn fund_profile_uses_its_own_vocabulary() {
    init_logging();
    let profile = StreamProfile::fund_recommendation();
    let mut op = OperationState::default();

    feed(&mut op, &profile, r#"{"type":"connection_established"}"#);
    assert_eq!(op.progress().current_agent(), "FundRecommendationOrchestrator");

    feed(
        &mut op,
        &profile,
        r#"{"type":"agent_response","data":{"message":"FundRecommendationAgent shortlisted funds"}}"#,
    );
    assert_eq!(op.progress().percent(), 15);

    let signals = feed(
        &mut op,
        &profile,
        r#"{"type":"file_generated","data":{"fileName":"funds.html","filePath":"media/generated/7/funds.html"}}"#,
    );
    assert_eq!(
        signals,
        vec![Signal::FetchReport {
            path: "media/generated/7/funds.html".to_string()
        }]
    );
    assert_eq!(op.progress().percent(), 95);

    let signals = feed(
        &mut op,
        &profile,
        r#"{"type":"stream_complete","data":{"result":{"funds":["A","B"]}}}"#,
    );
    assert_eq!(
        signals,
        vec![Signal::Completed {
            result: Some(serde_json::json!({"funds": ["A", "B"]}))
        }]
    );
    assert_eq!(
        op.logs().last().map(|entry| entry.message.as_str()),
        Some("Fund recommendation completed successfully")
    );
}

#[test]
fn fund_raw_text_ignores_calculation_report_name() {
    init_logging();
    let profile = StreamProfile::fund_recommendation();
    let mut op = OperationState::default();

    let signals = feed(
        &mut op,
        &profile,
        "reading media/generated/1/comprehensive_report.html",
    );

    assert!(signals.is_empty());
    assert!(op.artifact().is_none());
    assert_eq!(op.progress().percent(), 0);
}
