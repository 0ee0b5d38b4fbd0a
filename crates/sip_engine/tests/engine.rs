use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::json;
use sip_core::OperationKind;
use sip_engine::{ClientSettings, EngineCommand, EngineEvent, EngineHandle};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn collect_until_end(engine: &EngineHandle) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut events = Vec::new();
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            let done = matches!(
                event,
                EngineEvent::StreamEnded { .. } | EngineEvent::StreamFailed { .. }
            );
            events.push(event);
            if done {
                break;
            }
        }
    }
    events
}

#[test]
fn engine_streams_frames_then_reports_end() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(MockServer::start());
    runtime.block_on(
        Mock::given(method("POST"))
            .and(path("/api/calculate-sip"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "data: {\"type\":\"prompt_generated\"}\ndata: done\n",
                "text/event-stream",
            ))
            .mount(&server),
    );
    let base = Url::parse(&format!("{}/api", server.uri())).unwrap();
    let engine = EngineHandle::new(ClientSettings::new(base), None).unwrap();

    engine.send(EngineCommand::OpenStream {
        operation: OperationKind::SipCalculation,
        run: 7,
        endpoint: "calculate-sip".to_string(),
        payload: json!({}),
    });
    let events = collect_until_end(&engine);

    assert_eq!(
        events,
        vec![
            EngineEvent::StreamFrame {
                operation: OperationKind::SipCalculation,
                run: 7,
                payload: r#"{"type":"prompt_generated"}"#.to_string(),
            },
            EngineEvent::StreamFrame {
                operation: OperationKind::SipCalculation,
                run: 7,
                payload: "done".to_string(),
            },
            EngineEvent::StreamEnded {
                operation: OperationKind::SipCalculation,
                run: 7,
            },
        ]
    );
}

#[test]
fn scheduled_transition_fires_after_delay() {
    let base = Url::parse("http://127.0.0.1:9/api").unwrap();
    let engine = EngineHandle::new(ClientSettings::new(base), None).unwrap();

    engine.send(EngineCommand::ScheduleResultsTransition {
        operation: OperationKind::FundRecommendation,
        delay: Duration::from_millis(20),
    });

    assert_eq!(
        engine.recv_timeout(Duration::from_secs(2)),
        Some(EngineEvent::ResultsDelayElapsed {
            operation: OperationKind::FundRecommendation
        })
    );
}
