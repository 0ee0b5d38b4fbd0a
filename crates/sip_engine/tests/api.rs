use pretty_assertions::assert_eq;
use serde_json::json;
use sip_core::FormData;
use sip_engine::api::{load_conditional_fields, load_form_config, validate_form};
use sip_engine::{ApiClient, ClientSettings, FailureKind};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let base = Url::parse(&format!("{}/api/", server.uri())).unwrap();
    ApiClient::new(ClientSettings::new(base)).unwrap()
}

#[tokio::test]
async fn form_config_is_unwrapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/form-config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "formConfig": {
                "title": "SIP Goal Planning",
                "fields": {"always_required": [
                    {"name": "goal_type", "label": "Goal", "type": "select", "required": true,
                     "options": [{"value": "retirement", "label": "Retirement"}]}
                ]}
            }
        })))
        .mount(&server)
        .await;

    let config = load_form_config(&client_for(&server)).await.expect("config");

    assert_eq!(config.title, "SIP Goal Planning");
    assert_eq!(config.fields.always_required.len(), 1);
    assert_eq!(config.fields.always_required[0].options[0].value, "retirement");
}

#[tokio::test]
async fn conditional_fields_use_goal_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/form-config/child%20education"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conditional_fields": [
                {"name": "child_age", "label": "Child Age", "type": "number", "required": true}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/form-config/other"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let fields = load_conditional_fields(&client, "child education")
        .await
        .expect("fields");
    assert_eq!(fields[0].name, "child_age");
    assert!(fields[0].is_numeric());

    let none = load_conditional_fields(&client, "other").await.expect("fields");
    assert!(none.is_empty());
}

#[tokio::test]
async fn validation_error_prefers_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/validate-form"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({"detail": "current_age is required"})),
        )
        .mount(&server)
        .await;

    let err = validate_form(&client_for(&server), &FormData::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(422));
    assert_eq!(err.message, "current_age is required");
}

#[tokio::test]
async fn validation_outcome_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/validate-form"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "message": "Form is valid",
            "time_horizon_years": 25,
            "total_months": 300
        })))
        .mount(&server)
        .await;

    let mut form = FormData::new();
    form.insert("goal_type".into(), json!("retirement"));
    let outcome = validate_form(&client_for(&server), &form).await.expect("ok");

    assert!(outcome.valid);
    assert_eq!(outcome.total_months, Some(300));
}
