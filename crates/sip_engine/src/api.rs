//! Form configuration and validation endpoints.

use serde::Deserialize;
use serde_json::Value;
use sip_core::{FieldSpec, FormConfig, FormData, ValidationOutcome};

use crate::{ApiClient, FetchError};

#[derive(Debug, Deserialize)]
struct FormConfigEnvelope {
    #[serde(rename = "formConfig")]
    form_config: FormConfig,
}

#[derive(Debug, Deserialize)]
struct ConditionalFieldsEnvelope {
    #[serde(default)]
    conditional_fields: Vec<FieldSpec>,
}

/// `GET /form-config`.
pub async fn load_form_config(client: &ApiClient) -> Result<FormConfig, FetchError> {
    let url = client.endpoint_url("form-config")?;
    let envelope: FormConfigEnvelope = client.get_json(url).await?;
    Ok(envelope.form_config)
}

/// `GET /form-config/{goal_type}`; a missing list means no extra fields.
pub async fn load_conditional_fields(
    client: &ApiClient,
    goal_type: &str,
) -> Result<Vec<FieldSpec>, FetchError> {
    let url = client.endpoint_url_with_segment("form-config", goal_type)?;
    let envelope: ConditionalFieldsEnvelope = client.get_json(url).await?;
    Ok(envelope.conditional_fields)
}

/// `POST /validate-form` with the collected fields as the body.
pub async fn validate_form(
    client: &ApiClient,
    form: &FormData,
) -> Result<ValidationOutcome, FetchError> {
    let url = client.endpoint_url("validate-form")?;
    client.post_json(url, &Value::Object(form.clone())).await
}
