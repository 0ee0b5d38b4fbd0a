use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field values collected by the wizard, keyed by field name.
pub type FormData = Map<String, Value>;

/// Field whose value selects the conditional field set.
pub const GOAL_TYPE_FIELD: &str = "goal_type";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: FormFields,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormFields {
    #[serde(default)]
    pub always_required: Vec<FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl FieldSpec {
    pub fn is_numeric(&self) -> bool {
        self.field_type == "number"
    }

    /// Converts raw text input to the value stored in the form.
    ///
    /// Number fields hold numbers (integers when whole); blank input clears the field.
    pub fn coerce_input(&self, raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::String(String::new());
        }
        if !self.is_numeric() {
            return Value::String(trimmed.to_string());
        }
        if let Ok(whole) = trimmed.parse::<i64>() {
            return Value::from(whole);
        }
        trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(trimmed.to_string()))
    }
}

/// Response of `POST /validate-form`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub time_horizon_years: Option<i64>,
    #[serde(default)]
    pub total_months: Option<i64>,
}

/// A value counts as missing when absent, null or an empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

/// Names of required fields (always-required, then conditional) with no value.
pub fn missing_required_fields(
    config: &FormConfig,
    conditional: &[FieldSpec],
    data: &FormData,
) -> Vec<String> {
    config
        .fields
        .always_required
        .iter()
        .chain(conditional.iter())
        .filter(|field| field.required && is_blank(data.get(&field.name)))
        .map(|field| field.name.clone())
        .collect()
}
