use serde_json::Value;

use crate::{
    CalculationSummary, CompletionFlag, LogEntry, OperationState, ValidationOutcome, WizardStep,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardViewModel {
    pub step: WizardStep,
    pub title: String,
    pub config_loading: bool,
    pub validating: bool,
    pub fields: Vec<FieldView>,
    pub general_error: Option<String>,
    pub validation: Option<ValidationOutcome>,
    pub summary: Option<CalculationSummary>,
    pub calculation: OperationView,
    pub recommendation: OperationView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub required: bool,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationView {
    pub percent: u8,
    pub current_agent: String,
    pub streaming: bool,
    pub flag: CompletionFlag,
    pub logs: Vec<LogEntry>,
    pub artifact_name: Option<String>,
    pub report_path: Option<String>,
    pub has_report: bool,
}

impl OperationView {
    pub(crate) fn from_state(op: &OperationState) -> Self {
        Self {
            percent: op.progress.percent(),
            current_agent: op.progress.current_agent().to_string(),
            streaming: op.streaming,
            flag: op.flag,
            logs: op.logs.entries().to_vec(),
            artifact_name: op.artifact.as_ref().map(|a| a.file_name.clone()),
            report_path: op.report.as_ref().map(|r| r.path.clone()),
            has_report: op.report.is_some(),
        }
    }
}
