use serde_json::Value;

use crate::view_model::{FieldView, OperationView, WizardViewModel};
use crate::{
    FieldSpec, FormConfig, FormData, OperationKind, OperationState, ValidationOutcome,
};

/// Steps of the planning wizard, in the order a run walks through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardStep {
    #[default]
    Form,
    Validation,
    Streaming,
    Results,
    FundRecommendation,
    FundRecommendationResult,
}

/// Derived result of a finished calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CalculationSummary {
    pub time_horizon_years: Option<i64>,
    pub total_months: Option<i64>,
    pub report_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    pub(crate) step: WizardStep,
    pub(crate) form_config: Option<FormConfig>,
    pub(crate) config_loading: bool,
    pub(crate) conditional_goal: Option<String>,
    pub(crate) conditional_fields: Vec<FieldSpec>,
    pub(crate) form_data: FormData,
    pub(crate) validation: Option<ValidationOutcome>,
    pub(crate) validating: bool,
    pub(crate) general_error: Option<String>,
    pub(crate) calculation: OperationState,
    pub(crate) recommendation: OperationState,
    pub(crate) summary: Option<CalculationSummary>,
    pub(crate) report_path_for_recommendation: Option<String>,
    /// Last stream id handed out; kept across start-over so ids never repeat.
    pub(crate) last_run: u64,
    pub(crate) dirty: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::Form,
            form_config: None,
            config_loading: false,
            conditional_goal: None,
            conditional_fields: Vec::new(),
            form_data: initial_form_data(),
            validation: None,
            validating: false,
            general_error: None,
            calculation: OperationState::default(),
            recommendation: OperationState::default(),
            summary: None,
            report_path_for_recommendation: None,
            last_run: 0,
            dirty: false,
        }
    }
}

/// A fresh form carries the default currency.
pub fn initial_form_data() -> FormData {
    let mut data = FormData::new();
    data.insert("currency".to_string(), Value::from("INR"));
    data
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form_config(&self) -> Option<&FormConfig> {
        self.form_config.as_ref()
    }

    pub fn config_loading(&self) -> bool {
        self.config_loading
    }

    pub fn validating(&self) -> bool {
        self.validating
    }

    pub fn conditional_fields(&self) -> &[FieldSpec] {
        &self.conditional_fields
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn validation(&self) -> Option<&ValidationOutcome> {
        self.validation.as_ref()
    }

    pub fn general_error(&self) -> Option<&str> {
        self.general_error.as_deref()
    }

    pub fn summary(&self) -> Option<&CalculationSummary> {
        self.summary.as_ref()
    }

    pub fn report_path_for_recommendation(&self) -> Option<&str> {
        self.report_path_for_recommendation.as_deref()
    }

    pub fn operation(&self, kind: OperationKind) -> &OperationState {
        match kind {
            OperationKind::SipCalculation => &self.calculation,
            OperationKind::FundRecommendation => &self.recommendation,
        }
    }

    pub(crate) fn operation_mut(&mut self, kind: OperationKind) -> &mut OperationState {
        match kind {
            OperationKind::SipCalculation => &mut self.calculation,
            OperationKind::FundRecommendation => &mut self.recommendation,
        }
    }

    /// Every field currently shown: always-required first, then the goal-specific set.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.form_config
            .iter()
            .flat_map(|config| config.fields.always_required.iter())
            .chain(self.conditional_fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.visible_fields().find(|field| field.name == name)
    }

    pub fn view(&self) -> WizardViewModel {
        let fields = self
            .visible_fields()
            .map(|spec| FieldView {
                name: spec.name.clone(),
                label: spec.label.clone(),
                required: spec.required,
                value: self.form_data.get(&spec.name).cloned(),
            })
            .collect();

        WizardViewModel {
            step: self.step,
            title: self
                .form_config
                .as_ref()
                .map(|config| config.title.clone())
                .unwrap_or_default(),
            config_loading: self.config_loading,
            validating: self.validating,
            fields,
            general_error: self.general_error.clone(),
            validation: self.validation.clone(),
            summary: self.summary.clone(),
            calculation: OperationView::from_state(&self.calculation),
            recommendation: OperationView::from_state(&self.recommendation),
            dirty: self.dirty,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns whether anything changed since the last call and clears the marker.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
