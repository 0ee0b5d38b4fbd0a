//! Line-oriented terminal rendering of the wizard view model.

use sip_core::{LogLevel, OperationKind, OperationView, WizardStep, WizardViewModel};

pub(crate) fn step_title(step: WizardStep) -> &'static str {
    match step {
        WizardStep::Form => "Goal details",
        WizardStep::Validation => "Validation",
        WizardStep::Streaming => "SIP calculation",
        WizardStep::Results => "Results",
        WizardStep::FundRecommendation => "Fund recommendation",
        WizardStep::FundRecommendationResult => "Recommended funds",
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Seen {
    last_log: u64,
    percent: u8,
}

/// Remembers what has already been printed so each render emits only new lines.
#[derive(Debug, Default)]
pub(crate) struct Renderer {
    step: Option<WizardStep>,
    error: Option<String>,
    calculation: Seen,
    recommendation: Seen,
}

impl Renderer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn render(&mut self, view: &WizardViewModel) -> Vec<String> {
        let mut lines = Vec::new();

        if self.step != Some(view.step) {
            self.step = Some(view.step);
            lines.push(format!("== {} ==", step_title(view.step)));
        }

        for (kind, op) in [
            (OperationKind::SipCalculation, &view.calculation),
            (OperationKind::FundRecommendation, &view.recommendation),
        ] {
            let seen = match kind {
                OperationKind::SipCalculation => &mut self.calculation,
                OperationKind::FundRecommendation => &mut self.recommendation,
            };
            render_operation(kind, op, seen, &mut lines);
        }

        if view.general_error != self.error {
            if let Some(error) = &view.general_error {
                lines.push(format!("! {error}"));
            }
            self.error = view.general_error.clone();
        }

        lines
    }
}

fn render_operation(kind: OperationKind, op: &OperationView, seen: &mut Seen, lines: &mut Vec<String>) {
    // A start-over resets log ids.
    let newest = op.logs.last().map(|entry| entry.id).unwrap_or(0);
    if newest < seen.last_log {
        *seen = Seen::default();
    }

    for entry in op.logs.iter().filter(|entry| entry.id > seen.last_log) {
        lines.push(format!(
            "[{}] {:<7} {}",
            entry.timestamp,
            marker(entry.level),
            entry.message
        ));
    }
    seen.last_log = seen.last_log.max(newest);

    if op.percent != seen.percent {
        seen.percent = op.percent;
        if op.current_agent.is_empty() {
            lines.push(format!("   {} {}%", kind.label(), op.percent));
        } else {
            lines.push(format!(
                "   {} {}% ({})",
                kind.label(),
                op.percent,
                op.current_agent
            ));
        }
    }
}

fn marker(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "info",
        LogLevel::Success => "ok",
        LogLevel::Warning => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sip_core::{update, Msg, WizardState};

    fn started() -> WizardState {
        update(WizardState::new(), Msg::AppStarted).0
    }

    #[test]
    fn first_render_prints_step_header_once() {
        let state = started();
        let mut renderer = Renderer::new();

        let first = renderer.render(&state.view());
        assert_eq!(first, vec!["== Goal details ==".to_string()]);
        assert!(renderer.render(&state.view()).is_empty());
    }

    #[test]
    fn errors_are_printed_when_they_change() {
        let (state, _) = update(started(), Msg::FormConfigLoaded(Err("offline".to_string())));
        let mut renderer = Renderer::new();

        let lines = renderer.render(&state.view());
        assert!(lines.iter().any(|line| line.starts_with("! ")));
        assert!(renderer.render(&state.view()).is_empty());
    }
}
