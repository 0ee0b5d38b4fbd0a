/// Upper bound for incremental progress steps; only explicit milestones go past it.
pub const PROGRESS_CEILING: u8 = 85;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressState {
    percent: u8,
    current_agent: String,
}

impl ProgressState {
    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn current_agent(&self) -> &str {
        &self.current_agent
    }

    /// Sets an explicit milestone, clamped to 100.
    pub fn set_percent(&mut self, percent: u8) {
        self.percent = percent.min(100);
    }

    /// Advances by `step`, never past `cap`. A value already above `cap` is kept.
    pub fn advance(&mut self, step: u8, cap: u8) {
        let advanced = self.percent.saturating_add(step).min(cap);
        self.percent = self.percent.max(advanced);
    }

    /// `percent = max(percent, floor)`.
    pub fn raise_to(&mut self, floor: u8) {
        self.percent = self.percent.max(floor.min(100));
    }

    pub fn set_agent(&mut self, agent: impl Into<String>) {
        self.current_agent = agent.into();
    }

    pub fn clear_agent(&mut self) {
        self.current_agent.clear();
    }

    pub fn reset(&mut self) {
        self.percent = 0;
        self.current_agent.clear();
    }
}
