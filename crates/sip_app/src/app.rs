//! Drives the wizard: owns the state, runs effects through the engine and
//! walks the steps a user would take.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use engine_logging::{engine_debug, engine_info, engine_warn};
use serde_json::Value;
use sip_core::{
    update, AuthGate, Effect, FormConfig, FormData, Msg, OperationKind, SessionStore,
    StreamProfile, WizardState, FORM_CONFIG_CACHE_KEY, GOAL_TYPE_FIELD,
};
use sip_engine::{AtomicFileWriter, EngineEvent, EngineHandle};

use crate::effects::{command_for, msg_for};
use crate::render::Renderer;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const REQUEST_DEADLINE: Duration = Duration::from_secs(60);
const DEFAULT_REPORT_NAME: &str = "report.html";

pub(crate) struct RunOptions {
    pub answers: FormData,
    pub output_dir: PathBuf,
    pub recommend_funds: bool,
    pub stream_timeout: Duration,
    pub retries: u32,
}

pub(crate) struct Driver<S: SessionStore> {
    state: WizardState,
    engine: EngineHandle,
    store: S,
    gate: AuthGate,
    renderer: Renderer,
    pending_reports: HashMap<OperationKind, usize>,
}

fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

impl<S: SessionStore> Driver<S> {
    pub(crate) fn new(engine: EngineHandle, store: S, gate: AuthGate) -> Self {
        Self {
            state: WizardState::new(),
            engine,
            store,
            gate,
            renderer: Renderer::new(),
            pending_reports: HashMap::new(),
        }
    }

    /// Signs in unless a live session is already stored.
    pub(crate) fn sign_in(&mut self, user: Option<&str>, password: Option<&str>) -> Result<()> {
        let now = Utc::now().timestamp();
        if self.gate.is_authed(&self.store, now) {
            if let Some(user) = self.gate.user(&self.store) {
                engine_info!("Reusing session for {}", user.id);
            }
            return Ok(());
        }
        let (Some(user), Some(password)) = (user, password) else {
            bail!("Not signed in; pass --user and --password");
        };
        let session = self.gate.login(&mut self.store, user, password, now)?;
        println!(
            "Signed in as {} (session valid for {} minutes)",
            session.user.id,
            self.gate.remaining_secs(&self.store, now) / 60
        );
        Ok(())
    }

    pub(crate) fn sign_out(&mut self) {
        self.gate.logout(&mut self.store);
        println!("Signed out");
    }

    pub(crate) fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        for effect in effects {
            self.run_effect(effect);
        }

        if self.state.consume_dirty() {
            for line in self.renderer.render(&self.state.view()) {
                println!("{line}");
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::LoadFormConfig => match self.cached_form_config() {
                Some(config) => {
                    engine_debug!("Using cached form configuration");
                    self.dispatch(Msg::FormConfigLoaded(Ok(config)));
                }
                None => self.engine.send(command_for(effect)),
            },
            Effect::FetchReport { operation, .. } => {
                *self.pending_reports.entry(operation).or_default() += 1;
                self.engine.send(command_for(effect));
            }
            effect => self.engine.send(command_for(effect)),
        }
    }

    fn cached_form_config(&self) -> Option<FormConfig> {
        let cached = self.store.get(FORM_CONFIG_CACHE_KEY)?;
        match serde_json::from_str(&cached) {
            Ok(config) => Some(config),
            Err(err) => {
                engine_warn!("Discarding cached form configuration: {}", err);
                None
            }
        }
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::FormConfigLoaded(Ok(config)) => match serde_json::to_string(config) {
                Ok(text) => self.store.set(FORM_CONFIG_CACHE_KEY, text),
                Err(err) => engine_warn!("Form configuration not cached: {}", err),
            },
            EngineEvent::ReportRetrieved { operation, .. } => {
                if let Some(pending) = self.pending_reports.get_mut(operation) {
                    *pending = pending.saturating_sub(1);
                }
            }
            _ => {}
        }
        self.dispatch(msg_for(event, now_secs()));
    }

    /// Pumps engine events until `done` holds. Returns `false` on timeout.
    fn pump_until(&mut self, timeout: Duration, done: impl Fn(&Self) -> bool) -> Result<bool> {
        let started = Instant::now();
        loop {
            self.ensure_session()?;
            if done(self) {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            match self.engine.recv_timeout(POLL_INTERVAL) {
                Some(event) => self.handle_event(event),
                None => self.dispatch(Msg::Tick),
            }
        }
    }

    fn ensure_session(&mut self) -> Result<()> {
        let now = Utc::now().timestamp();
        if self.gate.remaining_secs(&self.store, now) == 0 {
            self.gate.logout(&mut self.store);
            bail!("Session expired; signed out");
        }
        Ok(())
    }

    fn fail_on_error(&self) -> Result<()> {
        match self.state.general_error() {
            Some(error) => Err(anyhow!(error.to_string())),
            None => Ok(()),
        }
    }

    pub(crate) fn run(&mut self, options: &RunOptions) -> Result<()> {
        self.load_form()?;
        self.fill_form(&options.answers)?;
        self.validate()?;
        // A placeholder report is still worth saving when the run failed.
        let outcome = self.run_operation(OperationKind::SipCalculation, options);
        self.save_report(OperationKind::SipCalculation, options)?;
        outcome?;

        if let Some(summary) = self.state.summary() {
            if let (Some(years), Some(months)) = (summary.time_horizon_years, summary.total_months) {
                println!("Investment horizon: {years} years ({months} months)");
            }
        }

        if options.recommend_funds {
            let outcome = self.run_operation(OperationKind::FundRecommendation, options);
            self.save_report(OperationKind::FundRecommendation, options)?;
            outcome?;
            if let Some(result) = self.state.operation(OperationKind::FundRecommendation).result() {
                println!("{}", serde_json::to_string_pretty(result)?);
            }
        }
        Ok(())
    }

    fn load_form(&mut self) -> Result<()> {
        self.dispatch(Msg::AppStarted);
        if !self.pump_until(REQUEST_DEADLINE, |d| !d.state.config_loading())? {
            bail!("Timed out loading the form configuration");
        }
        self.fail_on_error()?;
        if self.state.form_config().is_none() {
            bail!("No form configuration available");
        }
        Ok(())
    }

    fn fill_form(&mut self, answers: &FormData) -> Result<()> {
        if let Some(goal) = answers.get(GOAL_TYPE_FIELD) {
            self.dispatch(Msg::FieldChanged {
                name: GOAL_TYPE_FIELD.to_string(),
                value: goal.clone(),
            });
            if !self.pump_until(REQUEST_DEADLINE, |d| !d.state.config_loading())? {
                bail!("Timed out loading goal-specific fields");
            }
            self.fail_on_error()?;
        }

        for (name, value) in answers.iter().filter(|(name, _)| *name != GOAL_TYPE_FIELD) {
            let value = match (self.state.field(name), value) {
                (Some(field), Value::String(raw)) => field.coerce_input(raw),
                (None, _) => {
                    engine_warn!("Answer for unknown field {name} kept as given");
                    value.clone()
                }
                (Some(_), other) => other.clone(),
            };
            self.dispatch(Msg::FieldChanged {
                name: name.clone(),
                value,
            });
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.dispatch(Msg::ValidateClicked);
        self.fail_on_error()?;
        if !self.pump_until(REQUEST_DEADLINE, |d| !d.state.validating())? {
            bail!("Timed out validating the form");
        }
        self.fail_on_error()?;
        if self.state.validation().is_none() {
            bail!("Form was not accepted");
        }
        Ok(())
    }

    fn operation_finished(&self, kind: OperationKind) -> bool {
        let op = self.state.operation(kind);
        let results_step = StreamProfile::for_operation(kind).results_step;
        !op.is_streaming()
            && self.pending_reports.get(&kind).copied().unwrap_or(0) == 0
            && (self.state.step() == results_step || !op.flag().completed)
    }

    fn run_operation(&mut self, kind: OperationKind, options: &RunOptions) -> Result<()> {
        let mut attempts_left = options.retries;
        self.dispatch(Msg::RunClicked { operation: kind });
        self.fail_on_error()?;

        loop {
            if !self.pump_until(options.stream_timeout, |d| d.operation_finished(kind))? {
                self.dispatch(Msg::StopClicked {
                    operation: kind,
                    now: now_secs(),
                });
                bail!("{} timed out after {:?}", kind.label(), options.stream_timeout);
            }

            let flag = self.state.operation(kind).flag();
            if flag.is_settled() {
                return Ok(());
            }
            if flag.errored && attempts_left > 0 {
                attempts_left -= 1;
                engine_info!("Retrying {} ({} attempts left)", kind.label(), attempts_left);
                self.dispatch(Msg::RegenerateClicked { operation: kind });
                continue;
            }
            if flag.errored {
                self.fail_on_error()?;
                bail!("{} failed", kind.label());
            }
            bail!("{} stream ended before completion", kind.label());
        }
    }

    fn save_report(&self, kind: OperationKind, options: &RunOptions) -> Result<()> {
        let Some(report) = self.state.operation(kind).report() else {
            engine_warn!("{} produced no report", kind.label());
            return Ok(());
        };
        let fallback = StreamProfile::for_operation(kind)
            .report_file_name
            .unwrap_or(DEFAULT_REPORT_NAME);
        let writer = AtomicFileWriter::new(options.output_dir.clone());
        let written = writer
            .write_report(report, fallback)
            .with_context(|| format!("saving {} report", kind.label()))?;
        println!("Report saved to {} (via {})", written.display(), report.method);
        Ok(())
    }
}
