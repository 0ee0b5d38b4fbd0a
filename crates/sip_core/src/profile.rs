//! Event vocabularies for the two streamed operations.
//!
//! Both consumers share one state machine; everything that differs between the
//! SIP calculation and the fund recommendation lives in a [`StreamProfile`].

use crate::{OperationKind, WizardStep};

/// How a matched agent name moves the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressRule {
    /// `percent = max(percent, floor)`.
    Floor(u8),
    /// `percent += step`, capped at the progress ceiling.
    Step(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentRule {
    pub name: &'static str,
    pub rule: ProgressRule,
}

const fn floor(name: &'static str, percent: u8) -> AgentRule {
    AgentRule {
        name,
        rule: ProgressRule::Floor(percent),
    }
}

const fn step(name: &'static str, percent: u8) -> AgentRule {
    AgentRule {
        name,
        rule: ProgressRule::Step(percent),
    }
}

// First match wins: "PlannerAgent" shadows "SIPGoalPlannerAgent".
const SIP_AGENT_TABLE: &[AgentRule] = &[
    floor("PlannerAgent", 40),
    floor("SIPGoalPlannerAgent", 30),
    floor("RetrieverAgent", 50),
    floor("ThinkerAgent", 60),
    floor("QAAgent", 70),
    floor("DistillerAgent", 55),
    floor("FormatterAgent", 75),
    floor("ReportGeneratorAgent", 80),
];

const FUND_AGENT_TABLE: &[AgentRule] = &[
    step("FundRecommendationAgent", 5),
    step("RetrieverAgent", 5),
    step("ThinkerAgent", 5),
    step("QAAgent", 5),
    step("DistillerAgent", 5),
    step("FormatterAgent", 5),
    step("ReportGeneratorAgent", 5),
    step("FundRecommendationOrchestrator", 5),
];

const SIP_RAW_AGENTS: &[&str] = &[
    "PlannerAgent",
    "RetrieverAgent",
    "ThinkerAgent",
    "QAAgent",
    "DistillerAgent",
    "FormatterAgent",
    "ReportGeneratorAgent",
];

const FUND_RAW_AGENTS: &[&str] = &[
    "FundRecommendationAgent",
    "RetrieverAgent",
    "ThinkerAgent",
    "QAAgent",
    "DistillerAgent",
];

/// Configuration object shared by the SIP and fund-recommendation consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamProfile {
    pub operation: OperationKind,
    /// Path below the API base URL.
    pub endpoint: &'static str,
    pub completion_event: &'static str,
    pub primary_agent: &'static str,
    /// Agent shown while the generated report is fetched.
    pub report_agent: Option<&'static str>,
    /// Names scanned for in raw (non-JSON) lines, first match wins.
    pub raw_agents: &'static [&'static str],
    pub agent_table: &'static [AgentRule],
    /// Report file announced in raw text lines.
    pub report_file_name: Option<&'static str>,
    pub file_generated_percent: u8,
    pub streaming_step: WizardStep,
    pub results_step: WizardStep,
    pub connected_message: &'static str,
    pub completed_message: &'static str,
    pub file_message_prefix: &'static str,
    pub stopped_message: &'static str,
    pub redirect_message: &'static str,
}

impl StreamProfile {
    pub fn sip_calculation() -> Self {
        Self {
            operation: OperationKind::SipCalculation,
            endpoint: "calculate-sip",
            completion_event: "stream_complete",
            primary_agent: "SIPGoalPlannerAgent",
            report_agent: Some("ReportGeneratorAgent"),
            raw_agents: SIP_RAW_AGENTS,
            agent_table: SIP_AGENT_TABLE,
            report_file_name: Some("comprehensive_report.html"),
            file_generated_percent: 90,
            streaming_step: WizardStep::Streaming,
            results_step: WizardStep::Results,
            connected_message: "Connection established",
            completed_message: "Stream completed successfully",
            file_message_prefix: "Generated file",
            stopped_message: "Stream stopped by user",
            redirect_message: "Automatically redirected to Results tab",
        }
    }

    pub fn fund_recommendation() -> Self {
        Self {
            operation: OperationKind::FundRecommendation,
            endpoint: "fund-recommendation",
            completion_event: "stream_complete",
            primary_agent: "FundRecommendationOrchestrator",
            report_agent: None,
            raw_agents: FUND_RAW_AGENTS,
            agent_table: FUND_AGENT_TABLE,
            report_file_name: None,
            file_generated_percent: 95,
            streaming_step: WizardStep::FundRecommendation,
            results_step: WizardStep::FundRecommendationResult,
            connected_message: "Fund recommendation connection established",
            completed_message: "Fund recommendation completed successfully",
            file_message_prefix: "Generated fund recommendation file",
            stopped_message: "Fund recommendation stream stopped by user",
            redirect_message: "Automatically redirected to Fund Recommendation Result tab",
        }
    }

    pub fn for_operation(operation: OperationKind) -> Self {
        match operation {
            OperationKind::SipCalculation => Self::sip_calculation(),
            OperationKind::FundRecommendation => Self::fund_recommendation(),
        }
    }
}

/// Human-readable agent name for log lines; unknown names pass through.
pub fn display_agent_name(agent: &str) -> &str {
    match agent {
        "PlannerAgent" => "Planner Agent",
        "RetrieverAgent" => "Retriever Agent",
        "ThinkerAgent" => "Thinker Agent",
        "QAAgent" => "QA Agent",
        "DistillerAgent" => "Distiller Agent",
        "FormatterAgent" => "Formatter Agent",
        "CoderAgent" => "Coder Agent",
        "ExecutorAgent" => "Executor Agent",
        "ClarificationAgent" => "Clarification Agent",
        "SchedulerAgent" => "Scheduler Agent",
        "SIPGoalPlannerAgent" => "SIP Goal Planner Agent",
        "FundRecommendationAgent" => "Fund Recommendation Agent",
        "ReportGeneratorAgent" => "Report Generator Agent",
        "FundRecommendationOrchestrator" => "Fund Recommendation Orchestrator",
        "ReportReader" => "Report Reader Agent",
        "TemplateProcessor" => "Template Processor Agent",
        "TemplateLoader" => "Template Loader Agent",
        other => other,
    }
}
