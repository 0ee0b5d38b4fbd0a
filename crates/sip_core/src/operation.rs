use std::fmt;

use serde_json::Value;

use crate::{LogBook, ProgressState};

/// The two streamed operations the wizard runs against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    SipCalculation,
    FundRecommendation,
}

impl OperationKind {
    pub fn label(self) -> &'static str {
        match self {
            OperationKind::SipCalculation => "Calculation",
            OperationKind::FundRecommendation => "Fund recommendation",
        }
    }
}

/// Per-operation idempotence and retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompletionFlag {
    pub completed: bool,
    pub errored: bool,
}

impl CompletionFlag {
    /// A settled run is not repeated; asking for it again only navigates to its results.
    pub fn is_settled(self) -> bool {
        self.completed && !self.errored
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.errored = false;
    }

    pub fn mark_errored(&mut self) {
        self.completed = false;
        self.errored = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A server-produced report, identified by name and, when known, by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub file_name: String,
    pub file_path: Option<String>,
}

impl GeneratedArtifact {
    /// The string handed to report retrieval: the path when known, else the name.
    pub fn retrieval_target(&self) -> &str {
        self.file_path.as_deref().unwrap_or(&self.file_name)
    }
}

/// How a report document was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetrievalMethod {
    LocalFile,
    DownloadEndpoint,
    ReportsEndpoint,
    StaticPath,
    Placeholder,
}

impl RetrievalMethod {
    /// Short tag used in the combined failure diagnostic.
    pub fn tag(self) -> &'static str {
        match self {
            RetrievalMethod::LocalFile => "FS",
            RetrievalMethod::DownloadEndpoint => "HTTP",
            RetrievalMethod::ReportsEndpoint => "Alt",
            RetrievalMethod::StaticPath => "Static",
            RetrievalMethod::Placeholder => "Placeholder",
        }
    }
}

impl fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RetrievalMethod::LocalFile => "file system",
            RetrievalMethod::DownloadEndpoint => "HTTP endpoint",
            RetrievalMethod::ReportsEndpoint => "alternative endpoint",
            RetrievalMethod::StaticPath => "static file path",
            RetrievalMethod::Placeholder => "placeholder",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyFailure {
    pub method: RetrievalMethod,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedReport {
    pub method: RetrievalMethod,
    pub content: String,
}

/// Result of running the retrieval chain once: every failure in attempt order,
/// plus the document from the first strategy that succeeded, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RetrievalOutcome {
    pub failures: Vec<StrategyFailure>,
    pub retrieved: Option<RetrievedReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub content: String,
    pub path: String,
    pub method: RetrievalMethod,
}

/// All state owned by one streamed operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationState {
    pub(crate) progress: ProgressState,
    pub(crate) logs: LogBook,
    pub(crate) flag: CompletionFlag,
    pub(crate) streaming: bool,
    /// Id of the latest stream opened for this operation; zero before the first run.
    pub(crate) run: u64,
    pub(crate) artifact: Option<GeneratedArtifact>,
    pub(crate) report: Option<ReportDocument>,
    pub(crate) result: Option<Value>,
}

impl OperationState {
    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn logs(&self) -> &LogBook {
        &self.logs
    }

    pub fn flag(&self) -> CompletionFlag {
        self.flag
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn run_id(&self) -> u64 {
        self.run
    }

    /// Stream messages count only while streaming and only for the latest run.
    pub(crate) fn accepts(&self, run: u64) -> bool {
        self.streaming && self.run == run
    }

    pub fn artifact(&self) -> Option<&GeneratedArtifact> {
        self.artifact.as_ref()
    }

    pub fn report(&self) -> Option<&ReportDocument> {
        self.report.as_ref()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Clears the previous run's output before a new request is issued.
    pub(crate) fn reset_for_run(&mut self, run: u64) {
        self.progress.reset();
        self.logs.clear();
        self.artifact = None;
        self.report = None;
        self.result = None;
        self.flag.errored = false;
        self.streaming = true;
        self.run = run;
    }
}
