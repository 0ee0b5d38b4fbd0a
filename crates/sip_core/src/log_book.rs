use chrono::DateTime;

/// Severity of a user-facing log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: u64,
    pub level: LogLevel,
    pub message: String,
    /// Display time (`HH:MM:SS`, UTC).
    pub timestamp: String,
}

/// Append-only sequence of log entries for one operation.
///
/// Ids keep increasing across `clear`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogBook {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry stamped with `at` (seconds since the epoch) and returns its id.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>, at: f64) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(LogEntry {
            id,
            level,
            message: message.into(),
            timestamp: display_time(at),
        });
        id
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Formats seconds since the epoch as a wall-clock display string.
pub fn display_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return "--:--:--".to_string();
    }
    DateTime::from_timestamp_millis((seconds * 1000.0) as i64)
        .map(|time| time.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
