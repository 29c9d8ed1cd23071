//! Audit trail of dispatched actions with pattern-based filtering
//!
//! Keeps a bounded in-memory record of what was run against which record,
//! for display in an admin "recent activity" panel.
//!
//! # Example
//!
//! ```
//! use record_actions_core::audit::{AuditConfig, AuditFilter, AuditMiddleware};
//!
//! // Everything except the noisy save button
//! let filter = AuditFilter::new(None, Some("doSave*"));
//! let audit = AuditMiddleware::new(AuditConfig::new(50, filter));
//! assert!(audit.log().is_empty());
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use crate::error::DispatchError;
use crate::middleware::{ActionCall, DispatchMiddleware};
use crate::outcome::DispatchOutcome;
use crate::record::RecordId;

/// Include/exclude glob patterns over action names
///
/// Patterns support `*` (any sequence) and `?` (any single character).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// If non-empty, only actions matching one of these are recorded
    pub include_patterns: Vec<String>,
    /// Actions matching these are skipped (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl AuditFilter {
    /// Create a filter from comma-separated pattern strings
    ///
    /// ```
    /// use record_actions_core::audit::AuditFilter;
    ///
    /// let filter = AuditFilter::new(Some("do*"), Some("doSave*"));
    /// assert!(filter.should_record("doUnlock"));
    /// assert!(!filter.should_record("doSaveAndClose"));
    /// assert!(!filter.should_record("unlock"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let split = |s: &str| -> Vec<String> {
            s.split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect()
        };
        Self {
            include_patterns: include.map(split).unwrap_or_default(),
            exclude_patterns: exclude.map(split).unwrap_or_default(),
        }
    }

    /// Whether an action name passes the filter
    pub fn should_record(&self, action: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, action))
        {
            return false;
        }
        !self.exclude_patterns.iter().any(|p| glob_match(p, action))
    }
}

/// What happened to an audited call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditKind {
    /// Invoked and succeeded
    Success,
    /// Invoked and failed
    Failure,
    /// Invoked and produced its own response
    RawResponse,
    /// Rejected before invocation
    Rejected,
}

/// One audited call
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Requested action name
    pub action: String,
    /// Singular name of the record type
    pub record: String,
    /// Record identity before the action ran
    pub record_id: Option<RecordId>,
    /// What happened
    pub kind: AuditKind,
    /// User-facing message, when there was one
    pub message: Option<String>,
    /// Sequence number for ordering
    pub sequence: u64,
    /// When the entry was recorded
    pub timestamp: Instant,
}

impl AuditEntry {
    /// Format the time since the entry for display (e.g. "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.timestamp.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Ring buffer settings
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Maximum number of entries kept
    pub capacity: usize,
    /// Which actions are recorded
    pub filter: AuditFilter,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: AuditFilter::default(),
        }
    }
}

impl AuditConfig {
    /// Create with capacity and filter
    pub fn new(capacity: usize, filter: AuditFilter) -> Self {
        Self { capacity, filter }
    }
}

/// Bounded log of audited calls; oldest entries are dropped first
#[derive(Debug, Clone)]
pub struct AuditLog {
    entries: VecDeque<AuditEntry>,
    config: AuditConfig,
    next_sequence: u64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

impl AuditLog {
    /// Create a log with configuration
    pub fn new(config: AuditConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.capacity),
            config,
            next_sequence: 0,
        }
    }

    /// Record a call, if it passes the filter
    pub fn record(
        &mut self,
        call: &ActionCall<'_>,
        kind: AuditKind,
        message: Option<&str>,
    ) -> Option<&AuditEntry> {
        if self.config.capacity == 0 || !self.config.filter.should_record(call.action) {
            return None;
        }

        let entry = AuditEntry {
            action: call.action.to_string(),
            record: call.record.to_string(),
            record_id: call.record_id,
            kind,
            message: message.map(str::to_string),
            sequence: self.next_sequence,
            timestamp: Instant::now(),
        };
        self.next_sequence += 1;

        if self.entries.len() >= self.config.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.entries.back()
    }

    /// All entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter()
    }

    /// The most recent `count` entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().rev().take(count)
    }

    /// Entries about one record
    pub fn for_record(&self, id: RecordId) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(move |e| e.record_id == Some(id))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Configuration
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }
}

/// Middleware feeding an [`AuditLog`]
#[derive(Debug, Clone, Default)]
pub struct AuditMiddleware {
    log: AuditLog,
}

impl AuditMiddleware {
    /// Create with configuration
    pub fn new(config: AuditConfig) -> Self {
        Self {
            log: AuditLog::new(config),
        }
    }

    /// The audit log
    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    /// Mutable audit log
    pub fn log_mut(&mut self) -> &mut AuditLog {
        &mut self.log
    }
}

impl DispatchMiddleware for AuditMiddleware {
    fn before(&mut self, _call: &ActionCall<'_>) {}

    fn after(&mut self, call: &ActionCall<'_>, outcome: &DispatchOutcome) {
        let kind = match outcome {
            DispatchOutcome::Success { .. } => AuditKind::Success,
            DispatchOutcome::Failure { .. } => AuditKind::Failure,
            DispatchOutcome::RawResponse(_) => AuditKind::RawResponse,
        };
        self.log.record(call, kind, outcome.message());
    }

    fn rejected(&mut self, call: &ActionCall<'_>, error: &DispatchError) {
        let message = error.to_string();
        self.log.record(call, AuditKind::Rejected, Some(&message));
    }
}

/// Glob match of an action name; `*` spans any run, `?` one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let mut pi = 0;
    let mut ti = 0;
    // Last `*` seen and the text position it is currently anchored at
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some(&'*') => {
                star = Some((pi, ti));
                pi += 1;
            }
            Some(&p) if p == '?' || p == text[ti] => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) => {
                    pi = star_pi + 1;
                    ti = star_ti + 1;
                    star = Some((star_pi, ti));
                }
                None => return false,
            },
        }
    }

    pattern[pi..].iter().all(|&p| p == '*')
}
