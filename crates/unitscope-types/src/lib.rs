//! Shared types for unitscope
//!
//! This crate contains data structures used across multiple unitscope crates.

use chrono::{DateTime, TimeZone, Utc};
use ratatui::style::Color;
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Journal Match Types
// ============================================================================

/// Journal field holding the syslog priority (0-7)
pub const FIELD_PRIORITY: &str = "PRIORITY";

/// Journal field holding the originating systemd unit
pub const FIELD_SYSTEMD_UNIT: &str = "_SYSTEMD_UNIT";

/// Journal field holding the syslog identifier
pub const FIELD_SYSLOG_IDENTIFIER: &str = "SYSLOG_IDENTIFIER";

/// A single `FIELD=value` journal match
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatchClause {
    pub field: String,
    pub value: String,
}

impl MatchClause {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn priority(level: u8) -> Self {
        Self::new(FIELD_PRIORITY, level.to_string())
    }

    pub fn unit(name: impl Into<String>) -> Self {
        Self::new(FIELD_SYSTEMD_UNIT, name)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::new(FIELD_SYSLOG_IDENTIFIER, name)
    }
}

impl fmt::Display for MatchClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// Ordered set of match clauses.
///
/// Clauses on different fields are ANDed by the journal, clauses on the
/// same field are ORed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSpec {
    clauses: Vec<MatchClause>,
}

impl MatchSpec {
    pub fn new(clauses: Vec<MatchClause>) -> Self {
        Self { clauses }
    }

    /// Append all clauses of `other` after our own
    pub fn concat(mut self, other: impl IntoIterator<Item = MatchClause>) -> Self {
        self.clauses.extend(other);
        self
    }

    pub fn clauses(&self) -> &[MatchClause] {
        &self.clauses
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl From<Vec<MatchClause>> for MatchSpec {
    fn from(clauses: Vec<MatchClause>) -> Self {
        Self::new(clauses)
    }
}

// ============================================================================
// Severity Types
// ============================================================================

/// Syslog priority, most severe first
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}

impl Priority {
    pub const ALL: [Priority; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Informational,
        Self::Debug,
    ];

    /// Parse the journal's `PRIORITY` field value
    pub fn from_value(s: &str) -> Option<Self> {
        let n: u8 = s.trim().parse().ok()?;
        Self::ALL.get(n as usize).copied()
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Alert => "Alert",
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Notice => "Notice",
            Self::Informational => "Informational",
            Self::Debug => "Debug",
        }
    }

    /// Text shown in the log-level picker
    pub fn description(&self) -> &'static str {
        match self {
            Self::Emergency => "Only emergencies",
            Self::Alert => "Alerts or worse",
            Self::Critical => "Critical or worse",
            Self::Error => "Errors or worse",
            Self::Warning => "Warnings or worse",
            Self::Notice => "Notice or worse",
            Self::Informational => "Informational or worse",
            Self::Debug => "Debug or worse",
        }
    }
}

/// Inclusive urgency cutoff: everything at or above this priority passes
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeverityThreshold(u8);

impl SeverityThreshold {
    pub const MAX: u8 = 7;

    /// Create a threshold, clamping to the debug level
    pub fn new(level: u8) -> Self {
        Self(level.min(Self::MAX))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn priority(&self) -> Priority {
        Priority::ALL[self.0 as usize]
    }

    /// Expand into `PRIORITY=0 .. PRIORITY=threshold`
    pub fn expand(&self) -> Vec<MatchClause> {
        (0..=self.0).map(MatchClause::priority).collect()
    }
}

impl Default for SeverityThreshold {
    fn default() -> Self {
        Self(Priority::Informational.as_u8())
    }
}

impl From<Priority> for SeverityThreshold {
    fn from(p: Priority) -> Self {
        Self(p.as_u8())
    }
}

// ============================================================================
// Unit Types
// ============================================================================

/// A systemd unit as reported by the inventory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitInfo {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
}

impl UnitInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            load_state: String::new(),
            active_state: String::new(),
            sub_state: String::new(),
        }
    }

    pub fn with_states(
        mut self,
        load: impl Into<String>,
        active: impl Into<String>,
        sub: impl Into<String>,
    ) -> Self {
        self.load_state = load.into();
        self.active_state = active.into();
        self.sub_state = sub.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.active_state == "active"
    }

    pub fn is_service(&self) -> bool {
        self.name.ends_with(".service")
    }

    /// Display color for the active state
    pub fn state_color(&self) -> Color {
        match self.active_state.as_str() {
            "active" => Color::Green,
            "failed" => Color::Red,
            "activating" | "deactivating" | "reloading" => Color::Yellow,
            _ => Color::DarkGray,
        }
    }
}

// ============================================================================
// Selection Types
// ============================================================================

/// One row the operator can pick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionItem {
    pub name: String,
    pub description: String,
    pub matches: MatchSpec,
    /// Set for rows backed by a real unit
    pub unit: Option<String>,
}

impl SelectionItem {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        matches: MatchSpec,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            matches,
            unit: None,
        }
    }

    /// Everything in the journal
    pub fn all() -> Self {
        Self::new("All", "Everything in the log", MatchSpec::default())
    }

    pub fn kernel() -> Self {
        Self::new(
            "Kernel",
            "Kernel log",
            MatchSpec::new(vec![MatchClause::identifier("kernel")]),
        )
    }

    pub fn all_errors() -> Self {
        Self::new(
            "All Errors",
            "All errors in the log",
            SeverityThreshold::from(Priority::Error).expand().into(),
        )
    }

    pub fn all_warnings() -> Self {
        Self::new(
            "All Warnings",
            "All warnings in the log",
            SeverityThreshold::from(Priority::Warning).expand().into(),
        )
    }

    pub fn for_unit(unit: &UnitInfo) -> Self {
        Self {
            name: unit.name.clone(),
            description: unit.description.clone(),
            matches: MatchSpec::new(vec![MatchClause::unit(&unit.name)]),
            unit: Some(unit.name.clone()),
        }
    }

    /// Build the selection list from the live unit inventory.
    ///
    /// Only `.service` units are listed, sorted by name, after the
    /// synthetic entries.
    pub fn listing(units: &[UnitInfo], active_only: bool) -> Vec<Self> {
        let mut services: Vec<&UnitInfo> = units
            .iter()
            .filter(|u| u.is_service())
            .filter(|u| !active_only || u.is_active())
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));

        let mut items = vec![
            Self::all(),
            Self::kernel(),
            Self::all_errors(),
            Self::all_warnings(),
        ];
        items.extend(services.into_iter().map(Self::for_unit));
        items
    }
}

// ============================================================================
// Journal Record Types
// ============================================================================

/// A single structured journal entry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JournalRecord {
    /// Realtime timestamp in microseconds since the epoch
    pub realtime_us: u64,

    /// All journal fields of the entry
    pub fields: HashMap<String, String>,
}

impl JournalRecord {
    pub fn new(realtime_us: u64) -> Self {
        Self {
            realtime_us,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_micros(self.realtime_us as i64).single()
    }

    pub fn priority(&self) -> Option<Priority> {
        self.field(FIELD_PRIORITY).and_then(Priority::from_value)
    }

    /// Syslog identifier, falling back to the command name
    pub fn identifier(&self) -> &str {
        self.field(FIELD_SYSLOG_IDENTIFIER)
            .or_else(|| self.field("_COMM"))
            .unwrap_or("")
    }

    pub fn unit(&self) -> Option<&str> {
        self.field(FIELD_SYSTEMD_UNIT)
    }

    pub fn message(&self) -> &str {
        self.field("MESSAGE").unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_expand() {
        let clauses = SeverityThreshold::new(3).expand();
        let rendered: Vec<String> = clauses.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["PRIORITY=0", "PRIORITY=1", "PRIORITY=2", "PRIORITY=3"]
        );

        assert_eq!(
            SeverityThreshold::new(0).expand(),
            vec![MatchClause::priority(0)]
        );
    }

    #[test]
    fn test_threshold_clamps() {
        assert_eq!(SeverityThreshold::new(42).level(), 7);
        assert_eq!(SeverityThreshold::new(42).expand().len(), 8);
        assert_eq!(SeverityThreshold::default().priority(), Priority::Informational);
    }

    #[test]
    fn test_listing_order_and_filtering() {
        let units = vec![
            UnitInfo::new("web.service", "Web").with_states("loaded", "active", "running"),
            UnitInfo::new("db.service", "DB").with_states("loaded", "inactive", "dead"),
            UnitInfo::new("sockets.target", "Sockets").with_states("loaded", "active", "active"),
        ];

        let names: Vec<String> = SelectionItem::listing(&units, false)
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(
            names,
            vec!["All", "Kernel", "All Errors", "All Warnings", "db.service", "web.service"]
        );

        let active = SelectionItem::listing(&units, true);
        assert_eq!(active.last().map(|i| i.name.as_str()), Some("web.service"));
        assert_eq!(active.len(), 5);
    }

    #[test]
    fn test_unit_selection_matches() {
        let unit = UnitInfo::new("web.service", "Web");
        let item = SelectionItem::for_unit(&unit);
        assert_eq!(item.matches.clauses(), &[MatchClause::unit("web.service")]);
        assert_eq!(item.unit.as_deref(), Some("web.service"));
        assert!(SelectionItem::all().matches.is_empty());
    }

    #[test]
    fn test_record_accessors() {
        let record = JournalRecord::new(1_700_000_000_000_000)
            .with_field("PRIORITY", "4")
            .with_field("_COMM", "sshd")
            .with_field("MESSAGE", "hello");

        assert_eq!(record.priority(), Some(Priority::Warning));
        assert_eq!(record.identifier(), "sshd");
        assert_eq!(record.message(), "hello");
        assert!(record.timestamp().is_some());
        assert_eq!(Priority::from_value("9"), None);
    }
}
