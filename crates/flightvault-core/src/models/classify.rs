use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::Change;

/// The label the Classifier (§4.E) assigns to a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Keep,
    Restore,
    Uncertain,
}

/// A classified change: the original change plus its label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationEntry {
    pub change: Change,
    pub label: Label,
}

/// Optional time range predicate for a classification rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.from.map(|f| t >= f).unwrap_or(true) && self.to.map(|to| t <= to).unwrap_or(true)
    }
}

/// A single explicit classification rule (§4.E "Rule evaluation"). Rules
/// are evaluated in list order; the first whose predicates all match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub change_type: Option<ChangeTypeFilter>,
    pub field_pattern: Option<String>,
    pub time_range: Option<TimeRange>,
    pub label: Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeTypeFilter {
    Added,
    Deleted,
    Modified,
}

/// Result of classifying a whole change set (§4.E).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub keep: Vec<ClassificationEntry>,
    pub restore: Vec<ClassificationEntry>,
    pub uncertain: Vec<ClassificationEntry>,
}

impl ClassificationResult {
    pub fn push(&mut self, entry: ClassificationEntry) {
        match entry.label {
            Label::Keep => self.keep.push(entry),
            Label::Restore => self.restore.push(entry),
            Label::Uncertain => self.uncertain.push(entry),
        }
    }
}
