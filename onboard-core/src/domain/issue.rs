//! Issue domain types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Issue lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Blocked,
    Resolved,
}

impl IssueStatus {
    /// Anything not yet resolved counts as open
    pub fn is_open(&self) -> bool {
        !matches!(self, IssueStatus::Resolved)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::Blocked => write!(f, "blocked"),
            IssueStatus::Resolved => write!(f, "resolved"),
        }
    }
}

impl FromStr for IssueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "in progress" | "in_progress" => Ok(IssueStatus::Open),
            "blocked" => Ok(IssueStatus::Blocked),
            "resolved" | "closed" => Ok(IssueStatus::Resolved),
            other => Err(format!(
                "unknown issue status '{}' (expected open, blocked or resolved)",
                other
            )),
        }
    }
}

/// An obstacle raised against a pipeline
///
/// The linked pipeline may disappear later; the issue stays and is reported
/// as orphaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Nil until assigned; see `Document::assign_missing_issue_ids`
    #[serde(default)]
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `pipeline_name` of the pipeline this issue is about
    pub linked_pipeline: String,
    pub status: IssueStatus,
    pub opened_date: NaiveDate,
    #[serde(default)]
    pub blocked_days: u32,
}

impl Issue {
    pub fn new(
        title: impl Into<String>,
        linked_pipeline: impl Into<String>,
        opened_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            linked_pipeline: linked_pipeline.into(),
            status: IssueStatus::Open,
            opened_date,
            blocked_days: 0,
        }
    }

    /// Stable id for a stored issue that was written without one
    ///
    /// Derived from the issue's position and content, so loading the same
    /// document twice yields the same ids.
    pub fn derived_id(&self, position: usize) -> Uuid {
        let seed = format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}",
            position, self.title, self.linked_pipeline, self.opened_date
        );
        Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyIssueTitle);
        }
        Ok(())
    }
}
