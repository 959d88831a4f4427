//! Aggregation engine
//!
//! Computes the board's counts from a document snapshot. Everything is
//! recomputed from scratch on each call and the document is never mutated.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::classify::{ClassificationRules, Stage};
use crate::domain::contact::ContactRole;
use crate::domain::document::Document;
use crate::domain::issue::IssueStatus;
use crate::domain::name_key;
use crate::domain::pipeline::PipelineKind;

/// Pipelines per stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub planned: usize,
    pub uat: usize,
    pub production: usize,
    pub finalized: usize,
}

impl StageCounts {
    pub fn get(&self, stage: Stage) -> usize {
        match stage {
            Stage::Planned => self.planned,
            Stage::Uat => self.uat,
            Stage::Production => self.production,
            Stage::Finalized => self.finalized,
        }
    }

    fn increment(&mut self, stage: Stage) {
        match stage {
            Stage::Planned => self.planned += 1,
            Stage::Uat => self.uat += 1,
            Stage::Production => self.production += 1,
            Stage::Finalized => self.finalized += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.planned + self.uat + self.production + self.finalized
    }
}

/// Pipelines per kind, independent of stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub batch: usize,
    pub streaming: usize,
}

impl KindCounts {
    pub fn get(&self, kind: PipelineKind) -> usize {
        match kind {
            PipelineKind::Batch => self.batch,
            PipelineKind::Streaming => self.streaming,
        }
    }

    pub fn total(&self) -> usize {
        self.batch + self.streaming
    }
}

/// One row of the stage × kind table used for stacked charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRow {
    pub stage: Stage,
    pub batch: usize,
    pub streaming: usize,
}

/// Open issues against one linked pipeline name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineIssues {
    pub pipeline_name: String,
    pub open: usize,
    pub blocked_days: u64,
    /// No pipeline of either kind carries this name
    pub orphaned: bool,
}

/// An issue whose linked pipeline no longer exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedIssue {
    pub id: Uuid,
    pub title: String,
    pub linked_pipeline: String,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub total: usize,
    /// Issues whose status is not `resolved`
    pub open: usize,
    pub blocked: usize,
    pub resolved: usize,
    /// Sum of `blocked_days` over open issues
    pub open_blocked_days: u64,
    /// Open issues grouped by linked pipeline, in first-seen order
    pub per_pipeline: Vec<PipelineIssues>,
    pub orphaned: Vec<OrphanedIssue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCount {
    pub role: ContactRole,
    pub team: String,
    pub count: usize,
}

/// Team engagement: who is involved on each side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSummary {
    pub producer: usize,
    pub internal: usize,
    /// Sorted by role then team
    pub by_team: Vec<TeamCount>,
}

/// Everything the board displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub stages: StageCounts,
    pub kinds: KindCounts,
    /// Always one row per stage, in `Stage::ALL` order
    pub distribution: Vec<DistributionRow>,
    pub issues: IssueSummary,
    pub contacts: ContactSummary,
}

/// Aggregate a document with the default classification rules
pub fn aggregate(document: &Document) -> Report {
    aggregate_with(document, &ClassificationRules::default())
}

/// Aggregate a document with a custom rule set
pub fn aggregate_with(document: &Document, rules: &ClassificationRules) -> Report {
    let mut stages = StageCounts::default();
    let mut per_kind: HashMap<PipelineKind, StageCounts> = HashMap::new();

    for kind in PipelineKind::ALL {
        for pipeline in document.pipelines(kind) {
            let stage = rules.effective_stage(pipeline);
            stages.increment(stage);
            per_kind.entry(kind).or_default().increment(stage);
        }
    }

    let kinds = KindCounts {
        batch: document.batch_pipelines.len(),
        streaming: document.streaming_pipelines.len(),
    };

    let distribution = Stage::ALL
        .iter()
        .map(|&stage| DistributionRow {
            stage,
            batch: per_kind
                .get(&PipelineKind::Batch)
                .map_or(0, |counts| counts.get(stage)),
            streaming: per_kind
                .get(&PipelineKind::Streaming)
                .map_or(0, |counts| counts.get(stage)),
        })
        .collect();

    let report = Report {
        stages,
        kinds,
        distribution,
        issues: summarize_issues(document),
        contacts: summarize_contacts(document),
    };

    tracing::debug!(
        pipelines = report.stages.total(),
        open_issues = report.issues.open,
        orphaned = report.issues.orphaned.len(),
        "Aggregated document"
    );

    report
}

fn summarize_issues(document: &Document) -> IssueSummary {
    let mut summary = IssueSummary {
        total: document.issues.len(),
        ..IssueSummary::default()
    };
    let mut positions: HashMap<String, usize> = HashMap::new();

    for issue in &document.issues {
        match issue.status {
            IssueStatus::Open => {}
            IssueStatus::Blocked => summary.blocked += 1,
            IssueStatus::Resolved => summary.resolved += 1,
        }

        let orphaned = !document.has_pipeline_named(&issue.linked_pipeline);
        if orphaned {
            summary.orphaned.push(OrphanedIssue {
                id: issue.id,
                title: issue.title.clone(),
                linked_pipeline: issue.linked_pipeline.clone(),
                status: issue.status,
            });
        }

        if !issue.status.is_open() {
            continue;
        }

        summary.open += 1;
        summary.open_blocked_days += u64::from(issue.blocked_days);

        let index = *positions
            .entry(name_key(&issue.linked_pipeline))
            .or_insert_with(|| {
                summary.per_pipeline.push(PipelineIssues {
                    pipeline_name: issue.linked_pipeline.trim().to_string(),
                    open: 0,
                    blocked_days: 0,
                    orphaned,
                });
                summary.per_pipeline.len() - 1
            });
        let entry = &mut summary.per_pipeline[index];
        entry.open += 1;
        entry.blocked_days += u64::from(issue.blocked_days);
    }

    summary
}

fn summarize_contacts(document: &Document) -> ContactSummary {
    let mut summary = ContactSummary::default();
    // team labels compare like names; the first spelling seen is shown
    let mut teams: HashMap<(ContactRole, String), usize> = HashMap::new();

    for contact in &document.contacts {
        match contact.role {
            ContactRole::Producer => summary.producer += 1,
            ContactRole::Internal => summary.internal += 1,
        }
        let index = *teams
            .entry((contact.role, name_key(&contact.team)))
            .or_insert_with(|| {
                summary.by_team.push(TeamCount {
                    role: contact.role,
                    team: contact.team.trim().to_string(),
                    count: 0,
                });
                summary.by_team.len() - 1
            });
        summary.by_team[index].count += 1;
    }

    summary.by_team.sort_by(|a, b| {
        a.role
            .cmp(&b.role)
            .then_with(|| name_key(&a.team).cmp(&name_key(&b.team)))
    });

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contact::Contact;
    use crate::domain::issue::Issue;
    use crate::domain::pipeline::{
        BatchDetails, Frequency, Pipeline, PipelineBase, StreamingDetails,
    };
    use chrono::{NaiveDate, NaiveTime};

    fn batch(name: &str, uat_status: &str, prod_status: &str) -> Pipeline {
        Pipeline::batch(
            PipelineBase::new(name, "data.csv", "Monday").with_statuses(uat_status, prod_status),
            BatchDetails {
                frequency: Frequency::Daily,
                run_timestamp: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                file_size_mb: 50.0,
            },
        )
    }

    fn streaming(name: &str, uat_status: &str) -> Pipeline {
        Pipeline::streaming(
            PipelineBase::new(name, "events.json", "Daily").with_statuses(uat_status, ""),
            StreamingDetails {
                start_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(23, 59, 0).unwrap(),
                rough_volume_mb: 2000.0,
            },
        )
    }

    fn issue(title: &str, linked: &str, status: IssueStatus, blocked_days: u32) -> Issue {
        let mut issue = Issue::new(title, linked, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        issue.status = status;
        issue.blocked_days = blocked_days;
        issue
    }

    #[test]
    fn test_empty_document_is_all_zero() {
        let report = aggregate(&Document::default());

        assert_eq!(report.stages, StageCounts::default());
        assert_eq!(report.kinds, KindCounts::default());
        assert_eq!(report.issues, IssueSummary::default());
        assert_eq!(report.contacts, ContactSummary::default());
        assert_eq!(report.distribution.len(), 4);
        assert!(
            report
                .distribution
                .iter()
                .all(|row| row.batch == 0 && row.streaming == 0)
        );
    }

    #[test]
    fn test_mixed_document_scenario() {
        let mut document = Document::default();
        document.batch_pipelines.push(batch("Weekly Inventory", "In Progress", ""));
        document.streaming_pipelines.push(streaming("User Analytics", "Completed"));

        let report = aggregate(&document);

        assert_eq!(
            report.stages,
            StageCounts {
                planned: 0,
                uat: 1,
                production: 1,
                finalized: 0,
            }
        );
        assert_eq!(report.kinds, KindCounts { batch: 1, streaming: 1 });
        assert_eq!(
            report.distribution[1],
            DistributionRow {
                stage: Stage::Uat,
                batch: 1,
                streaming: 0,
            }
        );
        assert_eq!(
            report.distribution[2],
            DistributionRow {
                stage: Stage::Production,
                batch: 0,
                streaming: 1,
            }
        );
    }

    #[test]
    fn test_stage_counts_sum_to_pipeline_count() {
        let mut document = Document::default();
        let statuses = ["draft", "uat", "completed", "", "signed off", "testing", "prod"];
        for (i, status) in statuses.iter().enumerate() {
            document.batch_pipelines.push(batch(&format!("b{i}"), status, ""));
            document.streaming_pipelines.push(streaming(&format!("s{i}"), status));
        }

        let report = aggregate(&document);

        assert_eq!(report.stages.total(), document.pipeline_count());
        assert_eq!(report.kinds.total(), document.pipeline_count());
        let distributed: usize = report
            .distribution
            .iter()
            .map(|row| row.batch + row.streaming)
            .sum();
        assert_eq!(distributed, document.pipeline_count());
    }

    #[test]
    fn test_prod_status_takes_precedence() {
        let mut document = Document::default();
        document.batch_pipelines.push(batch("a", "In Progress", "In production"));

        let report = aggregate(&document);
        assert_eq!(report.stages.production, 1);
        assert_eq!(report.stages.uat, 0);
    }

    #[test]
    fn test_open_issues_and_blocked_days() {
        let mut document = Document::default();
        document.batch_pipelines.push(batch("Daily Sales", "uat", ""));
        document.issues.push(issue("Delay", "Daily Sales", IssueStatus::Blocked, 4));
        document.issues.push(issue("Schema", "daily sales", IssueStatus::Open, 1));
        document.issues.push(issue("Old", "Daily Sales", IssueStatus::Resolved, 9));

        let report = aggregate(&document);

        assert_eq!(report.issues.total, 3);
        assert_eq!(report.issues.open, 2);
        assert_eq!(report.issues.blocked, 1);
        assert_eq!(report.issues.resolved, 1);
        assert_eq!(report.issues.open_blocked_days, 5);
        assert_eq!(
            report.issues.per_pipeline,
            vec![PipelineIssues {
                pipeline_name: "Daily Sales".to_string(),
                open: 2,
                blocked_days: 5,
                orphaned: false,
            }]
        );
        assert!(report.issues.orphaned.is_empty());
    }

    #[test]
    fn test_dangling_issue_is_reported_as_orphaned() {
        let mut document = Document::default();
        document.streaming_pipelines.push(streaming("Live Sensor Data", "uat"));
        let dangling = issue("Access blocked", "Removed Pipeline", IssueStatus::Blocked, 2);
        let dangling_id = dangling.id;
        document.issues.push(dangling);

        let report = aggregate(&document);

        assert_eq!(report.issues.orphaned.len(), 1);
        assert_eq!(report.issues.orphaned[0].id, dangling_id);
        assert_eq!(report.issues.orphaned[0].linked_pipeline, "Removed Pipeline");
        assert!(report.issues.per_pipeline[0].orphaned);
        assert_eq!(report.issues.open_blocked_days, 2);
    }

    #[test]
    fn test_contact_engagement() {
        let mut document = Document::default();
        document.contacts.push(Contact::new("Alice", ContactRole::Producer, "Tech"));
        document.contacts.push(Contact::new("Bob", ContactRole::Producer, "Tech"));
        document.contacts.push(Contact::new("Eve", ContactRole::Producer, "Business"));
        document.contacts.push(Contact::new("Charlie", ContactRole::Internal, "Tech"));

        let report = aggregate(&document);

        assert_eq!(report.contacts.producer, 3);
        assert_eq!(report.contacts.internal, 1);
        assert_eq!(
            report.contacts.by_team,
            vec![
                TeamCount {
                    role: ContactRole::Producer,
                    team: "Business".to_string(),
                    count: 1,
                },
                TeamCount {
                    role: ContactRole::Producer,
                    team: "Tech".to_string(),
                    count: 2,
                },
                TeamCount {
                    role: ContactRole::Internal,
                    team: "Tech".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn test_team_labels_group_case_insensitively() {
        let mut document = Document::default();
        document.contacts.push(Contact::new("Alice", ContactRole::Producer, "Tech"));
        document.contacts.push(Contact::new("Bob", ContactRole::Producer, " tech "));
        document.contacts.push(Contact::new("Eve", ContactRole::Producer, "TECH"));

        let report = aggregate(&document);

        assert_eq!(
            report.contacts.by_team,
            vec![TeamCount {
                role: ContactRole::Producer,
                team: "Tech".to_string(),
                count: 3,
            }]
        );
    }

    #[test]
    fn test_custom_rules_change_counts() {
        let mut document = Document::default();
        document.batch_pipelines.push(batch("a", "live", ""));

        let rules = ClassificationRules::from_json(
            r#"{ "rules": [ { "stage": "Production", "keywords": ["live"] } ] }"#,
        )
        .unwrap();

        assert_eq!(aggregate(&document).stages.finalized, 1);
        assert_eq!(aggregate_with(&document, &rules).stages.production, 1);
    }
}
