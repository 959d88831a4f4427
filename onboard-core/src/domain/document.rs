//! Persisted document
//!
//! The full record set, stored and replaced as one unit. Insertion order of
//! every collection is kept for stable display.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use super::contact::Contact;
use super::issue::Issue;
use super::pipeline::{Pipeline, PipelineKind};
use super::{ValidationError, name_key};

/// All onboarding records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    pub batch_pipelines: Vec<Pipeline>,
    pub streaming_pipelines: Vec<Pipeline>,
    pub contacts: Vec<Contact>,
    pub issues: Vec<Issue>,
}

impl Document {
    pub fn pipelines(&self, kind: PipelineKind) -> &[Pipeline] {
        match kind {
            PipelineKind::Batch => &self.batch_pipelines,
            PipelineKind::Streaming => &self.streaming_pipelines,
        }
    }

    pub fn pipelines_mut(&mut self, kind: PipelineKind) -> &mut Vec<Pipeline> {
        match kind {
            PipelineKind::Batch => &mut self.batch_pipelines,
            PipelineKind::Streaming => &mut self.streaming_pipelines,
        }
    }

    /// Batch pipelines followed by streaming pipelines
    pub fn all_pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.batch_pipelines
            .iter()
            .chain(self.streaming_pipelines.iter())
    }

    pub fn pipeline_count(&self) -> usize {
        self.batch_pipelines.len() + self.streaming_pipelines.len()
    }

    pub fn find_pipeline(&self, kind: PipelineKind, name: &str) -> Option<&Pipeline> {
        let key = name_key(name);
        self.pipelines(kind).iter().find(|p| p.name_key() == key)
    }

    pub(crate) fn pipeline_position(&self, kind: PipelineKind, name: &str) -> Option<usize> {
        let key = name_key(name);
        self.pipelines(kind).iter().position(|p| p.name_key() == key)
    }

    /// Whether any pipeline of either kind carries this name
    pub fn has_pipeline_named(&self, name: &str) -> bool {
        let key = name_key(name);
        self.all_pipelines().any(|p| p.name_key() == key)
    }

    pub fn find_issue(&self, id: Uuid) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// Give every id-less issue its derived id
    pub fn assign_missing_issue_ids(&mut self) {
        for (position, issue) in self.issues.iter_mut().enumerate() {
            if issue.id.is_nil() {
                issue.id = issue.derived_id(position);
            }
        }
    }

    /// Structural check: every collection holds only its own kind of pipeline
    pub fn check_structure(&self) -> Result<(), ValidationError> {
        for kind in PipelineKind::ALL {
            if let Some(pipeline) = self.pipelines(kind).iter().find(|p| p.kind() != kind) {
                return Err(ValidationError::KindMismatch {
                    name: pipeline.name().to_string(),
                    expected: kind,
                    found: pipeline.kind(),
                });
            }
        }
        Ok(())
    }

    /// Full invariant check over every record
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check_structure()?;

        for kind in PipelineKind::ALL {
            let mut seen = HashSet::new();
            for pipeline in self.pipelines(kind) {
                pipeline.validate()?;
                if !seen.insert(pipeline.name_key()) {
                    return Err(ValidationError::DuplicateName {
                        kind,
                        name: pipeline.name().to_string(),
                    });
                }
            }
        }

        for contact in &self.contacts {
            contact.validate()?;
        }
        for issue in &self.issues {
            issue.validate()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::{BatchDetails, Frequency, PipelineBase};
    use chrono::NaiveTime;

    fn batch(name: &str) -> Pipeline {
        Pipeline::batch(
            PipelineBase::new(name, "data.csv", "Monday"),
            BatchDetails {
                frequency: Frequency::Weekly,
                run_timestamp: NaiveTime::from_hms_opt(15, 30, 0).unwrap(),
                file_size_mb: 120.0,
            },
        )
    }

    #[test]
    fn test_empty_document_is_valid() {
        let document = Document::default();
        assert!(document.validate().is_ok());
        assert_eq!(document.pipeline_count(), 0);
    }

    #[test]
    fn test_validate_detects_duplicate_names_case_insensitively() {
        let mut document = Document::default();
        document.batch_pipelines.push(batch("Weekly Inventory"));
        document.batch_pipelines.push(batch("weekly inventory "));

        assert!(matches!(
            document.validate(),
            Err(ValidationError::DuplicateName {
                kind: PipelineKind::Batch,
                ..
            })
        ));
    }

    #[test]
    fn test_check_structure_detects_misplaced_record() {
        let mut document = Document::default();
        document.streaming_pipelines.push(batch("Weekly Inventory"));

        assert!(matches!(
            document.check_structure(),
            Err(ValidationError::KindMismatch {
                expected: PipelineKind::Streaming,
                found: PipelineKind::Batch,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_collection_is_rejected() {
        let json = r#"{
            "batch_pipelines": [],
            "streaming_pipelines": [],
            "contacts": [],
            "issues": [],
            "Level1Groups": []
        }"#;
        assert!(serde_json::from_str::<Document>(json).is_err());
    }

    #[test]
    fn test_find_pipeline_by_name() {
        let mut document = Document::default();
        document.batch_pipelines.push(batch("Daily Sales Report"));

        assert!(document.find_pipeline(PipelineKind::Batch, "daily sales report").is_some());
        assert!(document.find_pipeline(PipelineKind::Streaming, "Daily Sales Report").is_none());
        assert!(document.has_pipeline_named("DAILY SALES REPORT"));
    }
}
