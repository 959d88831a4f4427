//! Board service
//!
//! Owns the loaded document together with its store. Every mutation is
//! validated, applied, and saved as one step; when any part fails the
//! in-memory document is restored, so it always mirrors what is on disk.

use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::aggregate::{Report, aggregate_with};
use crate::classify::ClassificationRules;
use crate::domain::contact::Contact;
use crate::domain::document::Document;
use crate::domain::issue::{Issue, IssueStatus};
use crate::domain::pipeline::{Pipeline, PipelineKind};
use crate::domain::{ValidationError, name_key};
use crate::ingest::{IngestOutcome, RawRow, ingest};
use crate::store::{DocumentStore, StoreError, decode};

/// Board operation errors
#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{what} '{name}' already exists")]
    DuplicateName { what: String, name: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, BoardError>;

/// The onboarding board: one document, one store, one writer
#[derive(Debug)]
pub struct Board {
    store: DocumentStore,
    document: Document,
}

impl Board {
    /// Load the board from its store
    ///
    /// Only structural checks run here. A stored document that breaks record
    /// invariants still opens, but every mutation is refused until the change
    /// leaves it valid again, e.g. removing one of two duplicate pipelines.
    pub fn open(store: DocumentStore) -> std::result::Result<Self, StoreError> {
        let document = store.load()?;
        Ok(Self { store, document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Discard in-memory state and read the store again
    pub fn reload(&mut self) -> std::result::Result<(), StoreError> {
        self.document = self.store.load()?;
        Ok(())
    }

    /// Apply a change and persist it, rolling back on any failure
    fn apply<T>(&mut self, change: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let previous = self.document.clone();

        let value = match change(&mut self.document) {
            Ok(value) => value,
            Err(err) => {
                self.document = previous;
                return Err(err);
            }
        };

        // the stored document may already have been invalid when opened
        if let Err(err) = self.document.validate() {
            tracing::warn!(error = %err, "Document invalid after change, rolling back");
            self.document = previous;
            return Err(err.into());
        }

        if let Err(err) = self.store.save(&self.document) {
            tracing::error!(error = %err, "Save failed, rolling back");
            self.document = previous;
            return Err(err.into());
        }

        Ok(value)
    }

    // =========================================================================
    // Pipelines
    // =========================================================================

    /// Add a single pipeline to its kind's collection
    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Result<()> {
        pipeline.validate()?;
        let kind = pipeline.kind();

        self.apply(|document| {
            if document.find_pipeline(kind, pipeline.name()).is_some() {
                return Err(duplicate_pipeline(kind, pipeline.name()));
            }
            tracing::info!(%kind, name = pipeline.name(), "Adding pipeline");
            document.pipelines_mut(kind).push(pipeline);
            Ok(())
        })
    }

    /// Replace a whole pipeline record, keeping its position
    ///
    /// The replacement may rename the pipeline but must keep its kind.
    pub fn replace_pipeline(
        &mut self,
        kind: PipelineKind,
        name: &str,
        pipeline: Pipeline,
    ) -> Result<()> {
        pipeline.validate()?;
        if pipeline.kind() != kind {
            return Err(ValidationError::KindMismatch {
                name: pipeline.name().to_string(),
                expected: kind,
                found: pipeline.kind(),
            }
            .into());
        }

        self.apply(|document| {
            let index = document
                .pipeline_position(kind, name)
                .ok_or_else(|| pipeline_not_found(kind, name))?;

            let renamed_onto_other = document
                .pipeline_position(kind, pipeline.name())
                .is_some_and(|other| other != index);
            if renamed_onto_other {
                return Err(duplicate_pipeline(kind, pipeline.name()));
            }

            tracing::info!(%kind, name, "Replacing pipeline");
            document.pipelines_mut(kind)[index] = pipeline;
            Ok(())
        })
    }

    /// Remove a pipeline; issues linked to it are kept
    pub fn remove_pipeline(&mut self, kind: PipelineKind, name: &str) -> Result<Pipeline> {
        self.apply(|document| {
            let index = document
                .pipeline_position(kind, name)
                .ok_or_else(|| pipeline_not_found(kind, name))?;
            tracing::info!(%kind, name, "Removing pipeline");
            Ok(document.pipelines_mut(kind).remove(index))
        })
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Validate uploaded rows against the current collection without saving
    pub fn preview_ingest(&self, kind: PipelineKind, rows: Vec<RawRow>) -> IngestOutcome {
        ingest(rows, kind, self.document.pipelines(kind))
    }

    /// Append previewed records
    ///
    /// Records are checked again against the current document; if any fails,
    /// nothing is committed.
    pub fn commit(&mut self, kind: PipelineKind, accepted: Vec<Pipeline>) -> Result<usize> {
        self.apply(|document| {
            let count = accepted.len();
            for pipeline in accepted {
                pipeline.validate()?;
                if pipeline.kind() != kind {
                    return Err(ValidationError::KindMismatch {
                        name: pipeline.name().to_string(),
                        expected: kind,
                        found: pipeline.kind(),
                    }
                    .into());
                }
                if document.find_pipeline(kind, pipeline.name()).is_some() {
                    return Err(duplicate_pipeline(kind, pipeline.name()));
                }
                document.pipelines_mut(kind).push(pipeline);
            }
            tracing::info!(%kind, count, "Committing ingested pipelines");
            Ok(count)
        })
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    pub fn add_contact(&mut self, contact: Contact) -> Result<()> {
        contact.validate()?;

        self.apply(|document| {
            let key = contact.name_key();
            if document.contacts.iter().any(|c| c.name_key() == key) {
                return Err(BoardError::DuplicateName {
                    what: "contact".to_string(),
                    name: contact.name.clone(),
                });
            }
            tracing::info!(name = %contact.name, role = %contact.role, "Adding contact");
            document.contacts.push(contact);
            Ok(())
        })
    }

    pub fn remove_contact(&mut self, name: &str) -> Result<Contact> {
        self.apply(|document| {
            let key = name_key(name);
            let index = document
                .contacts
                .iter()
                .position(|c| c.name_key() == key)
                .ok_or_else(|| BoardError::NotFound(format!("contact '{}'", name)))?;
            tracing::info!(name, "Removing contact");
            Ok(document.contacts.remove(index))
        })
    }

    // =========================================================================
    // Issues
    // =========================================================================

    /// Record an issue; a link to an unknown pipeline is allowed
    pub fn add_issue(&mut self, issue: Issue) -> Result<Uuid> {
        issue.validate()?;

        self.apply(|document| {
            if document.find_issue(issue.id).is_some() {
                return Err(BoardError::DuplicateName {
                    what: "issue".to_string(),
                    name: issue.id.to_string(),
                });
            }
            if !document.has_pipeline_named(&issue.linked_pipeline) {
                tracing::warn!(
                    linked_pipeline = %issue.linked_pipeline,
                    "Issue links to a pipeline that is not on the board"
                );
            }
            let id = issue.id;
            tracing::info!(%id, title = %issue.title, "Adding issue");
            document.issues.push(issue);
            Ok(id)
        })
    }

    /// Move an issue to a new status, optionally updating its blocked-day count
    pub fn set_issue_status(
        &mut self,
        id: Uuid,
        status: IssueStatus,
        blocked_days: Option<u32>,
    ) -> Result<Issue> {
        self.apply(|document| {
            let issue = document
                .issues
                .iter_mut()
                .find(|issue| issue.id == id)
                .ok_or_else(|| BoardError::NotFound(format!("issue {}", id)))?;
            issue.status = status;
            if let Some(days) = blocked_days {
                issue.blocked_days = days;
            }
            tracing::info!(%id, %status, "Updated issue status");
            Ok(issue.clone())
        })
    }

    pub fn remove_issue(&mut self, id: Uuid) -> Result<Issue> {
        self.apply(|document| {
            let index = document
                .issues
                .iter()
                .position(|issue| issue.id == id)
                .ok_or_else(|| BoardError::NotFound(format!("issue {}", id)))?;
            tracing::info!(%id, "Removing issue");
            Ok(document.issues.remove(index))
        })
    }

    // =========================================================================
    // Reporting and snapshots
    // =========================================================================

    pub fn report(&self, rules: &ClassificationRules) -> Report {
        aggregate_with(&self.document, rules)
    }

    pub fn export_snapshot(&self) -> std::result::Result<Vec<u8>, StoreError> {
        self.store.export_snapshot()
    }

    /// Replace the whole board with a snapshot
    ///
    /// The snapshot must pass the same structural checks as a load and the
    /// full record invariants before it is saved.
    pub fn restore(&mut self, snapshot: &[u8]) -> Result<()> {
        let restored = decode(snapshot, Path::new("snapshot"))?;
        restored.validate()?;

        self.apply(|document| {
            tracing::info!(
                pipelines = restored.pipeline_count(),
                contacts = restored.contacts.len(),
                issues = restored.issues.len(),
                "Restoring snapshot"
            );
            *document = restored;
            Ok(())
        })
    }
}

fn duplicate_pipeline(kind: PipelineKind, name: &str) -> BoardError {
    BoardError::DuplicateName {
        what: format!("{} pipeline", kind),
        name: name.to_string(),
    }
}

fn pipeline_not_found(kind: PipelineKind, name: &str) -> BoardError {
    BoardError::NotFound(format!("{} pipeline '{}'", kind, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Stage;
    use crate::domain::contact::ContactRole;
    use crate::domain::pipeline::{BatchDetails, Frequency, PipelineBase, StreamingDetails};
    use crate::ingest::columns::*;
    use chrono::{NaiveDate, NaiveTime};
    use std::fs;
    use tempfile::TempDir;

    fn batch(name: &str, uat_status: &str) -> Pipeline {
        Pipeline::batch(
            PipelineBase::new(name, "data.csv", "Monday").with_statuses(uat_status, ""),
            BatchDetails {
                frequency: Frequency::Monthly,
                run_timestamp: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                file_size_mb: 10.0,
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

    fn open_board(dir: &TempDir) -> Board {
        Board::open(DocumentStore::new(dir.path().join("onboard.json"))).unwrap()
    }

    #[test]
    fn test_added_pipeline_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);

        board.add_pipeline(batch("Daily Sales", "uat")).unwrap();

        let reopened = open_board(&dir);
        assert_eq!(reopened.document().batch_pipelines.len(), 1);
        assert_eq!(reopened.document(), board.document());
    }

    #[test]
    fn test_duplicate_pipeline_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(batch("Daily Sales", "uat")).unwrap();

        let err = board.add_pipeline(batch("DAILY SALES", "draft")).unwrap_err();

        assert!(matches!(err, BoardError::DuplicateName { .. }));
        assert_eq!(board.document().batch_pipelines.len(), 1);
    }

    #[test]
    fn test_same_name_in_other_kind_is_allowed() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);

        board.add_pipeline(batch("Orders", "uat")).unwrap();
        board.add_pipeline(streaming("Orders", "uat")).unwrap();

        assert_eq!(board.document().pipeline_count(), 2);
    }

    #[test]
    fn test_invalid_pipeline_never_reaches_the_store() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);

        let err = board.add_pipeline(batch("  ", "uat")).unwrap_err();

        assert!(matches!(err, BoardError::Validation(ValidationError::EmptyName)));
        assert!(!dir.path().join("onboard.json").exists());
    }

    #[test]
    fn test_replace_keeps_position_and_allows_rename() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(batch("First", "draft")).unwrap();
        board.add_pipeline(batch("Second", "draft")).unwrap();

        board
            .replace_pipeline(PipelineKind::Batch, "first", batch("First v2", "completed"))
            .unwrap();

        let names: Vec<&str> = board
            .document()
            .batch_pipelines
            .iter()
            .map(Pipeline::name)
            .collect();
        assert_eq!(names, vec!["First v2", "Second"]);
    }

    #[test]
    fn test_replace_cannot_collide_or_change_kind() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(batch("First", "draft")).unwrap();
        board.add_pipeline(batch("Second", "draft")).unwrap();

        assert!(matches!(
            board.replace_pipeline(PipelineKind::Batch, "First", batch("second", "uat")),
            Err(BoardError::DuplicateName { .. })
        ));
        assert!(matches!(
            board.replace_pipeline(PipelineKind::Batch, "First", streaming("First", "uat")),
            Err(BoardError::Validation(ValidationError::KindMismatch { .. }))
        ));
        assert!(matches!(
            board.replace_pipeline(PipelineKind::Batch, "Missing", batch("Missing", "uat")),
            Err(BoardError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_pipeline_leaves_orphaned_issue() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(streaming("Live Sensor Data", "uat")).unwrap();
        board
            .add_issue(Issue::new(
                "Access to UAT blocked",
                "Live Sensor Data",
                NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            ))
            .unwrap();

        let removed = board
            .remove_pipeline(PipelineKind::Streaming, "live sensor data")
            .unwrap();

        assert_eq!(removed.name(), "Live Sensor Data");
        assert_eq!(board.document().issues.len(), 1);
        let report = board.report(&ClassificationRules::default());
        assert_eq!(report.issues.orphaned.len(), 1);
    }

    #[test]
    fn test_preview_then_commit() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(batch("Existing", "uat")).unwrap();

        let row = |line: u64, name: &str| {
            RawRow::new(line)
                .with(PIPELINE_NAME, name)
                .with(DATA_NAME, "x.csv")
                .with(FREQUENCY, "weekly")
                .with(RUN_DAY, "Friday")
                .with(RUN_TIMESTAMP, "15:30")
                .with(FILE_SIZE_MB, "120")
                .with(UAT_STATUS, "in progress")
        };
        let outcome = board.preview_ingest(
            PipelineKind::Batch,
            vec![row(2, "New"), row(3, "Existing")],
        );

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(board.document().batch_pipelines.len(), 1);

        let committed = board.commit(PipelineKind::Batch, outcome.accepted).unwrap();

        assert_eq!(committed, 1);
        assert_eq!(open_board(&dir).document().batch_pipelines.len(), 2);
    }

    #[test]
    fn test_stale_commit_is_all_or_nothing() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        let stale = vec![batch("A", "uat"), batch("B", "uat")];
        board.add_pipeline(batch("B", "draft")).unwrap();

        let err = board.commit(PipelineKind::Batch, stale).unwrap_err();

        assert!(matches!(err, BoardError::DuplicateName { .. }));
        assert_eq!(board.document().batch_pipelines.len(), 1);
        assert_eq!(open_board(&dir).document().batch_pipelines.len(), 1);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("nested");
        let mut board = Board::open(DocumentStore::new(nested.join("onboard.json"))).unwrap();
        fs::write(&nested, "").unwrap();

        let err = board.add_pipeline(batch("Daily Sales", "uat")).unwrap_err();

        assert!(matches!(err, BoardError::Store(StoreError::WriteFailure { .. })));
        assert_eq!(board.document(), &Document::default());
    }

    #[test]
    fn test_contacts() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board
            .add_contact(Contact::new("Alice", ContactRole::Producer, "Tech"))
            .unwrap();

        assert!(matches!(
            board.add_contact(Contact::new("alice", ContactRole::Internal, "Business")),
            Err(BoardError::DuplicateName { .. })
        ));

        let removed = board.remove_contact("ALICE").unwrap();
        assert_eq!(removed.name, "Alice");
        assert!(matches!(
            board.remove_contact("Alice"),
            Err(BoardError::NotFound(_))
        ));
    }

    #[test]
    fn test_issue_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(batch("Daily Sales", "uat")).unwrap();
        let id = board
            .add_issue(Issue::new(
                "Data delay from source",
                "Daily Sales",
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            ))
            .unwrap();

        let updated = board
            .set_issue_status(id, IssueStatus::Blocked, Some(3))
            .unwrap();
        assert_eq!(updated.status, IssueStatus::Blocked);
        assert_eq!(updated.blocked_days, 3);

        let report = board.report(&ClassificationRules::default());
        assert_eq!(report.issues.open_blocked_days, 3);

        board.set_issue_status(id, IssueStatus::Resolved, None).unwrap();
        let report = board.report(&ClassificationRules::default());
        assert_eq!(report.issues.open, 0);
        assert_eq!(report.issues.resolved, 1);

        board.remove_issue(id).unwrap();
        assert!(matches!(board.remove_issue(id), Err(BoardError::NotFound(_))));
    }

    #[test]
    fn test_restore_replaces_board_and_rejects_invalid_snapshots() {
        let source_dir = TempDir::new().unwrap();
        let mut source = open_board(&source_dir);
        source.add_pipeline(batch("Daily Sales", "completed")).unwrap();
        source.add_pipeline(streaming("User Analytics", "draft")).unwrap();
        let snapshot = source.export_snapshot().unwrap();

        let target_dir = TempDir::new().unwrap();
        let mut target = open_board(&target_dir);
        target.add_pipeline(batch("To Be Replaced", "uat")).unwrap();
        target.restore(&snapshot).unwrap();

        assert_eq!(target.document(), source.document());
        assert_eq!(target.export_snapshot().unwrap(), snapshot);

        let mut duplicated = source.document().clone();
        duplicated.batch_pipelines.push(batch("daily sales", "uat"));
        let bad = crate::store::encode(&duplicated).unwrap();
        assert!(matches!(
            target.restore(&bad),
            Err(BoardError::Validation(ValidationError::DuplicateName { .. }))
        ));
        assert!(matches!(
            target.restore(b"[]"),
            Err(BoardError::Store(StoreError::CorruptDocument { .. }))
        ));
        assert_eq!(target.document(), source.document());
    }

    #[test]
    fn test_report_reflects_board() {
        let dir = TempDir::new().unwrap();
        let mut board = open_board(&dir);
        board.add_pipeline(batch("Weekly Inventory", "In Progress")).unwrap();
        board.add_pipeline(streaming("User Analytics", "Completed")).unwrap();

        let report = board.report(&ClassificationRules::default());

        assert_eq!(report.stages.get(Stage::Uat), 1);
        assert_eq!(report.stages.get(Stage::Production), 1);
        assert_eq!(report.kinds.batch, 1);
        assert_eq!(report.kinds.streaming, 1);
    }

    #[test]
    fn test_invalid_stored_document_is_never_saved_again() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("onboard.json");
        let mut stored = Document::default();
        stored.batch_pipelines.push(batch("Dup", "uat"));
        stored.batch_pipelines.push(batch("Dup", "draft"));
        fs::write(&path, crate::store::encode(&stored).unwrap()).unwrap();
        let original = fs::read(&path).unwrap();

        let mut board = Board::open(DocumentStore::new(&path)).unwrap();
        let err = board
            .add_contact(Contact::new("Alice", ContactRole::Producer, "Tech"))
            .unwrap_err();

        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::DuplicateName { .. })
        ));
        assert!(board.document().contacts.is_empty());
        assert_eq!(fs::read(&path).unwrap(), original);

        board.remove_pipeline(PipelineKind::Batch, "Dup").unwrap();
        board
            .add_contact(Contact::new("Alice", ContactRole::Producer, "Tech"))
            .unwrap();

        let persisted = DocumentStore::new(&path).load().unwrap();
        assert!(persisted.validate().is_ok());
        assert_eq!(persisted.batch_pipelines.len(), 1);
    }
}
