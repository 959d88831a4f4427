//! Pipeline domain types

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ValidationError, name_key, time_of_day};

/// The two shapes a pipeline record can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Batch,
    Streaming,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [PipelineKind::Batch, PipelineKind::Streaming];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Batch => "batch",
            PipelineKind::Streaming => "streaming",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" => Ok(PipelineKind::Batch),
            "streaming" | "stream" => Ok(PipelineKind::Streaming),
            other => Err(format!(
                "unknown pipeline kind '{}' (expected batch or streaming)",
                other
            )),
        }
    }
}

/// How often a batch pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Other,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Other => write!(f, "other"),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "other" => Ok(Frequency::Other),
            other => Err(format!("unknown frequency '{}'", other)),
        }
    }
}

/// Fields shared by every pipeline regardless of kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineBase {
    pub pipeline_name: String,
    pub data_name: String,
    /// Day-of-week or day-of-month descriptor, e.g. "Monday" or "Weekdays"
    pub run_day: String,
    #[serde(default)]
    pub uat_date: Option<NaiveDate>,
    #[serde(default)]
    pub prod_date: Option<NaiveDate>,
    #[serde(default)]
    pub uat_status: String,
    #[serde(default)]
    pub prod_status: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl PipelineBase {
    pub fn new(
        pipeline_name: impl Into<String>,
        data_name: impl Into<String>,
        run_day: impl Into<String>,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            data_name: data_name.into(),
            run_day: run_day.into(),
            uat_date: None,
            prod_date: None,
            uat_status: String::new(),
            prod_status: String::new(),
            comment: None,
        }
    }

    pub fn with_statuses(mut self, uat_status: impl Into<String>, prod_status: impl Into<String>) -> Self {
        self.uat_status = uat_status.into();
        self.prod_status = prod_status.into();
        self
    }
}

/// Batch-only fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDetails {
    pub frequency: Frequency,
    #[serde(with = "time_of_day")]
    pub run_timestamp: NaiveTime,
    pub file_size_mb: f64,
}

/// Streaming-only fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingDetails {
    #[serde(with = "time_of_day")]
    pub start_time: NaiveTime,
    #[serde(with = "time_of_day")]
    pub end_time: NaiveTime,
    pub rough_volume_mb: f64,
}

impl StreamingDetails {
    /// Whether the run window ends on the following day
    pub fn crosses_midnight(&self) -> bool {
        self.end_time < self.start_time
    }
}

/// Kind-specific payload of a pipeline
///
/// Serialized inline next to the base fields; the field set decides the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipelineDetails {
    Batch(BatchDetails),
    Streaming(StreamingDetails),
}

/// Pipeline record
///
/// Owned by the document; mutated only by full-record replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(flatten)]
    pub base: PipelineBase,
    #[serde(flatten)]
    pub details: PipelineDetails,
}

impl Pipeline {
    pub fn batch(base: PipelineBase, details: BatchDetails) -> Self {
        Self {
            base,
            details: PipelineDetails::Batch(details),
        }
    }

    pub fn streaming(base: PipelineBase, details: StreamingDetails) -> Self {
        Self {
            base,
            details: PipelineDetails::Streaming(details),
        }
    }

    pub fn kind(&self) -> PipelineKind {
        match self.details {
            PipelineDetails::Batch(_) => PipelineKind::Batch,
            PipelineDetails::Streaming(_) => PipelineKind::Streaming,
        }
    }

    pub fn name(&self) -> &str {
        &self.base.pipeline_name
    }

    pub fn name_key(&self) -> String {
        name_key(&self.base.pipeline_name)
    }

    /// Check the field invariants of this record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base.pipeline_name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        let (field, value) = match &self.details {
            PipelineDetails::Batch(batch) => ("file_size_mb", batch.file_size_mb),
            PipelineDetails::Streaming(streaming) => ("rough_volume_mb", streaming.rough_volume_mb),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidQuantity { field, value });
        }

        Ok(())
    }
}
