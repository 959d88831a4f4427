//! Status classification
//!
//! Maps free-text status strings to one of the four onboarding stages using an
//! ordered keyword rule list. Matching is a case-insensitive substring test and
//! the first matching rule wins; text no rule matches falls back to a fixed
//! stage. Classification never fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::domain::pipeline::Pipeline;

/// Canonical onboarding stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Planned,
    #[serde(rename = "UAT")]
    Uat,
    Production,
    Finalized,
}

impl Stage {
    /// Display order used by reports
    pub const ALL: [Stage; 4] = [Stage::Planned, Stage::Uat, Stage::Production, Stage::Finalized];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Planned => write!(f, "Planned"),
            Stage::Uat => write!(f, "UAT"),
            Stage::Production => write!(f, "Production"),
            Stage::Finalized => write!(f, "Finalized"),
        }
    }
}

/// One keyword rule: any keyword found in the status selects `stage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRule {
    pub stage: Stage,
    pub keywords: Vec<String>,
}

impl StageRule {
    pub fn new(stage: Stage, keywords: &[&str]) -> Self {
        Self {
            stage,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// `status` must already be lowercased
    fn matches(&self, status: &str) -> bool {
        self.keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .any(|keyword| !keyword.is_empty() && status.contains(&keyword))
    }
}

/// Ordered rule set
///
/// Can be loaded from JSON to swap the keyword table without a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRules {
    pub rules: Vec<StageRule>,
    #[serde(default = "default_fallback")]
    pub fallback: Stage,
}

fn default_fallback() -> Stage {
    Stage::Finalized
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            rules: vec![
                StageRule::new(Stage::Planned, &["plan", "draft", "planned"]),
                StageRule::new(Stage::Uat, &["uat", "testing", "in progress"]),
                StageRule::new(Stage::Production, &["prod", "production", "completed"]),
            ],
            fallback: default_fallback(),
        }
    }
}

impl ClassificationRules {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Classify a status string
    ///
    /// Empty text matches no rule and yields the fallback stage.
    pub fn classify(&self, status: &str) -> Stage {
        let status = status.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&status))
            .map(|rule| rule.stage)
            .unwrap_or(self.fallback)
    }

    /// Stage a pipeline is counted under
    ///
    /// The UAT status decides, except that a PROD status classifying as
    /// `Production` overrides it.
    pub fn effective_stage(&self, pipeline: &Pipeline) -> Stage {
        let prod_status = pipeline.base.prod_status.trim();
        if !prod_status.is_empty() && self.classify(prod_status) == Stage::Production {
            return Stage::Production;
        }
        self.classify(&pipeline.base.uat_status)
    }
}

static DEFAULT_RULES: LazyLock<ClassificationRules> = LazyLock::new(ClassificationRules::default);

/// Classify with the default rule set
pub fn classify(status: &str) -> Stage {
    DEFAULT_RULES.classify(status)
}

/// Effective stage of a pipeline under the default rule set
pub fn effective_stage(pipeline: &Pipeline) -> Stage {
    DEFAULT_RULES.effective_stage(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::{BatchDetails, Frequency, PipelineBase};
    use chrono::NaiveTime;

    fn pipeline_with(uat_status: &str, prod_status: &str) -> Pipeline {
        Pipeline::batch(
            PipelineBase::new("p", "d", "Monday").with_statuses(uat_status, prod_status),
            BatchDetails {
                frequency: Frequency::Daily,
                run_timestamp: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                file_size_mb: 1.0,
            },
        )
    }

    #[test]
    fn test_each_rule_in_order() {
        assert_eq!(classify("Draft"), Stage::Planned);
        assert_eq!(classify("planned for Q3"), Stage::Planned);
        assert_eq!(classify("UAT sign-off pending"), Stage::Uat);
        assert_eq!(classify("testing"), Stage::Uat);
        assert_eq!(classify("In Progress"), Stage::Uat);
        assert_eq!(classify("Live in PROD"), Stage::Production);
        assert_eq!(classify("Completed"), Stage::Production);
        assert_eq!(classify("signed off"), Stage::Finalized);
    }

    #[test]
    fn test_uat_without_production_keywords_is_uat() {
        for status in ["uat", "UAT", "Uat round 2", "waiting on uAt data", "in UAT"] {
            assert_eq!(classify(status), Stage::Uat, "status: {status}");
        }
    }

    #[test]
    fn test_planned_wins_over_production() {
        assert_eq!(classify("planned for production"), Stage::Planned);
        assert_eq!(classify("draft prod config"), Stage::Planned);
    }

    #[test]
    fn test_uat_wins_over_production() {
        assert_eq!(classify("uat completed"), Stage::Uat);
    }

    #[test]
    fn test_empty_status_is_finalized() {
        assert_eq!(classify(""), Stage::Finalized);
        assert_eq!(classify("   "), Stage::Finalized);
    }

    #[test]
    fn test_production_status_overrides_uat() {
        let rules = ClassificationRules::default();
        assert_eq!(rules.effective_stage(&pipeline_with("In Progress", "")), Stage::Uat);
        assert_eq!(
            rules.effective_stage(&pipeline_with("In Progress", "Production")),
            Stage::Production
        );
        assert_eq!(
            rules.effective_stage(&pipeline_with("completed", "planned")),
            Stage::Production
        );
        assert_eq!(
            rules.effective_stage(&pipeline_with("draft", "in progress")),
            Stage::Planned
        );
    }

    #[test]
    fn test_custom_rules_from_json() {
        let rules = ClassificationRules::from_json(
            r#"{
                "rules": [
                    { "stage": "Production", "keywords": ["live"] },
                    { "stage": "UAT", "keywords": ["qa"] }
                ],
                "fallback": "Planned"
            }"#,
        )
        .unwrap();

        assert_eq!(rules.classify("LIVE since May"), Stage::Production);
        assert_eq!(rules.classify("in qa"), Stage::Uat);
        assert_eq!(rules.classify("completed"), Stage::Planned);
    }

    #[test]
    fn test_blank_keyword_never_matches() {
        let rules = ClassificationRules {
            rules: vec![StageRule::new(Stage::Planned, &[""])],
            fallback: Stage::Finalized,
        };
        assert_eq!(rules.classify("anything"), Stage::Finalized);
    }
}
