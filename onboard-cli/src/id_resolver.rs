//! ID resolver module
//!
//! Lets users name an issue by a short, unambiguous prefix of its UUID
//! instead of the full identifier.

use anyhow::{Result, anyhow};
use onboard_core::domain::issue::Issue;
use uuid::Uuid;

/// Identifier that can be either a full UUID or a prefix of one
#[derive(Debug, Clone, PartialEq)]
pub enum IdOrPrefix {
    Full(Uuid),
    Prefix(String),
}

impl IdOrPrefix {
    /// Parse an identifier
    ///
    /// Tries a full UUID first; anything else is kept as a lowercase prefix.
    ///
    /// # Arguments
    /// * `input` - The text the user typed
    pub fn parse(input: &str) -> Self {
        match Uuid::parse_str(input.trim()) {
            Ok(uuid) => IdOrPrefix::Full(uuid),
            Err(_) => IdOrPrefix::Prefix(input.trim().to_lowercase()),
        }
    }
}

/// Resolve an issue ID or prefix to a full UUID
///
/// If the input is already a full UUID, returns it immediately.
/// Otherwise, finds the one issue whose ID starts with the prefix.
///
/// # Arguments
/// * `issues` - The issues on the board
/// * `input` - The ID or prefix to resolve
///
/// # Returns
/// The resolved UUID
///
/// # Errors
/// Returns an error if:
/// - The input is empty
/// - No issue matches the prefix
/// - Multiple issues match the prefix (ambiguous)
pub fn resolve_issue_id(issues: &[Issue], input: &str) -> Result<Uuid> {
    let prefix = match IdOrPrefix::parse(input) {
        IdOrPrefix::Full(uuid) => return Ok(uuid),
        IdOrPrefix::Prefix(prefix) if prefix.is_empty() => {
            return Err(anyhow!("Issue ID must not be empty"));
        }
        IdOrPrefix::Prefix(prefix) => prefix,
    };

    let matches: Vec<Uuid> = issues
        .iter()
        .map(|issue| issue.id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!("No issue found with ID starting with '{}'", prefix)),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple issues: {}",
                prefix,
                ids.join(", ")
            ))
        }
    }
}
