//! Contact domain types
//!
//! Contacts are linked to pipelines loosely, by name or team mentioned in a
//! pipeline's comment, never by a foreign key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ValidationError, name_key};

/// Which side of the onboarding a contact sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    /// Owner of the upstream data source
    Producer,
    /// Member of our own team
    Internal,
}

impl fmt::Display for ContactRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContactRole::Producer => write!(f, "producer"),
            ContactRole::Internal => write!(f, "internal"),
        }
    }
}

impl FromStr for ContactRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "producer" => Ok(ContactRole::Producer),
            "internal" | "ours" => Ok(ContactRole::Internal),
            other => Err(format!(
                "unknown contact role '{}' (expected producer or internal)",
                other
            )),
        }
    }
}

/// A person involved in onboarding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub role: ContactRole,
    /// Free-text team label, e.g. "Tech" or "Business"
    #[serde(default)]
    pub team: String,
    #[serde(default, alias = "email")]
    pub contact_info: String,
}

impl Contact {
    pub fn new(name: impl Into<String>, role: ContactRole, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            team: team.into(),
            contact_info: String::new(),
        }
    }

    pub fn name_key(&self) -> String {
        name_key(&self.name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyContactName);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_alias_is_read_as_contact_info() {
        let contact: Contact = serde_json::from_str(
            r#"{"name": "Alice", "role": "producer", "team": "Tech", "email": "alice@example.com"}"#,
        )
        .unwrap();
        assert_eq!(contact.contact_info, "alice@example.com");

        let value = serde_json::to_value(&contact).unwrap();
        assert_eq!(value["contact_info"], "alice@example.com");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Producer".parse::<ContactRole>(), Ok(ContactRole::Producer));
        assert_eq!("ours".parse::<ContactRole>(), Ok(ContactRole::Internal));
        assert!("vendor".parse::<ContactRole>().is_err());
    }

    #[test]
    fn test_validate_blank_name() {
        let contact = Contact::new(" ", ContactRole::Internal, "Tech");
        assert_eq!(contact.validate(), Err(ValidationError::EmptyContactName));
    }
}
