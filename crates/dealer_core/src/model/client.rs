//! Client record.
//!
//! # Invariants
//! - Individuals carry a last name, companies a company name.
//! - `email`, when set, looks like an email address.

use super::{require_non_empty, validate_optional_email, Address, DocId, Document, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Legal nature of a client, which decides the mandatory name fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    Individual,
    Company,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: DocId,
    pub kind: ClientKind,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
    /// Intra-community VAT number, companies only.
    pub vat_number: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl Client {
    /// Creates an individual client with a generated ID.
    pub fn individual(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ClientKind::Individual,
            first_name: first_name.into(),
            last_name: last_name.into(),
            company_name: None,
            email: None,
            phone: None,
            address: None,
            vat_number: None,
            notes: String::new(),
        }
    }

    /// Creates a company client with a generated ID.
    pub fn company(company_name: impl Into<String>) -> Self {
        Self {
            kind: ClientKind::Company,
            company_name: Some(company_name.into()),
            ..Self::individual("", "")
        }
    }

    /// Name printed on billing documents.
    pub fn display_name(&self) -> String {
        match (self.kind, self.company_name.as_deref()) {
            (ClientKind::Company, Some(name)) => name.to_string(),
            _ => format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
        }
    }

    /// Case-insensitive match against names, email and phone.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            Some(self.first_name.as_str()),
            Some(self.last_name.as_str()),
            self.company_name.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
    }
}

impl Document for Client {
    const COLLECTION: &'static str = "clients";

    fn id(&self) -> DocId {
        self.id
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match self.kind {
            ClientKind::Individual => require_non_empty("last_name", &self.last_name)?,
            ClientKind::Company => {
                require_non_empty("company_name", self.company_name.as_deref().unwrap_or(""))?
            }
        }
        validate_optional_email("email", self.email.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::{Client, ClientKind};
    use crate::model::Document;

    #[test]
    fn individual_requires_last_name() {
        let client = Client::individual("Jeanne", "");
        assert_eq!(client.validate().unwrap_err().field, "last_name");
        assert!(Client::individual("Jeanne", "Martin").validate().is_ok());
    }

    #[test]
    fn company_requires_company_name_and_prints_it() {
        let company = Client::company("Garage du Port");
        assert_eq!(company.kind, ClientKind::Company);
        assert!(company.validate().is_ok());
        assert_eq!(company.display_name(), "Garage du Port");

        let unnamed = Client::company("  ");
        assert_eq!(unnamed.validate().unwrap_err().field, "company_name");
    }

    #[test]
    fn matches_is_case_insensitive_across_contact_fields() {
        let mut client = Client::individual("Jeanne", "Martin");
        client.email = Some("J.Martin@example.fr".to_string());
        assert!(client.matches("martin"));
        assert!(client.matches("EXAMPLE.fr"));
        assert!(!client.matches("durand"));
    }
}
