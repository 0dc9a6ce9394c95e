//! Integration — an external assistant or service bridged by the server.
//!
//! `status` (activation) and `connected` are independent: an integration
//! can be connected but deactivated.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Activation state of an integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Active,
    #[default]
    Inactive,
    Error,
}

impl IntegrationStatus {
    /// Only inactive integrations offer "activate"; the rest offer "deactivate".
    #[must_use]
    pub fn can_activate(self) -> bool {
        self == Self::Inactive
    }
}

/// An integration as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub status: IntegrationStatus,
    #[serde(default)]
    pub connected: bool,
}

/// Connected / total counters shown above the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub connected_count: usize,
    pub total_count: usize,
}

/// Request payload for creating an integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIntegration {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<String>>,
}

impl NewIntegration {
    /// Build a request from form input, splitting the comma-separated
    /// `features` and `commands` lists.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank.
    pub fn from_form(
        name: &str,
        description: &str,
        features: &str,
        commands: &str,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            features: split_list(features),
            commands: split_list(commands),
        })
    }
}

fn split_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
