//! Strategy documents: the policy/prompt/constraint bundle an agent runs under.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strategy_state::StrategyRef;

use crate::domain::error::{LabError, Result};

/// Identity block of a strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyMetadata {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A strategy variant.
///
/// Only `metadata.id` and `metadata.version` are interpreted here; they form
/// the grouping key for episode summaries and the routing/promotion locator.
/// Everything else is carried through to the agent runtime untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Strategy {
    pub metadata: StrategyMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub constraints: serde_json::Value,
    #[serde(default)]
    pub policy: serde_json::Value,
}

impl Strategy {
    /// Create a strategy with only an identity.
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            metadata: StrategyMetadata {
                id: id.into(),
                version: version.into(),
                description: None,
            },
            prompt: None,
            constraints: serde_json::Value::Null,
            policy: serde_json::Value::Null,
        }
    }

    /// Set the system prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// The `(id, version)` grouping key.
    pub fn reference(&self) -> StrategyRef {
        StrategyRef::new(self.metadata.id.clone(), self.metadata.version.clone())
    }

    /// Parse and validate a strategy from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let strategy: Strategy = serde_json::from_str(json)?;
        strategy.validate()?;
        Ok(strategy)
    }

    /// Load a strategy from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&raw)
    }

    /// Reject strategies whose identity cannot serve as a grouping key.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.id.trim().is_empty() {
            return Err(LabError::InvalidStrategy(
                "metadata.id must not be empty".to_string(),
            ));
        }
        if self.metadata.version.trim().is_empty() {
            return Err(LabError::InvalidStrategy(format!(
                "metadata.version must not be empty for strategy {}",
                self.metadata.id
            )));
        }
        Ok(())
    }
}
