//! Run configuration from YAML or JSON

use crate::core::{
    context::RunContext,
    error::{Error, Result as RunResult},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Serializable shape of a run context
///
/// ```yaml
/// tags: [demo, nightly]
/// metadata:
///   user: alice
/// max_concurrency: 4
/// recursion_limit: 10
/// run_name: translate
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Tags attached to every span of the run
    pub tags: Vec<String>,

    /// Free-form metadata attached to every span of the run
    pub metadata: BTreeMap<String, Value>,

    /// Upper bound on concurrently executing work units
    pub max_concurrency: Option<usize>,

    /// Budget for dynamic re-dispatch
    pub recursion_limit: Option<usize>,

    /// Name of the root span
    pub run_name: Option<String>,
}

impl RunConfig {
    /// Load a run configuration from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse a run configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a run configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RunResult<()> {
        if self.max_concurrency == Some(0) {
            return Err(Error::Config(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if let Some(name) = &self.run_name {
            if name.trim().is_empty() {
                return Err(Error::Config("run_name cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Build a fresh context carrying this configuration
    pub fn to_context(&self) -> RunContext {
        RunContext::from_config(self)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency);
        self
    }

    pub fn with_recursion_limit(mut self, recursion_limit: usize) -> Self {
        self.recursion_limit = Some(recursion_limit);
        self
    }

    pub fn with_run_name(mut self, run_name: impl Into<String>) -> Self {
        self.run_name = Some(run_name.into());
        self
    }
}
