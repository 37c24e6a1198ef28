//! Resource instances loaded from JSON files.
//!
//! A bindings file holds an array of instances:
//!
//! ```json
//! [
//!   {"bindings": {"id": "A"}, "last_modified": "2024-01-02T03:04:05Z"},
//!   {"bindings": {"id": 42}, "change_frequency": "daily"}
//! ]
//! ```
//!
//! The file is read on every generation, so regenerating picks up changes.
//! Binding names keep the order in which the file lists them.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use smap_sitemap::{
    BindingEnumerator, ChangeFrequency, EnumerationError, Instances, ResourceInstance,
};

/// One element of a bindings file.
#[derive(Debug, Deserialize)]
struct InstanceRecord {
    bindings: Map<String, Value>,
    last_modified: Option<DateTime<Utc>>,
    change_frequency: Option<ChangeFrequency>,
}

impl InstanceRecord {
    fn into_instance(self) -> Result<ResourceInstance, EnumerationError> {
        let bindings = self
            .bindings
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(s) => Ok((name, s)),
                Value::Number(n) => Ok((name, n.to_string())),
                other => Err(EnumerationError::new(format!(
                    "binding {name:?} must be a string or number, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut instance = ResourceInstance::new(bindings);
        if let Some(modified) = self.last_modified {
            instance = instance.with_last_modified(modified);
        }
        if let Some(freq) = self.change_frequency {
            instance = instance.with_change_frequency(freq);
        }
        Ok(instance)
    }
}

/// Enumerates the instances stored in a JSON file.
#[derive(Debug, Clone)]
pub(crate) struct JsonFileEnumerator {
    path: PathBuf,
}

impl JsonFileEnumerator {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Vec<InstanceRecord>, EnumerationError> {
        let display = self.path.display();
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            EnumerationError::with_source(format!("failed to read {display}"), e)
        })?;
        serde_json::from_str(&content).map_err(|e| {
            EnumerationError::with_source(format!("invalid bindings file {display}"), e)
        })
    }
}

impl BindingEnumerator for JsonFileEnumerator {
    fn instances(&self) -> Instances<'_> {
        match self.load() {
            Ok(records) => {
                tracing::debug!(
                    path = %self.path.display(),
                    instances = records.len(),
                    "Loaded bindings"
                );
                Box::new(records.into_iter().map(InstanceRecord::into_instance))
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}
