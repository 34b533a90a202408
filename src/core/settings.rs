use std::{fs, path::Path};

use serde::Deserialize;

use crate::error::{BatchError, ErrorKind};

const DEFAULT_CHUNK_SIZE: usize = 10;

/// Externalised configuration of a chunk-oriented step.
///
/// Every field is optional in the JSON document:
///
/// ```
/// use chunk_batch::core::settings::StepSettings;
/// use chunk_batch::ErrorKind;
///
/// let settings = StepSettings::from_json_str(
///     r#"{ "name": "userStep", "fault_tolerant": true, "skip_limit": 1 }"#,
/// )
/// .unwrap();
///
/// assert_eq!(settings.chunk_size, 10);
/// assert_eq!(settings.skip_on, vec![ErrorKind::InvalidItem]);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepSettings {
    pub name: Option<String>,
    pub chunk_size: usize,
    pub fault_tolerant: bool,
    pub skip_limit: usize,
    pub skip_on: Vec<ErrorKind>,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            name: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            fault_tolerant: false,
            skip_limit: 0,
            skip_on: vec![ErrorKind::InvalidItem],
        }
    }
}

impl StepSettings {
    pub fn from_json_str(json: &str) -> Result<Self, BatchError> {
        let settings: StepSettings = serde_json::from_str(json)
            .map_err(|error| BatchError::Configuration(error.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|error| {
            BatchError::Configuration(format!("unable to read {}: {}", path.display(), error))
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), BatchError> {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
