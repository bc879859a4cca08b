//! YAML study files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::study::{Study, StudyOutcome};

/// A named study as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub study: Study,
}

impl StudyFile {
    pub fn new(name: impl Into<String>, study: Study) -> Self {
        Self {
            name: name.into(),
            description: None,
            study,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation(
                "study file must have a name".to_string(),
            ));
        }
        self.study.validate()
    }
}

/// Load and validate a study file.
pub fn load_yaml(path: &Path) -> AppResult<StudyFile> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::StudyFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file: StudyFile = serde_yaml::from_str(&content)?;
    file.validate()?;
    Ok(file)
}

/// Validate and write a study file.
pub fn save_yaml(path: &Path, file: &StudyFile) -> AppResult<()> {
    file.validate()?;
    let content = serde_yaml::to_string(file)?;
    std::fs::write(path, content).map_err(|e| AppError::StudyFileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Pretty JSON for a study outcome.
pub fn to_json(outcome: &StudyOutcome) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(outcome)?)
}
