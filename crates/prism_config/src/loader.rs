//! Settings file loading and validation.

use crate::error::SettingsError;
use crate::types::Settings;
use std::path::Path;

/// Name of the settings file within a project directory.
pub const SETTINGS_FILE: &str = "prism.toml";

/// Loads and validates `prism.toml` from a project directory.
pub fn load_settings(project_dir: &Path) -> Result<Settings, SettingsError> {
    let path = project_dir.join(SETTINGS_FILE);
    let content = std::fs::read_to_string(&path)?;
    load_settings_from_str(&content)
}

/// Loads `prism.toml` from a project directory, returning defaults if the
/// file does not exist. Parse and validation errors are still reported.
pub fn load_settings_or_default(project_dir: &Path) -> Result<Settings, SettingsError> {
    let path = project_dir.join(SETTINGS_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => load_settings_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
        Err(e) => Err(SettingsError::Io(e)),
    }
}

/// Parses and validates settings from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_settings_from_str(content: &str) -> Result<Settings, SettingsError> {
    let settings: Settings =
        toml::from_str(content).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    for (i, binary) in settings.binaries.iter().enumerate() {
        if binary.name.is_empty() {
            return Err(SettingsError::MissingField(format!("binaries[{i}].name")));
        }
        if binary.version.is_empty() {
            return Err(SettingsError::MissingField(format!(
                "binaries[{i}].version"
            )));
        }
    }
    Ok(())
}
