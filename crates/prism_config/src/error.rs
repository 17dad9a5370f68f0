//! Error types for settings loading and validation.

/// Errors that can occur when loading or validating a `prism.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading the settings file.
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse settings: {0}")]
    Parse(String),

    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_field() {
        let err = SettingsError::MissingField("binaries[0].name".to_string());
        assert_eq!(format!("{err}"), "missing required field: binaries[0].name");
    }

    #[test]
    fn display_parse_error() {
        let err = SettingsError::Parse("expected '=' at line 3".to_string());
        assert_eq!(
            format!("{err}"),
            "failed to parse settings: expected '=' at line 3"
        );
    }

    #[test]
    fn display_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SettingsError::Io(io_err);
        assert!(format!("{err}").starts_with("failed to read settings:"));
    }
}
