//! Session settings for the Prism fuzzing toolkit.
//!
//! A fuzzing session can pin tool versions and relocate the artifact root
//! via a `prism.toml` file. Settings are optional everywhere: an absent file
//! yields defaults, and absent fields yield empty values.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::SettingsError;
pub use loader::{load_settings, load_settings_from_str, load_settings_or_default};
pub use types::{PinnedBinary, Settings};
