//! Configuration.
//!
//! Defaults live in [`Settings::default`]; an optional INI file overlays
//! them. Values are validated at parse time so a typo fails the command
//! with a section/key/reason message instead of surfacing later as odd
//! runtime behavior.

mod file;
mod settings;

pub use file::{load_settings, load_settings_or_default, ConfigFileError};
pub use settings::{
    CacheSettings, DownloadSettings, OutputSettings, QueueSettings, Settings, SourceSettings,
};
