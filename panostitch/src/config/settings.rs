//! Settings structs and defaults.

use crate::fetch::{BackoffPolicy, FetchConfig};
use crate::pipeline::PipelineConfig;
use std::path::PathBuf;
use std::time::Duration;

/// All runtime settings, sectioned the way the INI file is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub source: SourceSettings,
    pub download: DownloadSettings,
    pub cache: CacheSettings,
    pub output: OutputSettings,
    pub queue: QueueSettings,
}

/// `[source]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    /// Base URL of the tile service.
    pub base_url: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://www.gigapan.org".to_string(),
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Concurrent fetch workers.
    pub workers: usize,
    /// Attempts per tile, including the first.
    pub max_attempts: u32,
    /// Per-attempt timeout in seconds.
    pub request_timeout_secs: u64,
    /// Backoff after the first failed attempt, in milliseconds.
    pub base_backoff_ms: u64,
    /// Backoff ceiling in milliseconds.
    pub max_backoff_ms: u64,
    /// Proportional backoff jitter in [0, 1].
    pub jitter: f64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            workers: 12,
            max_attempts: 3,
            request_timeout_secs: 10,
            base_backoff_ms: 100,
            max_backoff_ms: 5000,
            jitter: 0.5,
        }
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Root directory for cached tiles.
    pub directory: PathBuf,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("cache"),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// Directory composites are written into.
    pub directory: PathBuf,
    /// Output format by extension: `tiff` or `png`.
    pub format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("output"),
            format: "tiff".to_string(),
        }
    }
}

/// `[queue]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueSettings {
    /// Path of the flat-file work queue.
    pub file: PathBuf,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("queue.txt"),
        }
    }
}

impl Settings {
    /// Fetch stage configuration derived from the `[download]` section.
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            workers: self.download.workers,
            request_timeout: Duration::from_secs(self.download.request_timeout_secs),
            backoff: BackoffPolicy {
                max_attempts: self.download.max_attempts,
                base_delay: Duration::from_millis(self.download.base_backoff_ms),
                max_delay: Duration::from_millis(self.download.max_backoff_ms),
                jitter: self.download.jitter,
            },
        }
    }

    /// Full pipeline configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            fetch: self.fetch_config(),
            output_dir: self.output.directory.clone(),
            output_extension: self.output.format.clone(),
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fetch_config() {
        let config = Settings::default().fetch_config();
        assert_eq!(config.workers, 12);
        assert_eq!(config.backoff.max_attempts, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_pipeline_config_uses_output_settings() {
        let mut settings = Settings::default();
        settings.output.directory = PathBuf::from("/tmp/out");
        settings.output.format = "png".to_string();

        let config = settings.pipeline_config();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.output_extension, "png");
    }
}
