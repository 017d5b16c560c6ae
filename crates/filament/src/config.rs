//! Configuration file loading for filament.
//!
//! Reads `filament.config.json` from the current working directory, or the
//! file given with `--config`.

use std::path::Path;

use filament_loom::SchedulerOptions;
use serde::{Deserialize, Serialize};

/// Default config file name.
pub const CONFIG_FILE: &str = "filament.config.json";

/// Top-level filament configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct FilamentConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Time budgets for the simulated idle callback.
    #[serde(default)]
    pub scheduler: SchedulerOptions,
}

/// Load the config from `path`, or `filament.config.json` in the CWD if None.
///
/// A missing file yields the defaults. A file that cannot be read or parsed
/// is reported and the defaults are used instead.
pub fn load_config(path: Option<&Path>) -> FilamentConfig {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .unwrap_or_default()
            .join(CONFIG_FILE),
    };

    if !config_path.exists() {
        if path.is_some() {
            tracing::warn!(path = %config_path.display(), "config file not found, using defaults");
        }
        return FilamentConfig::default();
    }

    match read_config(&config_path) {
        Ok(config) => {
            tracing::debug!(path = %config_path.display(), "config loaded");
            config
        }
        Err(message) => {
            eprintln!(
                "\x1b[33mWarning:\x1b[0m Failed to load {}: {}",
                config_path.display(),
                message
            );
            FilamentConfig::default()
        }
    }
}

fn read_config(path: &Path) -> Result<FilamentConfig, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_scheduler_section() {
        let config: FilamentConfig = serde_json::from_str(
            r#"{ "$schema": "./schema.json", "scheduler": { "sliceMs": 4 } }"#,
        )
        .unwrap();
        assert_eq!(config.schema.as_deref(), Some("./schema.json"));
        assert_eq!(config.scheduler.slice, Duration::from_millis(4));
        assert_eq!(config.scheduler.max_slices, 10_000);
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = load_config(Some(Path::new("/nonexistent/filament.config.json")));
        assert_eq!(config.scheduler, SchedulerOptions::default());
    }

    #[test]
    fn test_invalid_file_is_default() {
        let path = std::env::temp_dir().join("filament-invalid-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = load_config(Some(&path));
        assert_eq!(config.scheduler, SchedulerOptions::default());
        let _ = std::fs::remove_file(&path);
    }
}
