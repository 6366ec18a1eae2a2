// src/infra/paths.rs — Path management
//
// All paths respect the NEKOTA_HOME environment variable for isolation.
// When NEKOTA_HOME is set, config and durable storage live under that
// directory. When unset, everything lives under ~/.nekota/.

use std::path::PathBuf;

/// Returns the NEKOTA_HOME override, if set.
fn nekota_home() -> Option<PathBuf> {
    std::env::var_os("NEKOTA_HOME").map(PathBuf::from)
}

/// Configuration directory: $NEKOTA_HOME/ or ~/.nekota/
pub fn config_dir() -> PathBuf {
    if let Some(home) = nekota_home() {
        return home;
    }
    dirs_home().join(".nekota")
}

/// Home directory. Falls back to the current directory on systems
/// without a resolvable home (containers running as nobody).
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default durable storage file (the key-value store holding the session record)
pub fn storage_file_path() -> PathBuf {
    config_dir().join("storage.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_file_lives_in_config_dir() {
        let storage = storage_file_path();
        assert_eq!(storage.parent(), Some(config_dir().as_path()));
        assert_eq!(storage.file_name().unwrap(), "storage.json");
    }
}
