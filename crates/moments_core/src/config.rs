//! Store location configuration.
//!
//! # Responsibility
//! - Resolve the application directory that holds the collection and logs.
//!
//! # Invariants
//! - An explicit path always wins over the environment.
//! - Blank environment values are ignored.

use crate::store::layout;
use crate::store::moment_store::DirMomentStore;
use crate::store::StoreResult;
use std::path::{Path, PathBuf};

/// Environment variable naming the application directory.
pub const ROOT_ENV_VAR: &str = "MOMENTS_ROOT";
const DEFAULT_APP_DIR_NAME: &str = "moments_app";
const LOG_DIR_NAME: &str = "logs";

/// Paths for one application instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub app_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(app_dir: impl Into<PathBuf>) -> Self {
        Self {
            app_dir: app_dir.into(),
        }
    }

    /// Reads `MOMENTS_ROOT`, falling back to `<tmp>/moments_app`.
    pub fn from_env() -> Self {
        Self::new(resolve_app_dir(std::env::var(ROOT_ENV_VAR).ok().as_deref()))
    }

    /// Directory holding one subdirectory per moment.
    pub fn collection_root(&self) -> PathBuf {
        layout::collection_root(&self.app_dir)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.app_dir.join(LOG_DIR_NAME)
    }

    pub fn open_store(&self) -> StoreResult<DirMomentStore> {
        DirMomentStore::open(self.collection_root())
    }
}

fn resolve_app_dir(raw: Option<&str>) -> PathBuf {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => Path::new(value).to_path_buf(),
        _ => std::env::temp_dir().join(DEFAULT_APP_DIR_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_app_dir, StoreConfig};
    use std::path::PathBuf;

    #[test]
    fn blank_env_value_falls_back_to_temp_dir() {
        let resolved = resolve_app_dir(Some("   "));
        assert_eq!(resolved, std::env::temp_dir().join("moments_app"));
        assert_eq!(resolve_app_dir(None), resolved);
    }

    #[test]
    fn derived_paths_hang_off_app_dir() {
        let config = StoreConfig::new("/data/app");
        assert_eq!(config.collection_root(), PathBuf::from("/data/app/moments"));
        assert_eq!(config.log_dir(), PathBuf::from("/data/app/logs"));
        assert_eq!(resolve_app_dir(Some(" /data/app ")), PathBuf::from("/data/app"));
    }
}
