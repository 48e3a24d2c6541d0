//! Default paths and tilde expansion.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user home directory. Paths without a leading
/// `~` pass through unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        if let Some(rest) = rest.strip_prefix('/') {
            home.join(rest)
        } else {
            home
        }
    } else {
        PathBuf::from(path)
    }
}

fn config_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("rnbo")
}

pub fn default_config_path() -> PathBuf {
    config_root().join("config.json")
}

pub fn default_system_id_path() -> PathBuf {
    config_root().join("runner-id.txt")
}

pub fn default_backup_dir() -> PathBuf {
    config_root().join("backups")
}

pub fn default_source_cache_dir() -> PathBuf {
    config_root().join("cache").join("src")
}

pub fn default_compile_cache_dir() -> PathBuf {
    config_root().join("cache").join("build")
}

pub fn default_save_dir() -> PathBuf {
    config_root().join("saves")
}

pub fn default_datafile_dir() -> PathBuf {
    config_root().join("datafiles")
}

pub fn default_db_path() -> PathBuf {
    config_root().join("rnbo.sqlite")
}

pub fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_tilde("~/foo/bar"), home.join("foo/bar"));
    }

    #[test]
    fn plain_path_is_unchanged() {
        assert_eq!(expand_tilde("/tmp/x"), PathBuf::from("/tmp/x"));
    }

    #[test]
    fn default_paths_nest_under_config_root() {
        assert!(default_config_path().ends_with("config.json"));
        assert!(default_system_id_path().ends_with("runner-id.txt"));
    }
}
