use directories::ProjectDirs;
use std::path::PathBuf;

/// Application directories following XDG spec
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/chipdeck)
    pub config: PathBuf,

    /// Cache directory (~/.cache/chipdeck), also holds logs
    pub cache: PathBuf,

    /// Config file path
    pub config_file: PathBuf,
}

impl Directories {
    /// Standard XDG paths, or paths under the temp dir when no home
    /// directory can be determined.
    #[must_use]
    pub fn new() -> Self {
        match ProjectDirs::from("", "", "chipdeck") {
            Some(project) => {
                let config = project.config_dir().to_path_buf();
                Self {
                    config_file: config.join("config.json"),
                    config,
                    cache: project.cache_dir().to_path_buf(),
                }
            }
            None => Self::with_base(std::env::temp_dir().join("chipdeck")),
        }
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            config: base.clone(),
            cache: base,
        }
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.cache)?;
        Ok(())
    }
}

impl Default for Directories {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory for sockets and other runtime files.
///
/// Prefers `$XDG_RUNTIME_DIR`, falling back to the system temp directory.
#[must_use]
pub fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(std::env::temp_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_sets_all_paths() {
        let base = PathBuf::from("/tmp/test-chipdeck");
        let dirs = Directories::with_base(base.clone());

        assert_eq!(dirs.config, base);
        assert_eq!(dirs.cache, base);
        assert_eq!(dirs.config_file, base.join("config.json"));
    }

    #[test]
    fn test_ensure_exists_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dirs = Directories::with_base(temp_dir.path().join("nested").join("chipdeck"));

        assert!(!dirs.config.exists());
        dirs.ensure_exists().unwrap();
        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
        assert!(dirs.cache.exists());
    }

    #[test]
    fn test_new_paths_mention_project() {
        let dirs = Directories::new();
        assert!(dirs.config.to_string_lossy().contains("chipdeck"));
        assert!(dirs.config_file.to_string_lossy().ends_with("config.json"));
    }

    #[test]
    fn test_runtime_dir_exists() {
        assert!(runtime_dir().is_dir());
    }
}
