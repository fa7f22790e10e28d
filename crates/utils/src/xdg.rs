use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for tiercache
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_CACHE_HOME/tiercache or fallback
    pub fn cache_dir() -> PathBuf {
        env::var_os("XDG_CACHE_HOME")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|home| home.join(".cache"))
                    .unwrap_or_else(|| PathBuf::from(".cache"))
            })
            .join("tiercache")
    }
}
