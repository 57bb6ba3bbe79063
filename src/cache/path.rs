//! Cache file location.
//!
//! Resolves `<base>/<project>-cache/cache.<ext>` (or `cache.gz` when compressed),
//! where `<base>` is the configured override or the first usable of: platform
//! cache directory, home directory, system temp directory, current directory.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::CacheConfig;

/// Resolves the full path of the cache file for `config`.
pub fn cache_file_path(config: &CacheConfig) -> PathBuf {
    let base = match &config.cache_path {
        Some(path) => path.clone(),
        None => resolve_base_dir(dirs::cache_dir(), dirs::home_dir(), env::temp_dir()),
    };
    file_path_in(&base, config)
}

/// Builds the cache file path under an already chosen base directory.
pub fn file_path_in(base: &Path, config: &CacheConfig) -> PathBuf {
    let file_name = if config.compression {
        "cache.gz".to_string()
    } else {
        format!("cache.{}", config.file_extension)
    };

    base.join(format!("{}-cache", config.project_name))
        .join(file_name)
}

/// Picks the base directory from the platform candidates.
pub fn resolve_base_dir(
    cache_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    temp_dir: PathBuf,
) -> PathBuf {
    if let Some(dir) = cache_dir {
        return dir;
    }
    if let Some(dir) = home_dir {
        return dir;
    }

    match fs::metadata(&temp_dir) {
        Ok(meta) if meta.is_dir() => temp_dir,
        Ok(_) => {
            warn!(
                "Temp directory {} is not a directory, falling back to current directory",
                temp_dir.display()
            );
            PathBuf::from(".")
        }
        Err(e) => {
            warn!(
                "Temp directory {} is not accessible ({}), falling back to current directory",
                temp_dir.display(),
                e
            );
            PathBuf::from(".")
        }
    }
}
