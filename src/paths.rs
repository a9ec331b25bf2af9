use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};

const HOME_ENV: &str = "CANOPY_HOME";
const BIN_DIR: &str = "bin";
const CONF_DIR: &str = "conf";
const CONFIG_FILE: &str = "config.json";

pub const SERVICE_ACCOUNT_FILE: &str = "service-account.json";

/// Directory the service treats as home: `CANOPY_HOME` when set, otherwise
/// the directory holding the executable (or its parent when that is `bin/`).
pub fn install_root() -> Result<PathBuf> {
    match std::env::var(HOME_ENV) {
        Ok(home) if home.trim().is_empty() => Err(AppError::Config(format!(
            "{} is set but empty",
            HOME_ENV
        ))),
        Ok(home) => Ok(PathBuf::from(home)),
        Err(_) => root_from_executable(&std::env::current_exe()?),
    }
}

fn root_from_executable(exe_path: &Path) -> Result<PathBuf> {
    let exe_dir = exe_path.parent().ok_or_else(|| {
        AppError::Config(format!("{} has no parent directory", exe_path.display()))
    })?;

    match exe_dir.file_name().and_then(|name| name.to_str()) {
        Some(BIN_DIR) => exe_dir.parent().map(Path::to_path_buf).ok_or_else(|| {
            AppError::Config(format!("{} has no parent directory", exe_dir.display()))
        }),
        _ => Ok(exe_dir.to_path_buf()),
    }
}

pub fn config_file() -> Result<PathBuf> {
    Ok(install_root()?.join(CONF_DIR).join(CONFIG_FILE))
}

/// Conventional location of the imagery platform's service-account key.
pub fn service_account_file() -> Result<PathBuf> {
    Ok(install_root()?.join(SERVICE_ACCOUNT_FILE))
}

/// Relative paths found in the config file are taken relative to the install root.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(install_root()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bin_directory_is_skipped() {
        let root = root_from_executable(Path::new("/opt/canopy/bin/canopy")).unwrap();
        assert_eq!(root, PathBuf::from("/opt/canopy"));
    }

    #[test]
    fn flat_layout_uses_executable_directory() {
        let root = root_from_executable(Path::new("/srv/canopy/canopy")).unwrap();
        assert_eq!(root, PathBuf::from("/srv/canopy"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let path = resolve(Path::new("/etc/canopy/sa.json")).unwrap();
        assert_eq!(path, PathBuf::from("/etc/canopy/sa.json"));
    }
}
