//! # Layout Module
//!
//! Knows every path the installer touches:
//!
//! - The **source directory** (next to the running installer), holding `yt-dlp-proxy.exe`
//!   and an optional `config.json`.
//! - The **target directory**, VRChat's tools folder under the per-user `LocalLow` root,
//!   where the proxy is installed as `yt-dlp.exe`.
//! - Timestamped **backup names** for a previously installed `yt-dlp.exe`.
//!
//! Both directories can be overridden from the command line (and the target also from
//! `YTDLP_PROXY_TARGET_DIR`), so nothing here hardcodes a machine-specific path.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;

/// The prebuilt proxy binary shipped next to the installer.
pub const SOURCE_EXECUTABLE: &str = "yt-dlp-proxy.exe";
/// The name VRChat looks for in its tools directory.
pub const INSTALLED_EXECUTABLE: &str = "yt-dlp.exe";
/// Proxy configuration. Copied as-is, never parsed.
pub const CONFIG_FILE: &str = "config.json";
/// Environment variable that overrides the target directory.
pub const TARGET_DIR_ENV: &str = "YTDLP_PROXY_TARGET_DIR";

const TOOLS_SUBPATH: [&str; 3] = ["VRChat", "VRChat", "Tools"];
const BACKUP_MARKER: &str = ".backup.";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// The pair of directories one install/uninstall run operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

impl InstallLayout {
    pub fn new(source_dir: impl Into<PathBuf>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
        }
    }

    /// Resolves the layout for this run.
    ///
    /// * `source_override` - Defaults to the directory containing the running installer.
    /// * `target_override` - Defaults to [`default_target_dir`].
    pub fn resolve(source_override: Option<&Path>, target_override: Option<&Path>) -> Result<Self> {
        let source_dir = match source_override {
            Some(dir) => dir.to_path_buf(),
            None => {
                let exe = std::env::current_exe().context("Could not locate the running installer")?;
                exe.parent()
                    .map(Path::to_path_buf)
                    .context("Installer executable has no parent directory")?
            }
        };

        let target_dir = match target_override {
            Some(dir) => dir.to_path_buf(),
            None => default_target_dir()
                .context("Could not resolve the per-user application data directory")?,
        };

        Ok(Self::new(source_dir, target_dir))
    }

    pub fn source_executable(&self) -> PathBuf {
        self.source_dir.join(SOURCE_EXECUTABLE)
    }

    pub fn source_config(&self) -> PathBuf {
        self.source_dir.join(CONFIG_FILE)
    }

    pub fn installed_executable(&self) -> PathBuf {
        self.target_dir.join(INSTALLED_EXECUTABLE)
    }

    pub fn installed_config(&self) -> PathBuf {
        self.target_dir.join(CONFIG_FILE)
    }

    /// Where a backup taken at `timestamp` is written (same directory as the installed file).
    pub fn backup_path(&self, timestamp: &NaiveDateTime) -> PathBuf {
        self.target_dir.join(backup_file_name(timestamp))
    }
}

/// Picks the explicit target directory, if any: the `--target-dir` flag first, then
/// a non-empty `YTDLP_PROXY_TARGET_DIR`. `None` means "use [`default_target_dir`]".
pub fn target_override(flag: Option<&Path>, env_value: Option<&OsStr>) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        env_value
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    })
}

/// VRChat's tools directory for the current user.
///
/// On Windows this is `%USERPROFILE%\AppData\LocalLow\VRChat\VRChat\Tools`. Other hosts
/// have no `LocalLow`, so the local data directory stands in for it.
pub fn default_target_dir() -> Option<PathBuf> {
    let base_dirs = directories::BaseDirs::new()?;
    Some(tools_dir_under(&low_privilege_data_root(base_dirs.data_local_dir())))
}

/// `data_local_dir` is `AppData\Local`; the low-integrity root is its `LocalLow` sibling.
fn low_privilege_data_root(data_local_dir: &Path) -> PathBuf {
    if cfg!(windows) {
        if let Some(app_data) = data_local_dir.parent() {
            return app_data.join("LocalLow");
        }
    }
    data_local_dir.to_path_buf()
}

/// Appends `VRChat/VRChat/Tools` to `root`.
pub fn tools_dir_under(root: &Path) -> PathBuf {
    TOOLS_SUBPATH.iter().fold(root.to_path_buf(), |dir, part| dir.join(part))
}

/// `yt-dlp.exe.backup.YYYYMMDD_HHMMSS`
pub fn backup_file_name(timestamp: &NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        INSTALLED_EXECUTABLE,
        BACKUP_MARKER,
        timestamp.format(BACKUP_TIMESTAMP_FORMAT)
    )
}

/// Whether `name` was produced by [`backup_file_name`].
pub fn is_backup_file_name(name: &str) -> bool {
    name.strip_prefix(INSTALLED_EXECUTABLE)
        .and_then(|rest| rest.strip_prefix(BACKUP_MARKER))
        .is_some_and(|stamp| {
            stamp.len() == 15 && NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT).is_ok()
        })
}
