//! # Installer Logic
//!
//! The three mutating procedures of the installer:
//!
//! 1. `install`: copy `yt-dlp-proxy.exe` into VRChat's tools directory as `yt-dlp.exe`,
//!    optionally backing up what was there, and copy `config.json` alongside it.
//! 2. `uninstall`: delete the installed `yt-dlp.exe` after confirmation.
//! 3. `restore`: copy the newest backup back over `yt-dlp.exe`.
//!
//! Each procedure is a straight sequence of checks and copies. Hard failures come back
//! as an [`InstallError`] before (or instead of) the next mutation; soft failures on
//! the backup and the config file are logged as warnings and recorded in the report.
//! Everything goes through [`SystemOps`] and [`Prompter`] so tests can drive the exact
//! same code against an in-memory file system and scripted answers.

use std::fmt;
use std::path::PathBuf;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use crate::invariant_ppt::assert_invariant;
use crate::layout::{self, InstallLayout, INSTALLED_EXECUTABLE, SOURCE_EXECUTABLE};
use crate::prompt::Prompter;
use crate::system::SystemOps;

pub const TARGET_DIR_INVARIANT: &str = "Target directory exists before copying";
pub const BACKUP_NAME_INVARIANT: &str = "Backup name is recognized as a backup of the installed executable";

/// Hard failures. Each one stops the procedure; the process exits with status 1.
#[derive(Debug)]
pub enum InstallError {
    NotElevated,
    MissingSource(PathBuf),
    CreateTargetDir { path: PathBuf, source: anyhow::Error },
    CopyExecutable { to: PathBuf, source: anyhow::Error },
    RemoveExecutable { path: PathBuf, source: anyhow::Error },
    ReadTargetDir { path: PathBuf, source: anyhow::Error },
}

impl fmt::Display for InstallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallError::NotElevated => write!(
                f,
                "Administrator privileges are required. Right-click the installer and choose \"Run as administrator\""
            ),
            InstallError::MissingSource(path) => write!(
                f,
                "{} not found. Build it first with `cargo build --release` and place it next to the installer",
                path.display()
            ),
            InstallError::CreateTargetDir { path, .. } => {
                write!(f, "Failed to create target directory {}", path.display())
            }
            InstallError::CopyExecutable { to, .. } => {
                write!(f, "Failed to copy {} to {}", SOURCE_EXECUTABLE, to.display())
            }
            InstallError::RemoveExecutable { path, .. } => write!(
                f,
                "Failed to delete {}. Please delete the file manually",
                path.display()
            ),
            InstallError::ReadTargetDir { path, .. } => {
                write!(f, "Failed to read target directory {}", path.display())
            }
        }
    }
}

impl std::error::Error for InstallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InstallError::CreateTargetDir { source, .. }
            | InstallError::CopyExecutable { source, .. }
            | InstallError::RemoveExecutable { source, .. }
            | InstallError::ReadTargetDir { source, .. } => Some(source.as_ref()),
            InstallError::NotElevated | InstallError::MissingSource(_) => None,
        }
    }
}

/// What happened to a previously installed `yt-dlp.exe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// Nothing was installed before.
    NotNeeded,
    Declined,
    Created(PathBuf),
    /// The copy failed; installation carried on.
    Failed(PathBuf),
}

/// What happened to `config.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOutcome {
    /// No `config.json` next to the installer.
    NoSource,
    /// Fresh copy; there was none in the target directory.
    Copied,
    Overwritten,
    /// The user chose to keep the installed one.
    Kept,
    /// The copy failed; installation carried on.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: PathBuf,
    pub backup: BackupOutcome,
    pub config: ConfigOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    NothingInstalled,
    Cancelled,
    Removed(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    NoBackup,
    Cancelled,
    Restored(PathBuf),
}

/// Installs the proxy into the target directory.
///
/// # Arguments
///
/// * `now` - Local time used to name the backup file.
///
/// # Returns
///
/// An [`InstallReport`] on success (including when the backup or config copy failed),
/// or the first hard [`InstallError`]. Nothing is written before the privilege and
/// source checks pass.
pub fn install(
    system: &impl SystemOps,
    prompter: &dyn Prompter,
    layout: &InstallLayout,
    now: NaiveDateTime,
) -> Result<InstallReport, InstallError> {
    // 1. Privileges
    if !system.is_elevated() {
        return Err(InstallError::NotElevated);
    }

    // 2. Source executable
    let source_exe = layout.source_executable();
    if !system.path_exists(&source_exe) {
        return Err(InstallError::MissingSource(source_exe));
    }
    info!("Source: {:?}", source_exe);

    // 3. Target directory
    let target_dir = &layout.target_dir;
    if !system.path_exists(target_dir) {
        info!("Creating directory {:?}", target_dir);
        system
            .create_dir_all(target_dir)
            .map_err(|source| InstallError::CreateTargetDir {
                path: target_dir.clone(),
                source,
            })?;
    }
    assert_invariant(system.path_exists(target_dir), TARGET_DIR_INVARIANT, Some("Installer"));

    // 4. Optional backup of what is installed now
    let dest_exe = layout.installed_executable();
    let backup = if system.path_exists(&dest_exe) {
        info!("Existing installation found at {:?}", dest_exe);
        if prompter.confirm(&format!("{} already exists. Create a backup first?", INSTALLED_EXECUTABLE)) {
            back_up(system, layout, now)
        } else {
            info!("Skipping backup");
            BackupOutcome::Declined
        }
    } else {
        BackupOutcome::NotNeeded
    };

    // 5. The executable itself
    system
        .copy_file(&source_exe, &dest_exe)
        .map_err(|source| InstallError::CopyExecutable {
            to: dest_exe.clone(),
            source,
        })?;
    info!("Installed {} as {:?}", SOURCE_EXECUTABLE, dest_exe);

    // 6. Config, never overwritten without consent
    let config = install_config(system, prompter, layout);

    // 7. Convenience only
    if let Err(e) = system.open_in_file_browser(target_dir) {
        debug!("Could not open {:?} in the file browser: {:#}", target_dir, e);
    }

    Ok(InstallReport {
        installed: dest_exe,
        backup,
        config,
    })
}

fn back_up(system: &impl SystemOps, layout: &InstallLayout, now: NaiveDateTime) -> BackupOutcome {
    let backup_path = layout.backup_path(&now);
    let is_backup_name = backup_path
        .file_name()
        .is_some_and(|n| layout::is_backup_file_name(&n.to_string_lossy()));
    assert_invariant(is_backup_name, BACKUP_NAME_INVARIANT, Some("Installer"));

    match system.copy_file(&layout.installed_executable(), &backup_path) {
        Ok(()) => {
            info!("Backed up existing {} to {:?}", INSTALLED_EXECUTABLE, backup_path);
            BackupOutcome::Created(backup_path)
        }
        Err(e) => {
            warn!("Failed to create backup {:?}: {:#}. Continuing without it", backup_path, e);
            BackupOutcome::Failed(backup_path)
        }
    }
}

fn install_config(system: &impl SystemOps, prompter: &dyn Prompter, layout: &InstallLayout) -> ConfigOutcome {
    let source_config = layout.source_config();
    if !system.path_exists(&source_config) {
        debug!("No {:?}, skipping config", source_config);
        return ConfigOutcome::NoSource;
    }

    let dest_config = layout.installed_config();
    let outcome = if system.path_exists(&dest_config) {
        if !prompter.confirm(&format!("{} already exists. Overwrite it?", layout::CONFIG_FILE)) {
            info!("Keeping existing {:?}", dest_config);
            return ConfigOutcome::Kept;
        }
        ConfigOutcome::Overwritten
    } else {
        ConfigOutcome::Copied
    };

    match system.copy_file(&source_config, &dest_config) {
        Ok(()) => {
            info!("Copied {} to {:?}", layout::CONFIG_FILE, dest_config);
            outcome
        }
        Err(e) => {
            warn!("Failed to copy {} to {:?}: {:#}", layout::CONFIG_FILE, dest_config, e);
            ConfigOutcome::Failed
        }
    }
}

/// Removes the installed `yt-dlp.exe`.
///
/// Nothing installed is not an error, and neither is the user saying no.
/// Backups and `config.json` are left in place.
pub fn uninstall(
    system: &impl SystemOps,
    prompter: &dyn Prompter,
    layout: &InstallLayout,
) -> Result<UninstallOutcome, InstallError> {
    if !system.is_elevated() {
        return Err(InstallError::NotElevated);
    }

    let dest_exe = layout.installed_executable();
    if !system.path_exists(&dest_exe) {
        info!("{:?} does not exist. Nothing to uninstall", dest_exe);
        return Ok(UninstallOutcome::NothingInstalled);
    }

    if !prompter.confirm(&format!("Remove {}?", dest_exe.display())) {
        info!("Uninstall cancelled");
        return Ok(UninstallOutcome::Cancelled);
    }

    system
        .remove_file(&dest_exe)
        .map_err(|source| InstallError::RemoveExecutable {
            path: dest_exe.clone(),
            source,
        })?;
    info!("Removed {:?}", dest_exe);
    Ok(UninstallOutcome::Removed(dest_exe))
}

/// Copies the newest backup back over `yt-dlp.exe`. The backup itself is kept.
pub fn restore(
    system: &impl SystemOps,
    prompter: &dyn Prompter,
    layout: &InstallLayout,
) -> Result<RestoreOutcome, InstallError> {
    if !system.is_elevated() {
        return Err(InstallError::NotElevated);
    }

    if !system.path_exists(&layout.target_dir) {
        info!("{:?} does not exist. No backups to restore", layout.target_dir);
        return Ok(RestoreOutcome::NoBackup);
    }

    // Timestamps are fixed-width, so the lexically greatest name is the newest.
    let newest = system
        .list_dir(&layout.target_dir)
        .map_err(|source| InstallError::ReadTargetDir {
            path: layout.target_dir.clone(),
            source,
        })?
        .into_iter()
        .filter(|name| layout::is_backup_file_name(name))
        .max();
    let Some(name) = newest else {
        info!("No backups found in {:?}", layout.target_dir);
        return Ok(RestoreOutcome::NoBackup);
    };

    let backup_path = layout.target_dir.join(&name);
    if !prompter.confirm(&format!("Restore {} as {}?", name, INSTALLED_EXECUTABLE)) {
        info!("Restore cancelled");
        return Ok(RestoreOutcome::Cancelled);
    }

    let dest_exe = layout.installed_executable();
    system
        .copy_file(&backup_path, &dest_exe)
        .map_err(|source| InstallError::CopyExecutable {
            to: dest_exe.clone(),
            source,
        })?;
    info!("Restored {:?} from {}", dest_exe, name);
    Ok(RestoreOutcome::Restored(backup_path))
}
