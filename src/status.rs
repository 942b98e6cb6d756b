//! Read-only report of what is currently installed. Needs no elevation.

use std::path::PathBuf;
use serde::Serialize;
use crate::layout::{self, InstallLayout};
use crate::system::SystemOps;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub target_dir: PathBuf,
    pub executable_installed: bool,
    pub config_installed: bool,
    /// Backup file names, oldest first.
    pub backups: Vec<String>,
}

pub fn status(system: &impl SystemOps, layout: &InstallLayout) -> StatusReport {
    // A missing target directory simply means nothing is installed.
    let mut backups: Vec<String> = system
        .list_dir(&layout.target_dir)
        .unwrap_or_default()
        .into_iter()
        .filter(|name| layout::is_backup_file_name(name))
        .collect();
    backups.sort();

    StatusReport {
        target_dir: layout.target_dir.clone(),
        executable_installed: system.path_exists(&layout.installed_executable()),
        config_installed: system.path_exists(&layout.installed_config()),
        backups,
    }
}

impl StatusReport {
    pub fn print(&self) {
        let mark = |present: bool| if present { "✓" } else { "✕" };

        println!();
        println!("Target directory: {}", self.target_dir.display());
        println!("  {} {}", mark(self.executable_installed), layout::INSTALLED_EXECUTABLE);
        println!("  {} {}", mark(self.config_installed), layout::CONFIG_FILE);
        if self.backups.is_empty() {
            println!("  No backups.");
        } else {
            println!("  {} backup(s):", self.backups.len());
            for name in &self.backups {
                println!("    {}", name);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::system::MockSystem;

    #[test]
    fn reports_installed_files_and_sorted_backups() {
        let dst = Path::new("/tools");
        let system = MockSystem::unprivileged()
            .with_file(dst.join("yt-dlp.exe"), b"x")
            .with_file(dst.join("yt-dlp.exe.backup.20250102_000000"), b"b")
            .with_file(dst.join("yt-dlp.exe.backup.20240102_000000"), b"a")
            .with_file(dst.join("readme.txt"), b"r");

        let report = status(&system, &InstallLayout::new("/dist", dst));

        assert!(report.executable_installed);
        assert!(!report.config_installed);
        assert_eq!(
            report.backups,
            vec!["yt-dlp.exe.backup.20240102_000000", "yt-dlp.exe.backup.20250102_000000"]
        );
    }

    #[test]
    fn missing_target_directory_reports_nothing_installed() {
        let report = status(&MockSystem::unprivileged(), &InstallLayout::new("/dist", "/nowhere"));

        assert!(!report.executable_installed);
        assert!(!report.config_installed);
        assert!(report.backups.is_empty());
    }

    #[test]
    fn serializes_to_json_for_scripts() {
        let report = StatusReport {
            target_dir: PathBuf::from("/tools"),
            executable_installed: true,
            config_installed: false,
            backups: vec![],
        };

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["executable_installed"], true);
        assert_eq!(json["target_dir"], "/tools");
    }
}
