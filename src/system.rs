use std::path::Path;
#[cfg(test)]
use std::path::PathBuf;
use std::process::Command;
use anyhow::{Context, Result};
use log::debug;
use walkdir::WalkDir;
use crate::elevation;

/// Abstraction for System interactions (privileges, File System, desktop shell).
/// This allows us to run the install and uninstall procedures against a mock in tests.
pub trait SystemOps {
    /// Whether the process holds administrative privileges.
    fn is_elevated(&self) -> bool;

    /// Check if a file or directory exists.
    fn path_exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy a file, overwriting `to` if it exists.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete a single file.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Names of the regular files directly inside `dir`.
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>>;

    /// Show `dir` in the platform's file browser.
    fn open_in_file_browser(&self, dir: &Path) -> Result<()>;
}

/// The Real System implementation (Production).
pub struct HostSystem;

impl SystemOps for HostSystem {
    fn is_elevated(&self) -> bool {
        elevation::is_elevated()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("create {}", path.display()))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::copy(from, to)
            .with_context(|| format!("copy {} -> {}", from.display(), to.display()))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path)
            .with_context(|| format!("remove {}", path.display()))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("read {}", dir.display()))?;
            if entry.file_type().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn open_in_file_browser(&self, dir: &Path) -> Result<()> {
        let browser = if cfg!(windows) {
            "explorer"
        } else if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        debug!("Opening {:?} with {}", dir, browser);

        // Spawn, don't wait: explorer.exe exits with 1 even when it succeeds.
        Command::new(browser)
            .arg(dir)
            .spawn()
            .with_context(|| format!("launch {}", browser))?;
        Ok(())
    }
}

/// A Mock System for Testing.
///
/// Files are kept in memory. Any mutation whose target is listed in `failing_paths`
/// fails, which lets tests reach every error branch.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockSystem {
    pub elevated: bool,
    pub files: std::sync::Mutex<std::collections::HashMap<PathBuf, Vec<u8>>>,
    pub dirs: std::sync::Mutex<std::collections::HashSet<PathBuf>>,
    pub failing_paths: std::sync::Mutex<std::collections::HashSet<PathBuf>>,
    pub opened: std::sync::Mutex<Vec<PathBuf>>,
}

#[cfg(test)]
impl MockSystem {
    /// An elevated system with an empty file system.
    pub fn elevated() -> Self {
        Self {
            elevated: true,
            ..Default::default()
        }
    }

    /// A standard-user system with an empty file system.
    pub fn unprivileged() -> Self {
        Self::default()
    }

    /// Adds a file (and its parent directories).
    pub fn with_file(self, path: impl Into<PathBuf>, content: &[u8]) -> Self {
        let path = path.into();
        self.add_dirs(path.parent());
        self.files.lock().unwrap().insert(path, content.to_vec());
        self
    }

    /// Makes every mutation targeting `path`, and listing it, fail.
    pub fn failing_on(self, path: impl Into<PathBuf>) -> Self {
        self.failing_paths.lock().unwrap().insert(path.into());
        self
    }

    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Every file currently stored, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn add_dirs(&self, dir: Option<&Path>) {
        let mut dirs = self.dirs.lock().unwrap();
        for ancestor in dir.into_iter().flat_map(Path::ancestors) {
            if !ancestor.as_os_str().is_empty() {
                dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        if self.failing_paths.lock().unwrap().contains(path) {
            anyhow::bail!("access denied: {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
impl SystemOps for MockSystem {
    fn is_elevated(&self) -> bool {
        self.elevated
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path) || self.dirs.lock().unwrap().contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        self.add_dirs(Some(path));
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        self.check_writable(to)?;
        let content = self
            .read(from)
            .ok_or_else(|| anyhow::anyhow!("not found: {}", from.display()))?;
        let parent_exists = to.parent().is_none_or(|p| self.dirs.lock().unwrap().contains(p));
        if !parent_exists {
            anyhow::bail!("directory missing for {}", to.display());
        }
        self.files.lock().unwrap().insert(to.to_path_buf(), content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.check_writable(path)?;
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("not found: {}", path.display()))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        self.check_writable(dir)?;
        if !self.dirs.lock().unwrap().contains(dir) {
            anyhow::bail!("not found: {}", dir.display());
        }
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn open_in_file_browser(&self, dir: &Path) -> Result<()> {
        self.opened.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn host_copy_overwrites_and_lists_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let system = HostSystem;

        let target = root.join("Tools");
        system.create_dir_all(&target).unwrap();
        system.create_dir_all(&target.join("nested")).unwrap();
        assert!(system.path_exists(&target));

        let src = root.join("new.exe");
        fs::write(&src, b"new").unwrap();
        fs::write(target.join("yt-dlp.exe"), b"old").unwrap();

        system.copy_file(&src, &target.join("yt-dlp.exe")).unwrap();
        assert_eq!(fs::read(target.join("yt-dlp.exe")).unwrap(), b"new");

        fs::write(target.join("config.json"), b"{}").unwrap();
        assert_eq!(system.list_dir(&target).unwrap(), vec!["config.json", "yt-dlp.exe"]);

        system.remove_file(&target.join("yt-dlp.exe")).unwrap();
        assert!(!system.path_exists(&target.join("yt-dlp.exe")));
    }

    #[test]
    fn host_errors_name_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.exe");

        let err = HostSystem.remove_file(&missing).unwrap_err();
        assert!(format!("{:#}", err).contains("missing.exe"));

        let err = HostSystem.list_dir(&tmp.path().join("nope")).unwrap_err();
        assert!(format!("{:#}", err).contains("nope"));
    }

    #[test]
    fn mock_copy_requires_parent_directory() {
        let system = MockSystem::elevated().with_file("/src/a", b"a");

        assert!(system.copy_file(Path::new("/src/a"), Path::new("/dst/a")).is_err());

        system.create_dir_all(Path::new("/dst")).unwrap();
        system.copy_file(Path::new("/src/a"), Path::new("/dst/a")).unwrap();
        assert_eq!(system.read(Path::new("/dst/a")).unwrap(), b"a");
    }

    #[test]
    fn mock_failing_path_rejects_mutations() {
        let system = MockSystem::elevated()
            .with_file("/dst/a", b"a")
            .failing_on("/dst/a");

        assert!(system.remove_file(Path::new("/dst/a")).is_err());
        assert!(system.copy_file(Path::new("/dst/a"), Path::new("/dst/a")).is_err());
        assert_eq!(system.read(Path::new("/dst/a")).unwrap(), b"a");
    }
}
