//! # Elevation Module
//!
//! Checks whether the installer runs with administrative privileges.
//!
//! `install`, `uninstall` and `restore` refuse to touch the file system without it.
//! No relaunch-as-admin: the caller prints instructions and exits with status 1.

/// Checks if the current process has administrative privileges.
///
/// It opens the current process token and queries `TokenElevation`.
///
/// # Returns
/// * `true` - If the process is running as Admin / High Integrity.
/// * `false` - If running as Standard User, or if the token could not be read.
#[cfg(windows)]
pub fn is_elevated() -> bool {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token = HANDLE::default();
    unsafe {
        if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token).is_err() {
            return false;
        }

        let mut elevation = TOKEN_ELEVATION::default();
        let mut size = 0;
        let queried = GetTokenInformation(
            token,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut _),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut size,
        );
        let _ = CloseHandle(token);

        queried.is_ok() && elevation.TokenIsElevated != 0
    }
}

/// On Unix hosts "elevated" means running with an effective uid of root.
#[cfg(unix)]
pub fn is_elevated() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(any(windows, unix)))]
pub fn is_elevated() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elevation_check_is_stable() {
        // Privileges cannot change mid-process.
        assert_eq!(is_elevated(), is_elevated());
    }
}
