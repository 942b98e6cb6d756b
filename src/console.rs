//! Keeps the console window open when the installer was double-clicked.
//!
//! Explorer gives a double-clicked program a console of its own, which vanishes the
//! moment the process exits. When we are the only process attached to our console,
//! wait for Enter so the user can read the outcome.

use std::io::{self, BufRead, Write};

#[cfg(windows)]
pub fn owns_console() -> bool {
    use windows::Win32::System::Console::GetConsoleProcessList;

    let mut processes = [0u32; 2];
    let attached = unsafe { GetConsoleProcessList(&mut processes) };
    attached == 1
}

/// Terminals outlive the process everywhere else.
#[cfg(not(windows))]
pub fn owns_console() -> bool {
    false
}

pub fn wait_for_enter() {
    print!("\nPress Enter to exit . . . ");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
