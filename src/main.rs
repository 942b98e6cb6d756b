//! # yt-dlp-proxy installer: The Main Entry Point
//!
//! This module handles Command Line Interface (CLI) parsing, logging initialization,
//! and dispatching commands to the installer procedures.
//!
//! `install`, `uninstall` and `restore` must be run as Administrator; `status` may not.
//! Exit status is 0 for success, "nothing to do" and user cancellations, 1 for any failure.

use std::ffi::OsStr;
use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use simplelog::{Config, SimpleLogger};

mod console;
mod elevation;
mod installer;
mod invariant_ppt;
mod layout;
mod prompt;
mod status;
mod system;

use installer::{BackupOutcome, ConfigOutcome, RestoreOutcome, UninstallOutcome};
use layout::InstallLayout;
use prompt::{AssumeYes, ConsolePrompter, Prompter};
use system::{HostSystem, SystemOps};

/// The primary Command Line Interface (CLI) configuration.
#[derive(Parser)]
#[command(name = "ytdlp-proxy-installer")]
#[command(about = "Installs yt-dlp-proxy into VRChat's tools directory", long_about = None)]
struct Cli {
    /// The sub-command to execute (install, uninstall, status, restore).
    #[command(subcommand)]
    command: Option<Commands>,

    /// Turn on verbose logging.
    ///
    /// - `-v`: Debug
    /// - `-vv`: Trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Install into this directory instead of `LocalLow\VRChat\VRChat\Tools`.
    ///
    /// Falls back to `YTDLP_PROXY_TARGET_DIR` when that is set and not empty.
    #[arg(long, global = true)]
    target_dir: Option<PathBuf>,

    /// Look for `yt-dlp-proxy.exe` and `config.json` here instead of next to the installer.
    #[arg(long, global = true)]
    source_dir: Option<PathBuf>,

    /// Answer "yes" to every question (backup, config overwrite, removal).
    #[arg(short = 'y', long, global = true)]
    yes: bool,
}

/// Available sub-commands.
#[derive(Subcommand)]
enum Commands {
    /// Install yt-dlp-proxy.exe as yt-dlp.exe.
    ///
    /// Offers to back up an existing yt-dlp.exe, and copies config.json if one
    /// sits next to the installer (asking before overwriting an existing one).
    Install,
    /// Remove the installed yt-dlp.exe (config.json and backups are kept).
    Uninstall,
    /// Show what is installed and which backups exist.
    Status {
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Copy the newest backup back over yt-dlp.exe.
    Restore,
}

fn main() {
    let cli = Cli::parse();

    // Determine log level based on verbosity flag
    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // We ignore the result here as logging failure shouldn't crash the startup
    let _ = SimpleLogger::init(log_level, Config::default());

    let prompter: &dyn Prompter = if cli.yes { &AssumeYes } else { &ConsolePrompter };
    let target_env = std::env::var_os(layout::TARGET_DIR_ENV);
    let code = exit_code(run(&cli, &HostSystem, prompter, target_env.as_deref()));

    if console::owns_console() {
        console::wait_for_enter();
    }
    std::process::exit(code);
}

/// 0 for success, "nothing to do" and cancellations; 1 for any failure.
fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

/// Runs one command against `system`, asking `prompter` for every confirmation.
///
/// `target_env` is the raw value of `YTDLP_PROXY_TARGET_DIR`, if set.
fn run(
    cli: &Cli,
    system: &impl SystemOps,
    prompter: &dyn Prompter,
    target_env: Option<&OsStr>,
) -> Result<()> {
    let Some(command) = &cli.command else {
        // Default behavior if no command: print the help message
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let target_dir = layout::target_override(cli.target_dir.as_deref(), target_env);
    let layout = InstallLayout::resolve(cli.source_dir.as_deref(), target_dir.as_deref())?;

    match command {
        Commands::Install => {
            info!("Installing to {:?}...", layout.target_dir);
            let now = chrono::Local::now().naive_local();
            let report = installer::install(system, prompter, &layout, now)?;

            if let BackupOutcome::Failed(path) = &report.backup {
                warn!("Installed without a backup ({:?} could not be written)", path);
            }
            if report.config == ConfigOutcome::Failed {
                warn!("Installed without config.json. Copy it manually if the proxy needs it");
            }
            info!("Installation complete: {:?}", report.installed);
        }
        Commands::Uninstall => match installer::uninstall(system, prompter, &layout)? {
            UninstallOutcome::NothingInstalled => println!("Nothing to uninstall."),
            UninstallOutcome::Cancelled => println!("Uninstall cancelled."),
            UninstallOutcome::Removed(path) => info!("Uninstalled {:?}", path),
        },
        Commands::Status { json } => {
            let report = status::status(system, &layout);
            if *json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
        Commands::Restore => match installer::restore(system, prompter, &layout)? {
            RestoreOutcome::NoBackup => println!("No backups to restore."),
            RestoreOutcome::Cancelled => println!("Restore cancelled."),
            RestoreOutcome::Restored(path) => info!("Restored from {:?}", path),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::prompt::ScriptedPrompter;
    use crate::system::MockSystem;

    const TOOLS: &str = "/profile/LocalLow/VRChat/VRChat/Tools";

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ytdlp-proxy-installer"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn in_tools(name: &str) -> PathBuf {
        Path::new(TOOLS).join(name)
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ytdlp-proxy-installer",
            "install",
            "--target-dir",
            "/tmp/tools",
            "--source-dir",
            "/tmp/dist",
            "-y",
            "-vv",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Commands::Install)));
        assert_eq!(cli.target_dir, Some(PathBuf::from("/tmp/tools")));
        assert_eq!(cli.source_dir, Some(PathBuf::from("/tmp/dist")));
        assert!(cli.yes);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn status_json_flag() {
        let cli = Cli::try_parse_from(["ytdlp-proxy-installer", "status", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Status { json: true })));
        assert!(!cli.yes);
    }

    #[test]
    fn nothing_to_uninstall_exits_zero() {
        let cli = parse(&["uninstall", "--source-dir", "/dist", "--target-dir", TOOLS]);
        let prompter = ScriptedPrompter::answering(&[true]);

        let code = exit_code(run(&cli, &MockSystem::elevated(), &prompter, None));

        assert_eq!(code, 0);
        assert!(prompter.questions().is_empty());
    }

    #[test]
    fn cancelled_uninstall_exits_zero() {
        let cli = parse(&["uninstall", "--source-dir", "/dist", "--target-dir", TOOLS]);
        let system = MockSystem::elevated().with_file(in_tools("yt-dlp.exe"), b"proxy");

        let code = exit_code(run(&cli, &system, &ScriptedPrompter::answering(&[false]), None));

        assert_eq!(code, 0);
        assert!(system.path_exists(&in_tools("yt-dlp.exe")));
    }

    #[test]
    fn unprivileged_commands_exit_one() {
        let system = MockSystem::unprivileged()
            .with_file("/dist/yt-dlp-proxy.exe", b"proxy")
            .with_file(in_tools("yt-dlp.exe"), b"old");

        for command in ["install", "uninstall", "restore"] {
            let cli = parse(&[command, "--source-dir", "/dist", "--target-dir", TOOLS]);
            let code = exit_code(run(&cli, &system, &ScriptedPrompter::answering(&[true]), None));
            assert_eq!(code, 1, "{} must fail without elevation", command);
        }
        assert_eq!(system.read(&in_tools("yt-dlp.exe")).unwrap(), b"old");
    }

    #[test]
    fn install_uses_target_from_environment() {
        let cli = parse(&["install", "--source-dir", "/dist"]);
        let system = MockSystem::elevated().with_file("/dist/yt-dlp-proxy.exe", b"proxy");

        let code = exit_code(run(&cli, &system, &ScriptedPrompter::silent(), Some(OsStr::new("/env/Tools"))));

        assert_eq!(code, 0);
        assert_eq!(system.read(Path::new("/env/Tools/yt-dlp.exe")).unwrap(), b"proxy");
    }

    #[test]
    fn target_flag_overrides_environment() {
        let cli = parse(&["install", "--source-dir", "/dist", "--target-dir", TOOLS]);
        let system = MockSystem::elevated().with_file("/dist/yt-dlp-proxy.exe", b"proxy");

        let code = exit_code(run(&cli, &system, &ScriptedPrompter::silent(), Some(OsStr::new("/env/Tools"))));

        assert_eq!(code, 0);
        assert!(system.path_exists(&in_tools("yt-dlp.exe")));
        assert!(!system.path_exists(Path::new("/env/Tools/yt-dlp.exe")));
    }

    #[test]
    fn empty_environment_is_not_a_parse_error() {
        // The variable is read outside clap, so parsing never sees it.
        let cli = parse(&["status"]);
        assert!(cli.target_dir.is_none());
        assert_eq!(layout::target_override(cli.target_dir.as_deref(), Some(OsStr::new(""))), None);
    }
}
