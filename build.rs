//! # Build Script
//!
//! Embeds the Windows Application Manifest (`app.manifest`) into the installer.
//!
//! The manifest keeps `requestedExecutionLevel` at `asInvoker`: the installer checks
//! elevation itself and tells the user to re-run it as Administrator, rather than
//! having Windows raise a UAC prompt before any output is visible.

fn main() {
    println!("cargo:rerun-if-changed=app.manifest");
    // Non-Windows targets report NotWindows here; the binary is fine without a manifest.
    let _ = embed_resource::compile("app.manifest", embed_resource::NONE);
}
