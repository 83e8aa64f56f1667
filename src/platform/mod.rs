// Per-OS default locations for raindrop-sync configuration and state.
//
// `cfg(target_os)` selects the implementation at compile time. These are only
// defaults; every path can be overridden in the config file.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Directory holding `config.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/raindrop-sync` (or `~/.config/raindrop-sync`)
/// - **macOS**: `~/Library/Application Support/RaindropSync`
/// - **Windows**: `%APPDATA%/RaindropSync`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Directory holding snapshots, the pointer file and logs.
///
/// - **Linux**: `$XDG_DATA_HOME/raindrop-sync` (or `~/.local/share/raindrop-sync`)
/// - **macOS**: `~/Library/Application Support/RaindropSync`
/// - **Windows**: `%APPDATA%/RaindropSync`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
