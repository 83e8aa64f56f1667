// Linux paths follow the XDG base directory layout.
// Config: ~/.config/raindrop-sync
// Data:   ~/.local/share/raindrop-sync

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "raindrop-sync";

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Uses `$XDG_CONFIG_HOME/raindrop-sync` if set, otherwise `~/.config/raindrop-sync`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
        _ => home_dir().join(".config").join(APP_DIR),
    }
}

/// Uses `$XDG_DATA_HOME/raindrop-sync` if set, otherwise `~/.local/share/raindrop-sync`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
        _ => home_dir().join(".local").join("share").join(APP_DIR),
    }
}
