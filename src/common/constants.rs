//! Application-wide constants
//!
//! This module contains the storage keys, file names and string literals used
//! throughout the application, providing a single source of truth for them.

/// Durable store keys, one per configuration domain
pub mod storage {
    /// General settings (the only domain forwarded to the backend process)
    pub const SETTINGS_KEY: &str = "settings";

    /// Class color overrides
    pub const CLASS_COLORS_KEY: &str = "classColors";

    /// Resolved skill icon references keyed by skill id
    pub const SKILL_ICON_KEY: &str = "skillIcon";

    /// Resolved class icon references keyed by class id
    pub const CLASS_ICON_CACHE_KEY: &str = "classIconCache";

    /// Extension of the per-key document written by the file backend
    pub const FILE_EXTENSION: &str = "json";

    /// Subdirectory of the data dir holding the per-key documents
    pub const SUBDIR: &str = "storage";
}

/// Configuration paths and filenames
pub mod config {
    /// Application directory name under XDG config/data dirs
    pub const APP_DIR: &str = "meter-settings";

    /// Settings file written by the backend process
    pub const FILENAME: &str = "settings.json";
}

/// Names of the process-local signals raised by shortcuts
pub mod signals {
    /// Asks the encounter tracker for a soft reset
    pub const RESET_REQUEST: &str = "reset-request";

    /// Asks the encounter tracker to toggle pause
    pub const PAUSE_REQUEST: &str = "pause-request";

    /// Capacity of the broadcast channel backing the signal bus
    pub const BUS_CAPACITY: usize = 16;
}

/// Navigation targets understood by the backend process
pub mod resources {
    /// Past encounter browser
    pub const LOGS: &str = "logs";
}

/// Shortcut vocabulary offered by the settings screen
pub mod keys {
    /// Modifiers a binding may use
    pub const MODIFIERS: &[&str] = &["Ctrl", "Alt", "Shift"];

    /// Keys a binding may use
    pub const KEYBOARD_KEYS: &[&str] = &[
        "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r",
        "s", "t", "u", "v", "w", "x", "y", "z", "0", "1", "2", "3", "4", "5", "6", "7", "8", "9",
        "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "ArrowUp",
        "ArrowDown", "ArrowLeft", "ArrowRight",
    ];

    /// Separator between modifier and key in a combination string
    pub const SEPARATOR: &str = "+";
}

/// Default configuration values
/// These are used for missing config fields and fresh installs
pub mod defaults {
    /// General options
    pub mod general {
        /// Accent theme applied to the meter
        pub const ACCENT_COLOR: &str = "theme-pink";

        /// Capture port
        pub const PORT: u16 = 6040;
    }

    /// Past encounter browser options
    pub mod logs {
        /// Encounters shorter than this (seconds) are hidden
        pub const MIN_ENCOUNTER_DURATION: u32 = 30;
    }

    /// Default shortcut bindings as (modifier, key)
    pub mod shortcuts {
        pub const HIDE_METER: (&str, &str) = ("Ctrl", "ArrowDown");
        pub const SHOW_LOGS: (&str, &str) = ("Ctrl", "ArrowUp");
        pub const SHOW_LATEST_ENCOUNTER: (&str, &str) = ("Ctrl", "ArrowRight");
        pub const RESET_SESSION: (&str, &str) = ("", "");
        pub const PAUSE_SESSION: (&str, &str) = ("", "");
    }
}
