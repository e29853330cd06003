//! Application-wide constants
//!
//! File locations, daemon names and config keys live here so the backends
//! and the registry agree on a single source of truth.

/// Per-user and system configuration locations
pub mod paths {
    /// Directory under the user config root that holds this tool's files
    pub const APP_DIR: &str = "opende";

    /// Settings file for the tool itself (JSON)
    pub const SETTINGS_FILENAME: &str = "opende.json";

    /// Compositor config name inside `APP_DIR`
    pub const COMPOSITOR_FILENAME: &str = "picom.conf";

    /// System-provided compositor template
    pub const COMPOSITOR_TEMPLATE: &str = "/usr/local/share/opende/config/picom.conf";

    /// Panel config location relative to the user config root
    pub const PANEL_DIR: &str = "tint2";
    pub const PANEL_FILENAME: &str = "tint2rc";

    /// System-provided panel template
    pub const PANEL_TEMPLATE: &str = "/etc/xdg/tint2/tint2rc";

    /// Xorg snippet managed for input devices (system-wide, needs root)
    pub const INPUT_SNIPPET: &str = "/etc/X11/xorg.conf.d/40-opende-input.conf";

    /// Process table root
    pub const PROC: &str = "/proc";
}

/// External daemons and helper programs
pub mod daemons {
    pub const COMPOSITOR: &str = "picom";
    pub const PANEL: &str = "tint2";

    /// Device property query tool
    pub const XINPUT: &str = "xinput";

    /// Kernel truncates `/proc/<pid>/comm` to this many bytes
    pub const COMM_MAX_LEN: usize = 15;

    /// Default pause between stop and start during reload-by-restart
    pub const RELOAD_SETTLE_MS: u64 = 100;
}

/// Config keys as they appear in each backend's file
pub mod keys {
    pub const SHADOW: &str = "shadow";
    pub const FADING: &str = "fading";
    pub const INACTIVE_OPACITY: &str = "inactive-opacity";

    pub const PANEL_POSITION: &str = "panel_position";
    pub const AUTOHIDE: &str = "autohide";
    pub const PANEL_ITEMS: &str = "panel_items";

    /// `panel_items` letter for the system tray
    pub const SYSTRAY_ITEM: char = 'S';

    pub const NATURAL_SCROLLING: &str = "NaturalScrolling";
    pub const TAPPING: &str = "Tapping";
    pub const ACCEL_PROFILE: &str = "AccelProfile";
    pub const ACCEL_SPEED: &str = "AccelSpeed";
}

/// libinput property names reported by `xinput list-props`
pub mod xinput {
    pub const NATURAL_SCROLLING: &str = "libinput Natural Scrolling Enabled";
    pub const TAPPING: &str = "libinput Tapping Enabled";
    pub const ACCEL_SPEED: &str = "libinput Accel Speed";
    pub const ACCEL_PROFILE: &str = "libinput Accel Profile Enabled";
}

/// Process exit codes of the command surface
pub mod exit {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const PERMISSION: i32 = 3;
}

/// Effects defaults
pub mod effects {
    /// Inactive-window opacity applied by `effects enable transparency`
    pub const TRANSPARENCY_ENABLED_PERCENT: u8 = 90;

    /// Fully opaque, used by `effects disable transparency`
    pub const TRANSPARENCY_DISABLED_PERCENT: u8 = 100;
}
