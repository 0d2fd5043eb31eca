//! Application configuration and constants
//!
//! Central naming and version values. Log banners and the emulator CLI
//! reference these rather than hardcoding strings.

/// The application name
pub const APP_NAME: &str = "Spill Transfer Controller";

/// The application short name (used in compact log lines)
pub const APP_NAME_SHORT: &str = "STC";

/// The board type this firmware runs on
pub const APP_TYPE: &str = "FEB"; // Front-End Board

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Full application title (name + board type)
pub const fn app_title() -> &'static str {
    APP_NAME
}

/// Host emulator banner
pub const fn emulator_banner() -> &'static str {
    "Spill Transfer Controller - Host Emulator"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_matches_manifest() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_banner_names_app() {
        assert!(emulator_banner().starts_with(app_title()));
    }
}
