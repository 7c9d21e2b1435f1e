use std::path::PathBuf;

/// Database file used when nothing else is configured
pub const DEFAULT_DATABASE: &str = "expenses.db";

/// Runtime settings for the binary.
///
/// The tracker is a single-user local tool: the database sits next to where it
/// is started, and the only other knob is how chatty logging is. `RUST_LOG`
/// still overrides `log_filter`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from(DEFAULT_DATABASE),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Settings for the terminal UI. Log lines would draw over the screen,
    /// so logging is off unless `RUST_LOG` asks for it.
    pub fn for_ui() -> Self {
        Config {
            log_filter: "off".to_string(),
            ..Config::default()
        }
    }
}
