//! Qrypt - inspection tool for share links.
//!
//! # Usage
//!
//! ```text
//! qrypt [FRAGMENT | LINK]
//! ```
//!
//! Decodes a share fragment (`#c=ff0000&d=dots`) or a full share link, prints
//! the resolved style as YAML and then its canonical fragment. Without an
//! argument the default style is printed.
//!
//! # Execution Flow
//!
//! 1. Load settings from `Qrypt Data/qrypt.yaml` (plus `QRYPT__*` overrides)
//! 2. Initialize logging → logs/qrypt.<date>
//! 3. Decode the argument and print the result to stdout
//!
//! Log output goes to stderr and the log file, so stdout can be piped.

use anyhow::{Context, Result};
use camino::Utf8Path;
use qrypt::{APP_NAME, ConfigManager, VERSION, codec};

fn main() -> Result<()> {
    let config_manager = ConfigManager::new("Qrypt Data")?;
    let settings = config_manager.load_settings()?;

    let _guard = qrypt::logging::setup_logging(
        Utf8Path::new("logs"),
        "qrypt",
        settings.logging.debug,
        settings.logging.console,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let input = std::env::args().nth(1).unwrap_or_default();
    // Accept a full link as well as a bare fragment
    let fragment = input.split_once('#').map_or(input.as_str(), |(_, tail)| tail);

    let partial = codec::decode(fragment);
    if partial.is_empty() && !fragment.is_empty() {
        tracing::warn!("No recognized style keys in input, showing defaults");
    }
    let style = partial.resolve();

    let yaml = serde_yaml_ng::to_string(&style).context("Failed to serialize style to YAML")?;
    print!("{}", yaml);
    println!("{}", codec::share_fragment(&style));

    Ok(())
}
