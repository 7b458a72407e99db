// ZSleuth - util/logging.rs
//
// Subscriber setup for the zsleuth binary.
//
// The filter comes from the first of these that is present:
//   1. RUST_LOG, any EnvFilter directive (e.g. "zsleuth::core::discovery=trace")
//   2. --debug on either subcommand
//   3. [logging] level in config.toml, already validated by platform::config
//   4. "info", which prints the scan start line and the summary line
//
// Per-file skips log at trace and excluded directories at debug, so a
// debug run shows pruning without flooding on large plates.
//
// Everything goes to stderr. Stdout carries only the by-subfolder pair
// listing.

use crate::util::constants;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Call once, after the config is loaded.
///
/// A RUST_LOG value that fails to parse is ignored in favour of the
/// flag and config sources.
pub fn init(debug_flag: bool, config_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_directive(debug_flag, config_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .init();

    tracing::debug!(
        app = constants::APP_NAME,
        version = constants::APP_VERSION,
        "Logging initialised"
    );
}

/// Directive used when RUST_LOG does not supply one.
fn fallback_directive(debug_flag: bool, config_level: Option<&str>) -> &str {
    if debug_flag {
        "debug"
    } else {
        config_level.unwrap_or(constants::DEFAULT_LOG_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_beats_config_level() {
        assert_eq!(fallback_directive(true, Some("warn")), "debug");
        assert_eq!(fallback_directive(false, Some("warn")), "warn");
        assert_eq!(fallback_directive(false, None), "info");
    }
}
