//! Process environment shared by the binaries.

use chrono::Local;
use log::LevelFilter;
use std::io::Write;

/// Version of this package, printed by `--version`.
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Default `COLUMNS` so that help text wraps when no terminal is attached.
pub fn set_env_columns() {
    if terminal_size::terminal_size().is_none() && std::env::var_os("COLUMNS").is_none() {
        std::env::set_var("COLUMNS", "80");
    }
}

/// Log to stderr as `2024-01-31T12:00:00 [INFO] - message`.
/// The level defaults to info and can be overridden with `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        log::info!("logging initialized");
        assert!(!get_version().is_empty());
    }
}
