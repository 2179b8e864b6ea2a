use env_logger::{Builder, Env};

/// Install the process logger. `RUST_LOG` wins over `filter`.
///
/// Returns `false` if a logger was already installed.
pub fn init_logging(filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
