use env_logger::Env;

/// Installs the global logger. `RUST_LOG` wins over the `info` default.
///
/// Safe to call more than once; later calls are ignored.
pub fn setup_logging() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
