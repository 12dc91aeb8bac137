//! Logger setup shared by the bridge binaries.

/// Install `env_logger` with an `info` default and millisecond timestamps.
///
/// Does nothing if a logger is already installed.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_twice() {
        init_logger();
        init_logger();
        log::info!("logger initialized");
    }
}
