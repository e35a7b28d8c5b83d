// 📡 Logging - tracing setup shared by the binaries

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Priority: RUST_LOG env var > verbose flag > configured level
pub fn filter_for(default_level: &str, verbose: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    match verbose {
        0 => EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

pub fn init_tracing(default_level: &str, verbose: u8) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter_for(default_level, verbose))
        .init();
}
