//! Tracing subscriber setup for library consumers and tests.

use tracing_subscriber::EnvFilter;

/// Install a formatted stderr subscriber.
///
/// `RUST_LOG` takes precedence; `level` is the fallback directive. Returns
/// `false` when a global subscriber is already installed, so repeated calls
/// from tests are harmless.
pub fn try_init(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        try_init("debug");
        assert!(!try_init("debug"));
    }
}
