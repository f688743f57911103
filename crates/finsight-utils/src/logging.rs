//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter used by the binary when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,finsight=info";

/// Initialize tracing with a fallback filter
///
/// `RUST_LOG` always wins; `default_filter` is used only when it is unset or
/// unparsable. Logs go to stderr so that report text on stdout stays clean.
/// Calling this twice is harmless: the second registration is ignored.
pub fn init_tracing_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Filter for a given verbosity flag
pub fn filter_for_verbosity(verbose: bool) -> &'static str {
    if verbose {
        "info,finsight=debug"
    } else {
        DEFAULT_FILTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_verbosity() {
        assert_eq!(filter_for_verbosity(false), DEFAULT_FILTER);
        assert!(filter_for_verbosity(true).contains("debug"));
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_tracing_with_default("off");
        init_tracing_with_default("off");
    }
}
