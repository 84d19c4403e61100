//! Tracing setup for tests.

use std::sync::Once;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

static INIT: Once = Once::new();

/// Install a global subscriber writing through the test harness, once per
/// process. `RUST_LOG` overrides the default `warn` level.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = init_subscriber("warn");
    });
}

fn init_subscriber(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let fmt_layer = fmt::layer().with_target(true).with_test_writer();
    tracing::subscriber::set_global_default(Registry::default().with(env_filter).with(fmt_layer))?;
    Ok(())
}
