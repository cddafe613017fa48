//! Log output for smoke runs.
//!
//! Check results go to stdout as a summary; everything logged through
//! `tracing` (per-check spans, poll attempts, tool invocations) goes here.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the subscriber used by `websmoke`.
///
/// `RUST_LOG` overrides `level`. Human-readable lines go to stderr so they
/// do not interleave with the stdout summary; `json` switches to one JSON
/// object per event. Only the first call has an effect.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
