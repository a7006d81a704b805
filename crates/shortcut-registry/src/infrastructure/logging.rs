//! `tracing` subscriber setup.
//!
//! Embedding applications that already install a subscriber can skip this;
//! everything in the crate logs through the `tracing` macros regardless.

use tracing_subscriber::EnvFilter;

use crate::domain::LoggingSection;

/// Installs a formatted `tracing` subscriber as the global default.
///
/// `RUST_LOG` takes precedence when set and valid; otherwise `settings.level`
/// is used, and if that is not a valid filter either, `info`.
///
/// Returns `false` if a global subscriber was already installed (by an
/// earlier call or by the host application), in which case nothing changes.
pub fn init(settings: &LoggingSection) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
