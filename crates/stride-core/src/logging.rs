//! `tracing` subscriber setup.
//!
//! The library itself only emits events; installing a subscriber is left to
//! the embedding application, which can call [`init`] for a sensible
//! console default.

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::error::StrideError;
use crate::Result;

/// Environment variable that overrides [`LogConfig::level`].
pub const LOG_ENV: &str = "STRIDE_LOG";

/// Build the event filter: `STRIDE_LOG` if set and valid, else `config.level`.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| StrideError::InvalidArgument {
        arg: "level",
        reason: e.to_string(),
    })
}

/// Install a global `fmt` subscriber.
///
/// Fails with `InvalidArgument` if the level directive does not parse or a
/// global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = env_filter(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| StrideError::InvalidArgument {
            arg: "subscriber",
            reason: e.to_string(),
        })?;
    tracing::debug!(level = %config.level, "logging initialised");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_rejected() {
        std::env::remove_var(LOG_ENV);
        let cfg = LogConfig::default().with_level("stride_core=notalevel");
        assert!(matches!(
            env_filter(&cfg),
            Err(StrideError::InvalidArgument { arg: "level", .. })
        ));
    }

    #[test]
    fn test_second_init_fails() {
        let cfg = LogConfig::default().with_level("warn");
        let _ = init(&cfg);
        assert!(matches!(
            init(&cfg),
            Err(StrideError::InvalidArgument { arg: "subscriber", .. })
        ));
    }
}
