use ::log::SetLoggerError;
use env_logger::{Builder, Env};

/// `RUST_LOG` wins over the built-in default.
pub fn init(quiet: bool) -> Result<(), SetLoggerError> {
    let default = if quiet { "warn" } else { "info" };

    Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp(None)
        .format_target(false)
        .try_init()
}
