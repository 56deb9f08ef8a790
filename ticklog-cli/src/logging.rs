use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Logs go to stderr so stdout stays clean for rendered lines and JSON.
/// `RUST_LOG` overrides the default directives.
pub fn init_logging(verbose: bool) -> Result<()> {
    let default = if verbose {
        "ticklog=debug,ticklog_match=debug,ticklog_ingest=debug"
    } else {
        "ticklog=info,ticklog_match=info,ticklog_ingest=warn"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    registry()
        .with(env_filter)
        .with(fmt::layer().with_target(verbose).with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow!("init logging: {e}"))
}
