use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown, or debug
/// output for this workspace with `--verbose`.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .compact();

    let default_directive = if verbose {
        "warn,deck_core=debug,deck_fs=debug,deckmirror=debug"
    } else {
        "warn"
    };
    let filter_layer =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_directive))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_an_error_not_a_panic() {
        let _ = init(false);
        assert!(init(true).is_err());
        tracing::warn!("still logging");
    }
}
