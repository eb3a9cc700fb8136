use std::sync::Once;
use tracing::Level;

static INIT: Once = Once::new();

/// Installs the global fmt subscriber once. Later calls are no-ops, as are
/// calls made after some other subscriber was installed (tests, embedding apps).
pub fn init_logging(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(verbose)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging(false);
        init_logging(true);
        tracing::info!("logging initialized twice without panicking");
    }
}
