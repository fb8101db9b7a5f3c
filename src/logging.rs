use std::io;
use tracing_appender::rolling;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONSOLE_FILTER: &str =
    "warn,calendar_config=warn,calendar_feed=warn,calendar_index=warn,calendar_navigation=warn";
const DEFAULT_FILE_FILTER: &str =
    "info,calendar_config=info,calendar_feed=debug,calendar_index=info,calendar_navigation=debug";

/// Install console and daily-rolling file logging.
///
/// Console output goes to stderr so stdout stays free for rendered output.
/// `RUST_LOG` replaces the console filter when set; `verbose` raises the
/// default console level to debug.
pub fn configure_logging(verbose: bool) {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_CONSOLE_FILTER)
        }
    });

    // Console log configuration
    let console_log = fmt::layer()
        .with_writer(io::stderr)
        .with_filter(console_filter);

    // File log configuration
    let file_appender = rolling::daily("logs", "kanpo_calendar.log");
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new(DEFAULT_FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(console_log)
        .with(file_log)
        .init();
}
