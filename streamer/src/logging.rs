use clap::ValueEnum;
use tracing_subscriber::{fmt, EnvFilter};

/// Layout of log lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Timestamp, level, span context and fields.
    #[default]
    Full,
    /// Shorter lines with span names folded into the message.
    Compact,
}

/// Initialize logging to stderr, keeping stdout free for `stdio://` clients.
///
/// `RUST_LOG` takes precedence; otherwise `debug` selects the default level.
pub fn init_logging(debug: bool, format: LogFormat) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Full => builder.init(),
        LogFormat::Compact => builder.compact().init(),
    }
}
