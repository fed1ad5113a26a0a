//! Logging functions.

use is_terminal::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Control the output generated by the CLI.
#[derive(Debug, Clone, clap::Parser)]
pub struct Output {
    /// Generate verbose output (repeat for more verbosity)
    #[clap(flatten)]
    pub verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::WarnLevel>,
    /// When to display colored output.
    #[clap(long, default_value_t = clap::ColorChoice::Auto, global = true)]
    pub color: clap::ColorChoice,
}

impl Output {
    /// Has the `--verbose` flag been set?
    pub fn is_verbose(&self) -> bool {
        self.verbosity.is_present()
    }

    /// Initialize logging based on the `$RUST_LOG` environment variable and
    /// command-line flags.
    pub fn initialize_logging(&self) {
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_ansi(self.should_emit_colors())
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .compact();

        let filter_layer = EnvFilter::builder()
            .with_default_directive(self.log_level().into())
            .from_env_lossy();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }

    fn log_level(&self) -> LevelFilter {
        match self.verbosity.log_level_filter() {
            clap_verbosity_flag::LevelFilter::Off => LevelFilter::OFF,
            clap_verbosity_flag::LevelFilter::Error => LevelFilter::ERROR,
            clap_verbosity_flag::LevelFilter::Warn => LevelFilter::WARN,
            clap_verbosity_flag::LevelFilter::Info => LevelFilter::INFO,
            clap_verbosity_flag::LevelFilter::Debug => LevelFilter::DEBUG,
            clap_verbosity_flag::LevelFilter::Trace => LevelFilter::TRACE,
        }
    }

    /// Check whether we should emit ANSI escape codes for log formatting.
    ///
    /// The `tracing-subscriber` crate doesn't have native support for
    /// "--color=always|never|auto", so we implement a poor man's version.
    ///
    /// For more, see https://github.com/tokio-rs/tracing/issues/2388
    fn should_emit_colors(&self) -> bool {
        match self.color {
            clap::ColorChoice::Auto => {
                std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
            }
            clap::ColorChoice::Always => true,
            clap::ColorChoice::Never => false,
        }
    }
}
