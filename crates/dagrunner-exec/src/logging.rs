//! Leveled, colorized logging setup, in the style the rest of this corpus uses `fern` for.

use fern::{Dispatch, FormatCallback};
use log::{Level, LevelFilter, Record};
use std::fmt;
use std::io::stdout;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// Logging verbosity flags for a CLI built on top of `dagrunner-exec`.
#[derive(Debug, clap::Args)]
#[clap(next_help_heading = "LOGGING")]
pub struct LoggingArgs {
    #[clap(short, long)]
    #[clap(conflicts_with_all(&["warn", "info", "debug", "trace"]))]
    error: bool,

    #[clap(short, long)]
    #[clap(conflicts_with_all(&["error", "info", "debug", "trace"]))]
    warn: bool,

    #[clap(short, long)]
    #[clap(conflicts_with_all(&["error", "warn", "debug", "trace"]))]
    info: bool,

    #[clap(long)]
    #[clap(conflicts_with_all(&["error", "warn", "info", "trace"]))]
    debug: bool,

    #[clap(long)]
    #[clap(conflicts_with_all(&["error", "warn", "info", "debug"]))]
    trace: bool,
}

impl LoggingArgs {
    pub fn log_level_filter(&self) -> LevelFilter {
        if self.error {
            LevelFilter::Error
        } else if self.warn {
            LevelFilter::Warn
        } else if self.debug {
            LevelFilter::Debug
        } else if self.trace {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        }
    }

    /// Installs this process's global logger. Idempotent in the sense that a second call is a
    /// harmless no-op (returns `false` instead of panicking).
    pub fn init_root_logger(&self) -> bool {
        Self::dispatch(self.log_level_filter()).apply().is_ok()
    }

    fn dispatch(filter: LevelFilter) -> Dispatch {
        Dispatch::new()
            .format(Self::message_format())
            .level(filter)
            .chain(stdout())
    }

    fn message_format() -> impl Fn(FormatCallback, &fmt::Arguments, &Record) + Sync + Send + 'static {
        move |out, message, record| {
            out.finish(format_args!("{} {}", Self::format_prefix(record), message))
        }
    }

    fn format_prefix(record: &Record) -> String {
        use colored::Colorize;

        static TIME_FORMAT: &[FormatItem] =
            format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
        let time = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());

        let level = record.level().to_string().to_lowercase();
        let level = match record.level() {
            Level::Error => level.red(),
            Level::Warn => level.yellow(),
            Level::Info => level.green(),
            Level::Debug => level.blue(),
            Level::Trace => level.bright_black(),
        };

        format!(
            "[{}] {:>5}:",
            time.format(TIME_FORMAT).unwrap_or_default(),
            level
        )
    }
}
