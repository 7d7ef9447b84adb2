//! Command-line options for running a graph through the dagrunner-exec dispatcher.

use crate::logging::LoggingArgs;
use std::time::Duration;

/// Arguments controlling how a graph is scheduled and executed.
#[derive(Debug, clap::Parser)]
#[clap(name = "dagrunner")]
#[clap(version, author)]
pub struct ExecuteArgs {
    #[clap(flatten)]
    logging: LoggingArgs,

    /// The number of workers to run across.
    ///
    /// Defaults to the number of cpus on the host.
    #[clap(long, short = 'J')]
    #[clap(value_parser = clap::value_parser!(u32).range(1..))]
    workers: Option<u32>,

    /// Don't run with parallel workers.
    #[clap(long)]
    #[clap(conflicts_with = "workers")]
    no_parallel: bool,

    /// Milliseconds to wait for a single cross-worker dependency read before reporting a timeout.
    #[clap(long, default_value_t = 30_000)]
    read_timeout_ms: u64,

    /// Milliseconds to wait for the whole run to finish before cancelling outstanding work and
    /// failing the call. Pass 0 to wait indefinitely.
    #[clap(long, default_value_t = 60_000)]
    collection_timeout_ms: u64,

    /// Include each reported task's measured compute time and comm latencies alongside its value.
    #[clap(long)]
    costs: bool,

    /// Nest structured (tuple) ids into a single JSON value instead of a flat map.
    #[clap(long)]
    inflate: bool,
}

impl ExecuteArgs {
    pub fn logging(&self) -> &LoggingArgs {
        &self.logging
    }

    pub fn workers(&self) -> usize {
        if self.no_parallel {
            1
        } else {
            self.workers.map(|w| w as usize).unwrap_or_else(num_cpus::get)
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn collection_timeout(&self) -> Option<Duration> {
        if self.collection_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.collection_timeout_ms))
        }
    }

    pub fn report_costs(&self) -> bool {
        self.costs
    }

    pub fn inflate(&self) -> bool {
        self.inflate
    }
}
