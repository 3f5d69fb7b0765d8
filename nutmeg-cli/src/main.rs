//! Nutmeg runner: load a bundle and run one of its entry points.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage, bundle or weaving error; failed unit tests
//! - 3: Runtime error

use std::io::IsTerminal;
use std::process;

use clap::Parser;
use nutmeg_cli::Options;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let options = match Options::try_parse() {
        Ok(options) => options,
        Err(err) => {
            let _ = err.print();
            process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    init_logging(&options);

    if let Err(code) = nutmeg_cli::run(&options) {
        process::exit(code);
    }
}

/// `RUST_LOG` wins over the verbosity flags.
fn init_logging(options: &Options) {
    let level = if options.trace {
        "trace"
    } else if options.debug {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false),
        )
        .init();
}
