//! Host side of the Nutmeg runner: option parsing, loading and reporting.

pub mod commands;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "nutmeg", about = "Run a compiled Nutmeg bundle", version)]
pub struct Options {
    /// Bundle file (JSON) produced by the compiler
    pub bundle: Option<PathBuf>,

    /// Arguments passed to the entry point as strings
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,

    /// Binding to run; defaults to the bundle's only command
    #[arg(long, value_name = "NAME")]
    pub entry_point: Option<String>,

    /// Print the values left on the stack when the program halts
    #[arg(short, long)]
    pub print: bool,

    /// Log run boundaries to stderr
    #[arg(short, long)]
    pub debug: bool,

    /// Log every executed node to stderr
    #[arg(short, long)]
    pub trace: bool,

    /// Print the entry point's instruction graph in DOT format instead of running it
    #[arg(long)]
    pub graphviz: bool,

    /// Run every unit test in the bundle
    #[arg(long)]
    pub unittest: bool,

    /// Heading printed before unit-test results
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// List the built-in functions as JSON and exit
    #[arg(long)]
    pub info: bool,
}

/// Carry out `options`. The error is the process exit code; the mishap
/// has already been reported.
pub fn run(options: &Options) -> Result<(), i32> {
    if options.info {
        return commands::info();
    }
    let Some(path) = &options.bundle else {
        commands::mishap("no bundle file given", &[("Hint", "nutmeg --help".into())]);
        return Err(1);
    };
    let (mut engine, bundle) = commands::load(path)?;
    if options.unittest {
        return commands::unittest(&mut engine, &bundle, options.title.as_deref());
    }
    let entry = commands::entry_point(&bundle, options.entry_point.as_deref())?;
    if options.graphviz {
        return commands::graphviz(&engine, &entry);
    }
    commands::start(&mut engine, &entry, &options.args, options.print)
}
