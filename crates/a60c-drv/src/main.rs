//! The a60c command line interface.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use a60c_drv::{translate, Config};

/// a60c - an ALGOL 60 to C translator.
///
/// Translates programs written in the ALGOL 60 reference language
/// (hardware representation per the IFIP Modified Report) into C
/// source code to be compiled against the accompanying runtime.
#[derive(Parser, Debug)]
#[command(name = "a60c")]
#[command(about = "Algol 60 to C translator", long_about = None)]
struct Cli {
    /// Input Algol 60 source file (default: standard input); note
    /// that the source is scanned twice
    input: Option<PathBuf>,

    /// Run the translator in debug mode (embed the pass-1 token dump
    /// in the output)
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Maximal error allowance, 0 <= N <= 255 (0 continues
    /// translation in any case)
    #[arg(short = 'e', long = "errormax", value_name = "N", default_value_t = 0)]
    errormax: u8,

    /// Desirable output line width, 50 <= N <= 255
    #[arg(
        short = 'l',
        long = "linewidth",
        value_name = "N",
        default_value_t = 72,
        value_parser = clap::value_parser!(u8).range(50..=255)
    )]
    linewidth: u8,

    /// Send output C code to FILE (default: standard output)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Suppress the time stamp in the output C code
    #[arg(short = 't', long = "notimestamp")]
    notimestamp: bool,

    /// Display the translator version and exit
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Suppress all warning messages
    #[arg(short = 'w', long = "nowarn")]
    nowarn: bool,

    /// Verbose progress logging on standard error
    #[arg(long = "verbose")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    if cli.version {
        println!(
            "a60c, an Algol 60 to C translator, version {}",
            env!("CARGO_PKG_VERSION")
        );
        return;
    }
    init_logging(cli.verbose);
    let cfg = Config {
        input: cli.input,
        output: cli.output,
        debug: cli.debug,
        errmax: cli.errormax,
        width: cli.linewidth,
        timestamp: !cli.notimestamp,
        nowarn: cli.nowarn,
    };
    match translate(&cfg) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("a60c: {:#}", e);
            std::process::exit(1);
        }
    }
}
