use clap::Parser;
use lsr_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr unless --log-file was given and the file is usable.
    if cli.log_file {
        if let Err(err) = logging::init_logging_file() {
            eprintln!("lsr: cannot open log file ({:#}); logging to stderr", err);
            logging::init_logging();
        }
    } else {
        logging::init_logging();
    }

    if let Err(err) = cli.run() {
        eprintln!("lsr error: {:#}", err);
        std::process::exit(1);
    }
}
