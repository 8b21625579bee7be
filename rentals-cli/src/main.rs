//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use rentals_cli::CliError;

fn main() {
    match rentals_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("rentals: {err}");
            std::process::exit(1);
        }
    }
}
