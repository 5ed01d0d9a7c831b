//! `dsa` binary entry point.

use clap::Parser;

use disk_survey_agent::cli_app::{self, Cli};

fn main() {
    let cli = Cli::parse();
    if let Err(err) = cli_app::run(&cli) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
