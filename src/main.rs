use clap::Parser;
use simfolio::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
