use clap::Parser;
use stratlogic::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
