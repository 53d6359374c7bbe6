use clap::Parser;
use trademap::cli::{Cli, init_logging, run};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    run(cli)
}
