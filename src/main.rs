// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pafpose::cli::args::{Cli, Commands};
use pafpose::cli::parse::run_parse;
use pafpose::cli::topology::run_topology;

fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Topology(args) => run_topology(args),
        Commands::Parse(args) => run_parse(args),
    }
}
