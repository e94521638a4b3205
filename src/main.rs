// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use clap::Parser;

use pose_overlay::cli::args::Cli;
use pose_overlay::cli::live::run_live;
use pose_overlay::cli::logging::set_verbose;
use pose_overlay::error;

fn main() {
    let cli = Cli::parse();
    set_verbose(cli.verbose);

    if let Err(e) = run_live(&cli) {
        error!("{e}");
        process::exit(1);
    }
}
