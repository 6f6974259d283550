use clap::Parser;
use log::info;

mod args;
mod session;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
    info!("args: {:?}", args);

    if let Err(e) = session::run_session(&args) {
        eprintln!("An error occured: {}", e);
        std::process::exit(1);
    }
}
