use clap::Parser;
use color_eyre::Result;
use env_logger::Env;
use log::info;

use fabricgen::cli::Args;
use fabricgen::orchestrator;

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting fabricgen");
    info!("Variable directory: {:?}", args.vars_dir);
    info!("Output directory: {:?}", args.output_dir);

    orchestrator::run(&args)
}
