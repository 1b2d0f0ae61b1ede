use anyhow::Result;
use clap::Parser;
use structviz::{cli, commands, logging};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    logging::init_logging(args.verbose);

    let output = commands::run(args.command)?;
    println!("{output}");
    Ok(())
}
