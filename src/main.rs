use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use isce_prep::cli::{run, CliArgs, PrepConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = PrepConfig::from(CliArgs::parse());
    log::debug!("{:?}", config);
    run(&config)?;
    Ok(())
}
