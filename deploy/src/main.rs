use anyhow::{anyhow, Result};
use clap::Parser;
use env_logger::Env;
use move_deploy::command_line::CommandLine;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cmd = CommandLine::parse();

    tokio::select! {
        result = cmd.execute() => result,
        _ = tokio::signal::ctrl_c() => {
            log::error!("cancelled by user");
            Err(anyhow!("cancelled by user"))
        }
    }
}
