use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use move_deploy::{
    deploy::TESTNET_FAUCET_URL,
    env_file::EnvMap,
    network::Network,
    switch::{switch_network, NetworkStatus},
};

/// Switch the application env file between testnet and mainnet
#[derive(Debug, Parser)]
#[command(name = "switch-network")]
struct Args {
    /// One of: mainnet, testnet, status
    command: Option<String>,

    #[clap(long, env = "APTOS_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,
}

fn show_status(path: &Path) -> Result<()> {
    let env = EnvMap::load(path)?;
    println!("{}", NetworkStatus::from_env(&env));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let Some(command) = args.command else {
        println!("Network switcher");
        println!("Usage:");
        println!("  switch-network mainnet   # switch to mainnet");
        println!("  switch-network testnet   # switch to testnet");
        println!("  switch-network status    # show the current network");
        println!();
        return show_status(&args.env_file);
    };

    if command.eq_ignore_ascii_case("status") {
        return show_status(&args.env_file);
    }

    match command.parse::<Network>() {
        Ok(network) => {
            switch_network(&args.env_file, network)?;
            println!("Switched to {network}");
            match network {
                Network::Mainnet => println!("Make sure the mainnet wallet holds APT for transactions."),
                Network::Testnet => println!("Testnet APT is available from {TESTNET_FAUCET_URL}"),
            }
        }
        Err(_) => {
            println!("Unknown command: {command}");
            println!("Valid commands: mainnet, testnet, status");
        }
    }
    Ok(())
}
